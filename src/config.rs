use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::LinearUnit;

/// Thresholds for splitting a parcel ring into sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SegmentConfig {
    /// Turns at or below this many degrees are treated as straight.
    pub theta_low_deg: f64,
    /// Turns above this many degrees are corners.
    pub theta_high_deg: f64,
    /// Vertex spacing below which a run of points reads as a digitised curve.
    pub curve_spacing: f64,
    /// Consecutive short spacings needed to flag a segment as curved.
    pub curve_min_points: usize,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self { theta_low_deg: 5.0, theta_high_deg: 15.0, curve_spacing: 5.0, curve_min_points: 5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SharedConfig {
    /// Coincidence tolerance in input units.
    pub epsilon: f64,
    /// Share of the shorter segment that must be coincident.
    pub min_overlap_fraction: f64,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self { epsilon: 0.5, min_overlap_fraction: 0.8 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrontageConfig {
    /// Streets farther than this from the parcel are ignored.
    pub buffer: f64,
    /// Segments within this many degrees of a street's direction face it.
    pub parallel_tolerance_deg: f64,
}

impl Default for FrontageConfig {
    fn default() -> Self {
        Self { buffer: 35.0, parallel_tolerance_deg: 12.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RankerConfig {
    pub radius: f64,
    pub max_candidates: usize,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self { radius: 100.0, max_candidates: 30 }
    }
}

/// Settings for a measurement run. Every stage receives the section it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub segment: SegmentConfig,
    pub shared: SharedConfig,
    pub frontage: FrontageConfig,
    pub ranker: RankerConfig,
    /// Width of each track in the wide table.
    pub max_side_fields: usize,
    /// Linear unit every input layer must declare, when known.
    pub units: Option<LinearUnit>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            segment: SegmentConfig::default(),
            shared: SharedConfig::default(),
            frontage: FrontageConfig::default(),
            ranker: RankerConfig::default(),
            max_side_fields: 4,
            units: None,
        }
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 { Ok(()) } else { Err(ConfigError::NotPositive { name, value }) }
}

fn at_least(name: &'static str, min: usize, value: usize) -> Result<(), ConfigError> {
    if value >= min { Ok(()) } else { Err(ConfigError::TooSmall { name, min, value }) }
}

impl Config {
    /// Read a JSON configuration file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("[config] Failed to read {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("[config] Failed to parse {}", path.display()))
    }

    /// Check that every threshold is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.segment;
        if !(s.theta_low_deg >= 0.0 && s.theta_low_deg < s.theta_high_deg && s.theta_high_deg < 180.0) {
            return Err(ConfigError::AngleOrder { low: s.theta_low_deg, high: s.theta_high_deg });
        }
        positive("segment.curve_spacing", s.curve_spacing)?;
        at_least("segment.curve_min_points", 1, s.curve_min_points)?;

        positive("shared.epsilon", self.shared.epsilon)?;
        let f = self.shared.min_overlap_fraction;
        if !(f > 0.0 && f <= 1.0) {
            return Err(ConfigError::OutOfRange { name: "shared.min_overlap_fraction", min: 0.0, max: 1.0, value: f });
        }

        positive("frontage.buffer", self.frontage.buffer)?;
        let t = self.frontage.parallel_tolerance_deg;
        if !(t > 0.0 && t <= 90.0) {
            return Err(ConfigError::OutOfRange { name: "frontage.parallel_tolerance_deg", min: 0.0, max: 90.0, value: t });
        }

        positive("ranker.radius", self.ranker.radius)?;
        at_least("ranker.max_candidates", 1, self.ranker.max_candidates)?;
        at_least("max_side_fields", 1, self.max_side_fields)?;
        Ok(())
    }
}
