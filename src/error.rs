use thiserror::Error;

use crate::types::{LinearUnit, ParcelId};

/// Problems with input geometry that the measurement stages can detect.
///
/// Per-parcel variants are recorded and the parcel is skipped; dataset-level
/// variants abort the run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("parcel {parcel}: boundary has {vertices} distinct vertices, need at least 2")]
    DegenerateRing { parcel: ParcelId, vertices: usize },

    #[error("parcel {parcel}: boundary contains a non-finite coordinate")]
    NonFinite { parcel: ParcelId },

    #[error("layer '{layer}' uses a geographic coordinate system; planar units are required")]
    NonPlanar { layer: String },

    #[error("layer '{layer}' declares unsupported linear unit '{unit}'")]
    UnsupportedUnit { layer: String, unit: String },

    #[error("layer '{layer}' is in {found} but other layers are in {expected}")]
    UnitMismatch { layer: String, expected: LinearUnit, found: LinearUnit },
}

impl GeometryError {
    /// True for errors that only invalidate a single parcel.
    pub fn is_per_parcel(&self) -> bool {
        matches!(self, Self::DegenerateRing { .. } | Self::NonFinite { .. })
    }
}

/// Configuration values outside their allowed ranges.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a positive finite number, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("{name} must be at least {min}, got {value}")]
    TooSmall { name: &'static str, min: usize, value: usize },

    #[error("theta_low_deg ({low}) must be below theta_high_deg ({high}) and theta_high_deg below 180")]
    AngleOrder { low: f64, high: f64 },

    #[error("{name} must be in ({min}, {max}], got {value}")]
    OutOfRange { name: &'static str, min: f64, max: f64, value: f64 },
}

/// Run-level conditions that abort before any processing.
#[derive(Error, Debug)]
pub enum SetbackError {
    #[error("required layer '{0}' not found")]
    MissingLayer(String),

    #[error("layer '{0}' contains no features")]
    EmptyLayer(String),

    #[error("layer '{layer}' has more than one feature with id {id}")]
    DuplicateId { layer: String, id: u64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

pub type Result<T, E = GeometryError> = std::result::Result<T, E>;
