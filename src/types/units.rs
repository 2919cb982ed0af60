use std::fmt;

use serde::{Deserialize, Serialize};

/// Linear unit of a projected coordinate system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinearUnit {
    Meter,
    Foot,
    UsSurveyFoot,
}

impl LinearUnit {
    /// Length of one unit in meters.
    pub fn meters(self) -> f64 {
        match self {
            Self::Meter => 1.0,
            Self::Foot => 0.3048,
            Self::UsSurveyFoot => 1200.0 / 3937.0,
        }
    }

    /// Identify a unit from its meters-per-unit conversion factor.
    pub fn from_factor(factor: f64) -> Option<Self> {
        [Self::Meter, Self::Foot, Self::UsSurveyFoot]
            .into_iter()
            .find(|unit| (unit.meters() - factor).abs() <= 1e-9)
    }

    /// Identify a unit from a free-form name (`"US survey foot"`, `"Foot_US"`, `"metre"`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        let n = name.to_ascii_lowercase().replace([' ', '-'], "_");
        match n.as_str() {
            "meter" | "metre" | "m" | "meters" | "metres" => Some(Self::Meter),
            "foot" | "feet" | "ft" | "international_foot" | "foot_international" => Some(Self::Foot),
            "us_survey_foot" | "foot_us" | "us_foot" | "ftus" | "us_ft" => Some(Self::UsSurveyFoot),
            _ => None,
        }
    }
}

impl fmt::Display for LinearUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Meter => "meters",
            Self::Foot => "feet",
            Self::UsSurveyFoot => "US survey feet",
        })
    }
}
