use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! feature_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

feature_id! {
    /// Identifier of a parcel, unique within the parcel layer.
    ParcelId
}

feature_id! {
    /// Identifier of a building footprint.
    BuildingId
}

feature_id! {
    /// Identifier of a street centerline.
    StreetId
}

/// Composite key of a boundary segment: owning parcel plus the 1-based
/// position of the segment in that parcel's boundary traversal.
///
/// Ordering is by parcel, then sequence; this is the tie-break order used
/// throughout ranking and matching. Displays as `"<parcel>-<seq>"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentKey {
    pub parcel: ParcelId,
    pub seq: u32,
}

impl SegmentKey {
    #[inline] pub fn new(parcel: ParcelId, seq: u32) -> Self { Self { parcel, seq } }
}

impl fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.parcel, self.seq)
    }
}

impl FromStr for SegmentKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (parcel, seq) = s.split_once('-')
            .ok_or_else(|| format!("segment key '{s}' is not of the form <parcel>-<seq>"))?;
        let parcel = parcel.parse::<u64>().map_err(|e| format!("segment key '{s}': {e}"))?;
        let seq = seq.parse::<u32>().map_err(|e| format!("segment key '{s}': {e}"))?;
        Ok(Self::new(ParcelId(parcel), seq))
    }
}

impl Serialize for SegmentKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SegmentKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
