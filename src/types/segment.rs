use geo::{Coord, Rect};
use smallvec::SmallVec;

use super::{SegmentKey, StreetId};

/// Relation of a classified segment to the street network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentClass {
    /// Runs roughly parallel to a nearby street and is not shared.
    FacingStreet,
    /// Coincides with a neighbouring parcel's boundary.
    OtherSide,
    /// Neither shared nor facing a street.
    Unclassified,
}

impl SegmentClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FacingStreet => "facing_street",
            Self::OtherSide => "other_side",
            Self::Unclassified => "unclassified",
        }
    }
}

/// The street a facing segment fronts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Frontage {
    pub street: StreetId,
    pub name: Option<String>,
    /// Axial angle between segment and street, in degrees.
    pub angle_deg: f64,
    pub distance: f64,
}

/// A run of a parcel's boundary that behaves as one straight side.
///
/// `vertices` is either the two-point chord or the source polyline when the
/// run is made of near-collinear jitter worth keeping. Segments of one parcel
/// tile its boundary in traversal order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundarySegment {
    pub key: SegmentKey,
    pub vertices: SmallVec<[Coord<f64>; 4]>,
    pub curved: bool,
    pub shared: bool,
    pub counterpart: Option<SegmentKey>,
    pub frontage: Option<Frontage>,
}

impl BoundarySegment {
    pub fn new(key: SegmentKey, vertices: SmallVec<[Coord<f64>; 4]>, curved: bool) -> Self {
        Self { key, vertices, curved, shared: false, counterpart: None, frontage: None }
    }

    #[inline] pub fn start(&self) -> Coord<f64> { self.vertices[0] }

    #[inline] pub fn end(&self) -> Coord<f64> { self.vertices[self.vertices.len() - 1] }

    #[inline] pub fn length(&self) -> f64 { planar::polyline_length(&self.vertices) }

    /// Undirected orientation of the start-to-end chord, in [0, 180).
    #[inline] pub fn axial_bearing(&self) -> f64 { planar::axial_bearing(self.start(), self.end()) }

    #[inline] pub fn facing_street(&self) -> bool { !self.shared && self.frontage.is_some() }

    /// Classification used by the wide transform. Shared wins over facing.
    pub fn class(&self) -> SegmentClass {
        if self.shared {
            SegmentClass::OtherSide
        } else if self.frontage.is_some() {
            SegmentClass::FacingStreet
        } else {
            SegmentClass::Unclassified
        }
    }

    pub fn bounds(&self) -> Rect<f64> {
        let (mut lo, mut hi) = (self.start(), self.start());
        for c in &self.vertices[1..] {
            lo = Coord { x: lo.x.min(c.x), y: lo.y.min(c.y) };
            hi = Coord { x: hi.x.max(c.x), y: hi.y.max(c.y) };
        }
        Rect::new(lo, hi)
    }
}
