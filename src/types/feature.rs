use geo::{BoundingRect, Coord, LineString, Polygon, Rect};

use super::{BuildingId, ParcelId, StreetId};

/// A land parcel. Only the exterior ring takes part in segmentation.
#[derive(Debug, Clone, PartialEq)]
pub struct Parcel {
    pub id: ParcelId,
    pub polygon: Polygon<f64>,
}

impl Parcel {
    pub fn new(id: ParcelId, polygon: Polygon<f64>) -> Self {
        Self { id, polygon }
    }

    /// Vertices of the exterior ring, possibly repeating the first at the end.
    #[inline] pub fn ring(&self) -> &[Coord<f64>] { &self.polygon.exterior().0 }

    #[inline] pub fn bounds(&self) -> Option<Rect<f64>> { self.polygon.bounding_rect() }
}

/// A building footprint and the parcel that owns it, once resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    pub id: BuildingId,
    pub footprint: Polygon<f64>,
    /// Owning parcel; `None` when no single parcel could be determined.
    pub parcel: Option<ParcelId>,
    /// Set when the footprint is not fully inside its owner, or has no owner.
    pub partial_or_unowned: bool,
    /// Parcels an unowned footprint intersects, ascending. Empty once owned.
    pub straddles: Vec<ParcelId>,
}

impl Building {
    /// A footprint whose ownership has not been resolved yet.
    pub fn new(id: BuildingId, footprint: Polygon<f64>) -> Self {
        Self { id, footprint, parcel: None, partial_or_unowned: true, straddles: Vec::new() }
    }

    /// A footprint fully contained by `parcel`.
    pub fn owned_by(mut self, parcel: ParcelId) -> Self {
        self.parcel = Some(parcel);
        self.partial_or_unowned = false;
        self.straddles.clear();
        self
    }

    #[inline] pub fn outline(&self) -> &[Coord<f64>] { &self.footprint.exterior().0 }

    #[inline] pub fn bounds(&self) -> Option<Rect<f64>> { self.footprint.bounding_rect() }
}

/// A street centerline. Streets are reference geometry and never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct Street {
    pub id: StreetId,
    pub name: Option<String>,
    pub line: LineString<f64>,
}

impl Street {
    pub fn new(id: StreetId, name: Option<String>, line: LineString<f64>) -> Self {
        Self { id, name, line }
    }

    #[inline] pub fn coords(&self) -> &[Coord<f64>] { &self.line.0 }

    #[inline] pub fn bounds(&self) -> Option<Rect<f64>> { self.line.bounding_rect() }
}
