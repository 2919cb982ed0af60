use geo::Rect;
use rstar::{RTreeObject, AABB};

/// An R-tree entry: the envelope of one feature, keyed by its position in the owning collection.
#[derive(Debug, Clone)]
pub(super) struct BoundingBox {
    idx: usize,
    bbox: Rect<f64>,
}

impl BoundingBox {
    pub(super) fn new(idx: usize, bbox: Rect<f64>) -> Self {
        Self { idx, bbox }
    }

    #[inline] pub(super) fn idx(&self) -> usize { self.idx }
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}
