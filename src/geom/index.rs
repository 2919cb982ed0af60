use geo::{Coord, Rect};
use rstar::{RTree, AABB};

use super::BoundingBox;

/// Grow a rectangle by `distance` on every side.
#[inline]
pub fn pad(rect: Rect<f64>, distance: f64) -> Rect<f64> {
    let d = Coord { x: distance, y: distance };
    Rect::new(rect.min() - d, rect.max() + d)
}

/// Envelope index over a collection of features addressed by position.
///
/// Features without an envelope (empty geometry) are simply never returned.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    rtree: RTree<BoundingBox>,
}

impl SpatialIndex {
    pub fn new(envelopes: impl IntoIterator<Item = Option<Rect<f64>>>) -> Self {
        Self {
            rtree: RTree::bulk_load(
                envelopes.into_iter().enumerate()
                    .filter_map(|(i, rect)| rect.map(|rect| BoundingBox::new(i, rect)))
                    .collect()
            ),
        }
    }

    #[inline] pub fn len(&self) -> usize { self.rtree.size() }

    #[inline] pub fn is_empty(&self) -> bool { self.rtree.size() == 0 }

    /// Positions of features whose envelopes intersect `rect` grown by `distance`,
    /// in ascending order.
    pub fn within(&self, rect: Rect<f64>, distance: f64) -> Vec<usize> {
        let query = pad(rect, distance);
        let envelope = AABB::from_corners(query.min().into(), query.max().into());
        let mut hits: Vec<usize> = self.rtree
            .locate_in_envelope_intersecting(&envelope)
            .map(|bbox| bbox.idx())
            .collect();
        hits.sort_unstable();
        hits
    }
}
