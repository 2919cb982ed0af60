use geo::Rect;

use crate::geom::SpatialIndex;
use crate::types::{BoundarySegment, ParcelId, SegmentKey};

/// Every boundary segment of a run, ordered by composite key, with an
/// envelope index for neighbourhood queries.
///
/// Geometry is fixed at construction; only classification flags change
/// afterwards, so the index stays valid.
#[derive(Debug, Clone)]
pub struct SegmentSet {
    segments: Vec<BoundarySegment>,
    index: SpatialIndex,
}

impl SegmentSet {
    /// Build a set from segments in any order. Keys must be unique.
    pub fn new(mut segments: Vec<BoundarySegment>) -> Self {
        segments.sort_by_key(|s| s.key);
        debug_assert!(segments.windows(2).all(|w| w[0].key < w[1].key), "duplicate segment key");
        let index = SpatialIndex::new(segments.iter().map(|s| Some(s.bounds())));
        Self { segments, index }
    }

    #[inline] pub fn len(&self) -> usize { self.segments.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.segments.is_empty() }

    #[inline] pub fn iter(&self) -> impl Iterator<Item = &BoundarySegment> { self.segments.iter() }

    #[inline] pub fn as_slice(&self) -> &[BoundarySegment] { &self.segments }

    fn position(&self, key: SegmentKey) -> Option<usize> {
        self.segments.binary_search_by_key(&key, |s| s.key).ok()
    }

    pub fn get(&self, key: SegmentKey) -> Option<&BoundarySegment> {
        self.position(key).map(|i| &self.segments[i])
    }

    pub fn get_mut(&mut self, key: SegmentKey) -> Option<&mut BoundarySegment> {
        self.position(key).map(|i| &mut self.segments[i])
    }

    /// All segments of one parcel, in sequence order.
    pub fn of_parcel(&self, parcel: ParcelId) -> &[BoundarySegment] {
        let lo = self.segments.partition_point(|s| s.key.parcel < parcel);
        let hi = self.segments.partition_point(|s| s.key.parcel <= parcel);
        &self.segments[lo..hi]
    }

    /// Segments whose envelopes come within `distance` of `rect`, in key order.
    pub fn within(&self, rect: Rect<f64>, distance: f64) -> impl Iterator<Item = &BoundarySegment> {
        self.index.within(rect, distance).into_iter().map(move |i| &self.segments[i])
    }
}
