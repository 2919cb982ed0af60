use geo::{Contains, Point};

use planar::polyline_distance;

use crate::config::RankerConfig;
use crate::segment::SegmentSet;
use crate::types::{BoundarySegment, Building, BuildingId, ParcelId, SegmentKey};

/// One row of the long-form near table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborRecord {
    pub building: BuildingId,
    pub segment: SegmentKey,
    pub distance: f64,
    /// 1-based, ascending by distance then segment key.
    pub rank: u32,
}

/// Distance from a footprint's outline to a segment; zero when they touch,
/// cross, or the segment lies inside the footprint.
pub fn footprint_distance(building: &Building, segment: &BoundarySegment) -> f64 {
    if building.footprint.contains(&Point::from(segment.start())) { return 0.0 }
    polyline_distance(building.outline(), &segment.vertices)
}

/// Rank candidate segments for one building.
///
/// Keeps the `max_candidates` segments closest to the footprint within
/// `radius`, then drops those belonging to parcels other than the owner and
/// renumbers the survivors from 1. A building without an owner is ranked
/// against every parcel it straddles; one touching no parcel gets nothing.
/// The result depends only on the candidate set, not its order.
pub fn rank_candidates<'s>(
    building: &Building,
    candidates: impl IntoIterator<Item = &'s BoundarySegment>,
    config: &RankerConfig,
) -> Vec<NeighborRecord> {
    let parcels: &[ParcelId] = match &building.parcel {
        Some(owner) => std::slice::from_ref(owner),
        None => building.straddles.as_slice(),
    };
    if parcels.is_empty() { return Vec::new() }

    let mut near: Vec<(f64, SegmentKey)> = candidates.into_iter()
        .map(|segment| (footprint_distance(building, segment), segment.key))
        .filter(|(d, _)| *d <= config.radius)
        .collect();
    near.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)));
    near.dedup_by_key(|(_, key)| *key);
    near.truncate(config.max_candidates);

    near.into_iter()
        .filter(|(_, key)| parcels.contains(&key.parcel))
        .enumerate()
        .map(|(i, (distance, segment))| NeighborRecord {
            building: building.id,
            segment,
            distance,
            rank: i as u32 + 1,
        })
        .collect()
}

/// Rank every segment in `segments` near one building.
pub fn rank_building(building: &Building, segments: &SegmentSet, config: &RankerConfig) -> Vec<NeighborRecord> {
    let Some(bounds) = building.bounds() else { return Vec::new() };
    rank_candidates(building, segments.within(bounds, config.radius), config)
}
