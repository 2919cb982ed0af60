use log::debug;

use planar::{axial_bearing, axial_difference, polyline_distance, polyline_nearest};

use crate::config::FrontageConfig;
use crate::geom::SpatialIndex;
use crate::types::{BoundarySegment, Frontage, Parcel, Street};

/// Street centerlines with an envelope index.
#[derive(Debug, Clone)]
pub struct StreetLayer {
    streets: Vec<Street>,
    index: SpatialIndex,
}

impl StreetLayer {
    pub fn new(streets: Vec<Street>) -> Self {
        let index = SpatialIndex::new(streets.iter().map(|s| s.bounds()));
        Self { streets, index }
    }

    /// Streets within `buffer` of the parcel boundary, in layer order.
    pub fn near_parcel(&self, parcel: &Parcel, buffer: f64) -> Vec<&Street> {
        let Some(bounds) = parcel.bounds() else { return Vec::new() };
        self.index.within(bounds, buffer).into_iter()
            .map(|i| &self.streets[i])
            .filter(|street| polyline_distance(parcel.ring(), street.coords()) <= buffer)
            .collect()
    }
}

/// Best parallel street for one segment, if any street qualifies.
///
/// For each candidate street within `buffer` of the segment, the segment's
/// chord direction is compared with the street piece nearest to it. The
/// street with the smallest angle wins, then the closest, then the lowest id;
/// it is a frontage only when that angle is below the parallel tolerance.
pub fn classify_segment(segment: &BoundarySegment, candidates: &[&Street], config: &FrontageConfig) -> Option<Frontage> {
    let direction = segment.axial_bearing();

    let best = candidates.iter()
        .filter_map(|street| {
            let coords = street.coords();
            let nearest = polyline_nearest(&segment.vertices, coords)?;
            if nearest.distance > config.buffer { return None }
            let tangent = axial_bearing(coords[nearest.b_piece], coords[(nearest.b_piece + 1).min(coords.len() - 1)]);
            Some((axial_difference(direction, tangent), nearest.distance, *street))
        })
        .min_by(|x, y| {
            x.0.total_cmp(&y.0)
                .then(x.1.total_cmp(&y.1))
                .then(x.2.id.cmp(&y.2.id))
        })?;

    let (angle_deg, distance, street) = best;
    (angle_deg < config.parallel_tolerance_deg).then(|| Frontage {
        street: street.id,
        name: street.name.clone(),
        angle_deg,
        distance,
    })
}

/// Frontage for every segment of one parcel, aligned with `segments`.
/// Shared segments are never evaluated.
pub fn classify_parcel(
    parcel: &Parcel,
    segments: &[BoundarySegment],
    streets: &StreetLayer,
    config: &FrontageConfig,
) -> Vec<Option<Frontage>> {
    let candidates = streets.near_parcel(parcel, config.buffer);
    debug!("[frontage] parcel {}: {} candidate streets", parcel.id, candidates.len());

    segments.iter()
        .map(|segment| {
            if segment.shared || candidates.is_empty() { return None }
            classify_segment(segment, &candidates, config)
        })
        .collect()
}
