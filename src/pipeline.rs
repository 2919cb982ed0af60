//! Stage orchestration for a measurement run.
//!
//! Parcels are segmented independently, shared boundaries are resolved across
//! the whole set, and then each parcel is measured on its own: its segments
//! are classified against nearby streets and its buildings are ranked and
//! reshaped. Buildings crossing a lot line are measured last, against every
//! parcel they intersect. Every parallel stage collects in input order, so
//! results do not depend on thread scheduling.

use ahash::{AHashMap, AHashSet};
use anyhow::Result;
use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::aggregate::{aggregate, AggregateResult};
use crate::config::Config;
use crate::error::{GeometryError, SetbackError};
use crate::frontage::{classify_parcel, StreetLayer};
use crate::ownership::resolve_owners;
use crate::ranker::{rank_building, NeighborRecord};
use crate::segment::{segment_parcel, SegmentSet};
use crate::shared::detect_shared;
use crate::types::{BoundarySegment, Building, BuildingId, Parcel, ParcelId, Street};
use crate::wide::{to_setback_record, SetbackRecord};

/// Loaded input layers.
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    pub parcels: Vec<Parcel>,
    pub buildings: Vec<Building>,
    pub streets: Vec<Street>,
}

/// A parcel that could not be processed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParcelFailure {
    pub parcel: ParcelId,
    pub error: String,
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub parcels: usize,
    pub parcels_failed: usize,
    pub segments: usize,
    pub shared_segments: usize,
    pub facing_segments: usize,
    pub curved_segments: usize,
    pub buildings: usize,
    pub partial_or_unowned: usize,
    pub near_records: usize,
    pub tie_breaks: usize,
    pub failures: Vec<ParcelFailure>,
    pub aggregate: AggregateResult,
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub segments: SegmentSet,
    pub near_table: Vec<NeighborRecord>,
    pub setbacks: Vec<SetbackRecord>,
    pub aggregate: AggregateResult,
    pub summary: RunSummary,
}

/// Result of measuring one parcel.
#[derive(Debug, Clone, Default)]
pub struct ParcelMeasurement {
    /// The parcel's segments with street frontage applied.
    pub segments: Vec<BoundarySegment>,
    pub near_table: Vec<NeighborRecord>,
    pub setbacks: Vec<SetbackRecord>,
}

/// Classify one parcel's segments and measure the buildings it owns.
///
/// Pure with respect to its inputs: `segments` supplies the neighbourhood
/// for ranking, and only `parcel`'s own segments are returned.
pub fn measure_parcel(
    parcel: &Parcel,
    segments: &SegmentSet,
    streets: &StreetLayer,
    buildings: &[&Building],
    config: &Config,
) -> ParcelMeasurement {
    let mut own: Vec<BoundarySegment> = segments.of_parcel(parcel.id).to_vec();
    let frontages = classify_parcel(parcel, &own, streets, &config.frontage);
    for (segment, frontage) in own.iter_mut().zip(frontages) {
        segment.frontage = frontage;
    }

    let mut near_table = Vec::new();
    let mut setbacks = Vec::with_capacity(buildings.len());
    for building in buildings {
        let records = rank_building(building, segments, &config.ranker);
        setbacks.push(to_setback_record(building, &records, &own, config.max_side_fields));
        near_table.extend(records);
    }

    ParcelMeasurement { segments: own, near_table, setbacks }
}

/// Rank a building with no owner against every parcel it intersects.
///
/// `segments` must already be classified.
pub fn measure_straddling(
    building: &Building,
    segments: &SegmentSet,
    config: &Config,
) -> (SetbackRecord, Vec<NeighborRecord>) {
    let records = rank_building(building, segments, &config.ranker);
    // `straddles` is ascending and each parcel's run is key-sorted.
    let sides: Vec<BoundarySegment> = building.straddles.iter()
        .flat_map(|&p| segments.of_parcel(p).iter().cloned())
        .collect();
    (to_setback_record(building, &records, &sides, config.max_side_fields), records)
}

fn require_features(layer: &str, count: usize) -> Result<(), SetbackError> {
    if count == 0 { Err(SetbackError::EmptyLayer(layer.to_string())) } else { Ok(()) }
}

/// Fails on the first id seen twice, in input order.
fn require_unique(layer: &str, ids: impl IntoIterator<Item = u64>) -> Result<(), SetbackError> {
    let mut seen = AHashSet::new();
    match ids.into_iter().find(|id| !seen.insert(*id)) {
        Some(id) => Err(SetbackError::DuplicateId { layer: layer.to_string(), id }),
        None => Ok(()),
    }
}

/// Segment every parcel. Per-parcel failures are recorded and the parcel is
/// skipped; any other geometry error aborts.
pub fn segment_all(parcels: &[Parcel], config: &Config) -> Result<(Vec<BoundarySegment>, Vec<ParcelFailure>)> {
    let results: Vec<(ParcelId, Result<Vec<BoundarySegment>, GeometryError>)> = parcels
        .par_iter()
        .map(|parcel| (parcel.id, segment_parcel(parcel, &config.segment)))
        .collect();

    let mut segments = Vec::new();
    let mut failures = Vec::new();
    for (parcel, result) in results {
        match result {
            Ok(s) => segments.extend(s),
            Err(e) if e.is_per_parcel() => {
                warn!("[segment] skipping parcel {parcel}: {e}");
                failures.push(ParcelFailure { parcel, error: e.to_string() });
            }
            Err(e) => return Err(SetbackError::from(e).into()),
        }
    }
    Ok((segments, failures))
}

/// Segment all parcels, resolve shared boundaries and classify frontage,
/// without measuring buildings.
pub fn classify_segments(parcels: &[Parcel], streets: Vec<Street>, config: &Config) -> Result<(SegmentSet, RunSummary)> {
    config.validate().map_err(SetbackError::from)?;
    require_features("parcels", parcels.len())?;
    require_unique("parcels", parcels.iter().map(|p| p.id.0))?;

    let (segments, failures) = segment_all(parcels, config)?;
    let mut segments = SegmentSet::new(segments);
    info!("[segment] {} segments from {} parcels", segments.len(), parcels.len());

    let ids: Vec<ParcelId> = parcels.iter().map(|p| p.id).collect();
    let shared = detect_shared(&mut segments, &ids, &config.shared);
    info!("[shared] {} shared pairs", shared.pairs.len());

    let streets = StreetLayer::new(streets);
    let view = &segments;
    let classified: Vec<Vec<BoundarySegment>> = parcels
        .par_iter()
        .map(|parcel| {
            let mut own = view.of_parcel(parcel.id).to_vec();
            let frontages = classify_parcel(parcel, &own, &streets, &config.frontage);
            for (segment, frontage) in own.iter_mut().zip(frontages) { segment.frontage = frontage }
            own
        })
        .collect();
    let segments = SegmentSet::new(classified.into_iter().flatten().collect());

    let summary = RunSummary {
        parcels: parcels.len(),
        parcels_failed: failures.len(),
        failures,
        tie_breaks: shared.tie_breaks,
        ..summarize_segments(&segments)
    };
    Ok((segments, summary))
}

fn summarize_segments(segments: &SegmentSet) -> RunSummary {
    RunSummary {
        segments: segments.len(),
        shared_segments: segments.iter().filter(|s| s.shared).count(),
        facing_segments: segments.iter().filter(|s| s.facing_street()).count(),
        curved_segments: segments.iter().filter(|s| s.curved).count(),
        ..RunSummary::default()
    }
}

/// Run every stage over the loaded layers.
pub fn run(inputs: Inputs, config: &Config) -> Result<RunOutput> {
    config.validate().map_err(SetbackError::from)?;
    require_features("parcels", inputs.parcels.len())?;
    require_features("buildings", inputs.buildings.len())?;
    require_features("streets", inputs.streets.len())?;
    require_unique("parcels", inputs.parcels.iter().map(|p| p.id.0))?;
    require_unique("buildings", inputs.buildings.iter().map(|b| b.id.0))?;

    let Inputs { parcels, mut buildings, streets } = inputs;

    let (segments, failures) = segment_all(&parcels, config)?;
    let mut segments = SegmentSet::new(segments);
    info!("[segment] {} segments from {} parcels ({} failed)", segments.len(), parcels.len(), failures.len());

    let ids: Vec<ParcelId> = parcels.iter().map(|p| p.id).collect();
    let shared = detect_shared(&mut segments, &ids, &config.shared);
    info!("[shared] {} shared pairs, {} tie-breaks", shared.pairs.len(), shared.tie_breaks);

    let partial_or_unowned = resolve_owners(&mut buildings, &parcels);
    info!("[ownership] {} buildings, {} partial or unowned", buildings.len(), partial_or_unowned);

    let mut owned: AHashMap<ParcelId, Vec<&Building>> = AHashMap::new();
    for building in &buildings {
        if let Some(parcel) = building.parcel { owned.entry(parcel).or_default().push(building) }
    }

    let streets = StreetLayer::new(streets);
    let view = &segments;
    let measured: Vec<ParcelMeasurement> = parcels
        .par_iter()
        .map(|parcel| {
            let mine = owned.get(&parcel.id).map_or(&[][..], Vec::as_slice);
            measure_parcel(parcel, view, &streets, mine, config)
        })
        .collect();

    let mut classified = Vec::with_capacity(segments.len());
    let mut near_table = Vec::new();
    let mut by_building: AHashMap<BuildingId, SetbackRecord> = AHashMap::new();
    for m in measured {
        classified.extend(m.segments);
        near_table.extend(m.near_table);
        by_building.extend(m.setbacks.into_iter().map(|r| (r.building, r)));
    }
    let segments = SegmentSet::new(classified);
    info!("[frontage] {} segments face a street", segments.iter().filter(|s| s.facing_street()).count());

    let straddling: Vec<(SetbackRecord, Vec<NeighborRecord>)> = buildings
        .par_iter()
        .filter(|b| b.parcel.is_none() && !b.straddles.is_empty())
        .map(|b| measure_straddling(b, &segments, config))
        .collect();
    if !straddling.is_empty() {
        info!("[ranker] {} buildings ranked across lot lines", straddling.len());
    }
    for (record, records) in straddling {
        near_table.extend(records);
        by_building.insert(record.building, record);
    }

    // One row per input building, in input order; buildings touching no
    // measured parcel keep empty tracks.
    let setbacks: Vec<SetbackRecord> = buildings.iter()
        .map(|b| by_building.remove(&b.id).unwrap_or_else(|| SetbackRecord::empty(b)))
        .collect();
    near_table.sort_by(|x, y| x.building.cmp(&y.building).then(x.rank.cmp(&y.rank)));
    info!("[ranker] {} near-table records for {} buildings", near_table.len(), setbacks.len());

    let aggregate = aggregate(&setbacks);
    info!(
        "[aggregate] {} buildings included, {} excluded",
        aggregate.included, aggregate.excluded,
    );

    let summary = RunSummary {
        parcels: parcels.len(),
        parcels_failed: failures.len(),
        buildings: buildings.len(),
        partial_or_unowned,
        near_records: near_table.len(),
        tie_breaks: shared.tie_breaks,
        failures,
        aggregate: aggregate.clone(),
        ..summarize_segments(&segments)
    };

    Ok(RunOutput { segments, near_table, setbacks, aggregate, summary })
}
