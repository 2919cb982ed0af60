//! CSV writing operations.

use std::{fs::File, path::Path};

use anyhow::{Context, Result};
use polars::prelude::*;

use crate::aggregate::{exclusions, AggregateResult};
use crate::ranker::NeighborRecord;
use crate::segment::SegmentSet;
use crate::wide::{SetbackRecord, SideSlot};

/// Write a DataFrame to a CSV file.
pub(crate) fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("[io::csv::write] Failed to create CSV file: {}", path.display()))?;
    CsvWriter::new(file)
        .finish(df)
        .with_context(|| format!("[io::csv::write] Failed to write CSV to {:?}", path))
}

fn slot_column<T>(name: String, records: &[SetbackRecord], n: usize, track: fn(&SetbackRecord) -> &[SideSlot], value: impl Fn(&SideSlot) -> Option<T>) -> Column
where
    Series: NamedFrom<Vec<Option<T>>, [Option<T>]>,
{
    let values: Vec<Option<T>> = records.iter()
        .map(|r| track(r).get(n).and_then(&value))
        .collect();
    Column::new(name.into(), values)
}

fn facing(record: &SetbackRecord) -> &[SideSlot] { &record.facing }

fn other(record: &SetbackRecord) -> &[SideSlot] { &record.other }

/// The unfiltered wide table, one row per building.
///
/// Slots are numbered from 1; unpopulated slots are null.
pub fn setbacks_frame(records: &[SetbackRecord], max_side_fields: usize) -> Result<DataFrame> {
    let reasons: Vec<Option<String>> = records.iter()
        .map(|r| {
            let reasons: Vec<&str> = exclusions(r).into_iter().map(|e| e.as_str()).collect();
            (!reasons.is_empty()).then(|| reasons.join(";"))
        })
        .collect();

    let mut columns = vec![
        Column::new("IN_ID".into(), records.iter().map(|r| r.building.0).collect::<Vec<u64>>()),
        Column::new("PARCEL_ID".into(), records.iter().map(|r| r.parcel.map(|p| p.0)).collect::<Vec<Option<u64>>>()),
        Column::new("PARTIAL_OR_UNOWNED".into(), records.iter().map(|r| r.partial_or_unowned).collect::<Vec<bool>>()),
        Column::new("CAPACITY_EXCEEDED".into(), records.iter().map(|r| r.capacity_exceeded).collect::<Vec<bool>>()),
        Column::new("ZERO_CONTACT".into(), records.iter().map(|r| r.zero_contact).collect::<Vec<bool>>()),
        Column::new("EXCLUDED".into(), reasons.iter().map(Option::is_some).collect::<Vec<bool>>()),
        Column::new("EXCLUSION".into(), reasons),
    ];

    for n in 0..max_side_fields {
        let i = n + 1;
        columns.push(slot_column(format!("FACING_STREET_PB_{i}_ID"), records, n, facing, |s| Some(s.segment.to_string())));
        columns.push(slot_column(format!("FACING_STREET_PB_{i}_DIST"), records, n, facing, |s| Some(s.distance)));
        columns.push(slot_column(format!("FACING_STREET_{i}_NAME"), records, n, facing, |s| s.street.clone()));
    }
    for n in 0..max_side_fields {
        let i = n + 1;
        columns.push(slot_column(format!("OTHER_SIDE_PB_{i}_ID"), records, n, other, |s| Some(s.segment.to_string())));
        columns.push(slot_column(format!("OTHER_SIDE_PB_{i}_DIST"), records, n, other, |s| Some(s.distance)));
    }

    DataFrame::new(columns).context("[io::csv::write] Failed to build setbacks table")
}

/// The aggregate table: one row per category.
pub fn aggregate_frame(result: &AggregateResult) -> Result<DataFrame> {
    let rows = result.rows();
    DataFrame::new(vec![
        Column::new("category".into(), rows.iter().map(|(name, _)| *name).collect::<Vec<&str>>()),
        Column::new("count".into(), rows.iter().map(|(_, s)| s.count as u64).collect::<Vec<u64>>()),
        Column::new("sum".into(), rows.iter().map(|(_, s)| s.sum).collect::<Vec<f64>>()),
        Column::new("mean".into(), rows.iter().map(|(_, s)| s.mean()).collect::<Vec<Option<f64>>>()),
    ])
    .context("[io::csv::write] Failed to build aggregate table")
}

/// The long-form near table. Records whose segment is missing from
/// `segments` get a null class.
pub fn near_table_frame(records: &[NeighborRecord], segments: &SegmentSet) -> Result<DataFrame> {
    DataFrame::new(vec![
        Column::new("IN_ID".into(), records.iter().map(|r| r.building.0).collect::<Vec<u64>>()),
        Column::new("PARCEL_ID".into(), records.iter().map(|r| r.segment.parcel.0).collect::<Vec<u64>>()),
        Column::new("PARCEL_COMBO".into(), records.iter().map(|r| r.segment.to_string()).collect::<Vec<String>>()),
        Column::new("NEAR_DIST".into(), records.iter().map(|r| r.distance).collect::<Vec<f64>>()),
        Column::new("NEAR_RANK".into(), records.iter().map(|r| r.rank).collect::<Vec<u32>>()),
        Column::new(
            "CLASS".into(),
            records.iter()
                .map(|r| segments.get(r.segment).map(|s| s.class().as_str()))
                .collect::<Vec<Option<&str>>>(),
        ),
    ])
    .context("[io::csv::write] Failed to build near table")
}

/// The classified segment layer without geometry.
pub fn segments_frame(segments: &SegmentSet) -> Result<DataFrame> {
    let frontage = |s: &crate::types::BoundarySegment| s.frontage.clone().filter(|_| !s.shared);
    DataFrame::new(vec![
        Column::new("PARCEL_COMBO".into(), segments.iter().map(|s| s.key.to_string()).collect::<Vec<String>>()),
        Column::new("PARCEL_ID".into(), segments.iter().map(|s| s.key.parcel.0).collect::<Vec<u64>>()),
        Column::new("SEQ".into(), segments.iter().map(|s| s.key.seq).collect::<Vec<u32>>()),
        Column::new("LENGTH".into(), segments.iter().map(|s| s.length()).collect::<Vec<f64>>()),
        Column::new("VERTICES".into(), segments.iter().map(|s| s.vertices.len() as u32).collect::<Vec<u32>>()),
        Column::new("CLASS".into(), segments.iter().map(|s| s.class().as_str()).collect::<Vec<&str>>()),
        Column::new("SHARED".into(), segments.iter().map(|s| s.shared).collect::<Vec<bool>>()),
        Column::new(
            "COUNTERPART".into(),
            segments.iter().map(|s| s.counterpart.map(|k| k.to_string())).collect::<Vec<Option<String>>>(),
        ),
        Column::new("CURVED".into(), segments.iter().map(|s| s.curved).collect::<Vec<bool>>()),
        Column::new(
            "STREET_ID".into(),
            segments.iter().map(|s| frontage(s).map(|f| f.street.0)).collect::<Vec<Option<u64>>>(),
        ),
        Column::new(
            "STREET_NAME".into(),
            segments.iter().map(|s| frontage(s).and_then(|f| f.name)).collect::<Vec<Option<String>>>(),
        ),
        Column::new(
            "STREET_ANGLE".into(),
            segments.iter().map(|s| frontage(s).map(|f| f.angle_deg)).collect::<Vec<Option<f64>>>(),
        ),
    ])
    .context("[io::csv::write] Failed to build segments table")
}

pub fn write_setbacks(records: &[SetbackRecord], max_side_fields: usize, path: &Path) -> Result<()> {
    write_csv(&mut setbacks_frame(records, max_side_fields)?, path)
}

pub fn write_aggregate(result: &AggregateResult, path: &Path) -> Result<()> {
    write_csv(&mut aggregate_frame(result)?, path)
}

pub fn write_near_table(records: &[NeighborRecord], segments: &SegmentSet, path: &Path) -> Result<()> {
    write_csv(&mut near_table_frame(records, segments)?, path)
}

pub fn write_segments(segments: &SegmentSet, path: &Path) -> Result<()> {
    write_csv(&mut segments_frame(segments)?, path)
}
