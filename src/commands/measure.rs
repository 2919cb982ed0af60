use anyhow::Result;
use log::info;

use crate::cli::MeasureArgs;
use crate::common::prepare_output_dir;
use crate::io::{csv, geojson, load_inputs, summary, LayerSpec};
use crate::pipeline;

use super::{load_config, parcel_layer, street_layer};

/// Files written into the output directory.
pub const OUTPUTS: [&str; 6] = [
    "setbacks.csv",
    "aggregate.csv",
    "near_table.csv",
    "segments.csv",
    "segments.geojson",
    "summary.json",
];

pub fn run(args: &MeasureArgs) -> Result<()> {
    let config = load_config(&args.layers, |config| args.apply(config))?;
    prepare_output_dir(&args.output, &OUTPUTS, args.layers.force)?;

    info!(
        "[measure] parcels={} buildings={} streets={} -> {}",
        args.parcels.display(),
        args.buildings.display(),
        args.streets.display(),
        args.output.display(),
    );

    let parcels = parcel_layer(&args.parcels, &args.layers);
    let streets = street_layer(&args.streets, &args.layers);
    let buildings = LayerSpec {
        id_field: args.building_id_field.clone(),
        owner_field: args.owner_field.clone(),
        ..LayerSpec::new("buildings", &args.buildings)
    };

    let (inputs, units) = load_inputs(&parcels, Some(&buildings), &streets, config.units)?;
    let output = pipeline::run(inputs, &config)?;

    let out = &args.output;
    csv::write_setbacks(&output.setbacks, config.max_side_fields, &out.join("setbacks.csv"))?;
    csv::write_aggregate(&output.aggregate, &out.join("aggregate.csv"))?;
    csv::write_near_table(&output.near_table, &output.segments, &out.join("near_table.csv"))?;
    csv::write_segments(&output.segments, &out.join("segments.csv"))?;
    geojson::write_segments_geojson(&output.segments, units, &out.join("segments.geojson"))?;
    summary::write_summary(&output.summary, &config, units, &out.join("summary.json"))?;

    let mean = |m: Option<f64>| m.map_or("n/a".to_string(), |m| format!("{m:.2}"));
    println!(
        "Measured {} buildings ({} included) -> {}; mean setback facing street {}, other side {}",
        output.setbacks.len(),
        output.aggregate.included,
        out.display(),
        mean(output.aggregate.facing_street.mean()),
        mean(output.aggregate.other_side.mean()),
    );
    Ok(())
}
