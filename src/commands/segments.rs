use anyhow::Result;
use log::info;

use crate::cli::SegmentsArgs;
use crate::common::prepare_output_dir;
use crate::io::{csv, geojson, load_inputs, summary};
use crate::pipeline::classify_segments;

use super::{load_config, parcel_layer, street_layer};

pub const OUTPUTS: [&str; 3] = ["segments.csv", "segments.geojson", "summary.json"];

pub fn run(args: &SegmentsArgs) -> Result<()> {
    let config = load_config(&args.layers, |config| args.layers.apply(config))?;
    prepare_output_dir(&args.output, &OUTPUTS, args.layers.force)?;

    info!(
        "[segments] parcels={} streets={} -> {}",
        args.parcels.display(),
        args.streets.display(),
        args.output.display(),
    );

    let parcels = parcel_layer(&args.parcels, &args.layers);
    let streets = street_layer(&args.streets, &args.layers);
    let (inputs, units) = load_inputs(&parcels, None, &streets, config.units)?;
    let (segments, run_summary) = classify_segments(&inputs.parcels, inputs.streets, &config)?;

    let out = &args.output;
    csv::write_segments(&segments, &out.join("segments.csv"))?;
    geojson::write_segments_geojson(&segments, units, &out.join("segments.geojson"))?;
    summary::write_summary(&run_summary, &config, units, &out.join("summary.json"))?;

    println!(
        "Wrote {} segments ({} facing a street, {} shared) -> {}",
        run_summary.segments,
        run_summary.facing_segments,
        run_summary.shared_segments,
        out.display(),
    );
    Ok(())
}
