use clap::{Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

use crate::config::Config;
use crate::types::LinearUnit;

/// Building setback measurement CLI
#[derive(Parser, Debug)]
#[command(name = "setbacks", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Measure building setbacks and write every output table (forbids stdout)
    Measure(MeasureArgs),

    /// Segment and classify parcel boundaries only (forbids stdout)
    Segments(SegmentsArgs),
}

fn parse_unit(s: &str) -> Result<LinearUnit, String> {
    LinearUnit::from_name(s).ok_or_else(|| format!("unknown linear unit '{s}' (expected meter, foot or us_survey_foot)"))
}

/// Attribute names and shared options for the parcel and street layers.
#[derive(Args, Debug, Clone, Default)]
pub struct LayerOptions {
    /// Integer parcel id attribute (record order when omitted)
    #[arg(long)]
    pub parcel_id_field: Option<String>,

    /// Integer street id attribute (record order when omitted)
    #[arg(long)]
    pub street_id_field: Option<String>,

    /// Street name attribute
    #[arg(long)]
    pub street_name_field: Option<String>,

    /// JSON configuration file; flags below override it
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Linear unit every layer must be in
    #[arg(long, value_parser = parse_unit)]
    pub units: Option<LinearUnit>,

    /// Coincidence tolerance for shared boundaries
    #[arg(long)]
    pub epsilon: Option<f64>,

    /// Search distance from a parcel to candidate streets
    #[arg(long)]
    pub buffer: Option<f64>,

    /// Largest angle, in degrees, between a facing side and its street
    #[arg(long)]
    pub parallel_tolerance: Option<f64>,

    /// Overwrite existing output files
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct MeasureArgs {
    /// Parcel polygons (.shp or .geojson)
    #[arg(value_hint = ValueHint::FilePath)]
    pub parcels: PathBuf,

    /// Building footprint polygons (.shp or .geojson)
    #[arg(value_hint = ValueHint::FilePath)]
    pub buildings: PathBuf,

    /// Street centerlines (.shp or .geojson)
    #[arg(value_hint = ValueHint::FilePath)]
    pub streets: PathBuf,

    /// Output directory
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    pub output: PathBuf,

    /// Integer building id attribute (record order when omitted)
    #[arg(long)]
    pub building_id_field: Option<String>,

    /// Integer attribute naming each building's parcel; owners are found spatially when omitted
    #[arg(long)]
    pub owner_field: Option<String>,

    /// Search radius from a footprint to boundary segments
    #[arg(long)]
    pub radius: Option<f64>,

    /// Most candidate segments kept per building before the owner filter
    #[arg(long)]
    pub max_candidates: Option<usize>,

    /// Slots per track in the wide table
    #[arg(long)]
    pub max_side_fields: Option<usize>,

    #[command(flatten)]
    pub layers: LayerOptions,
}

#[derive(Args, Debug)]
pub struct SegmentsArgs {
    /// Parcel polygons (.shp or .geojson)
    #[arg(value_hint = ValueHint::FilePath)]
    pub parcels: PathBuf,

    /// Street centerlines (.shp or .geojson)
    #[arg(value_hint = ValueHint::FilePath)]
    pub streets: PathBuf,

    /// Output directory
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    pub output: PathBuf,

    #[command(flatten)]
    pub layers: LayerOptions,
}

impl LayerOptions {
    /// Apply the shared flags on top of `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(units) = self.units { config.units = Some(units) }
        if let Some(epsilon) = self.epsilon { config.shared.epsilon = epsilon }
        if let Some(buffer) = self.buffer { config.frontage.buffer = buffer }
        if let Some(tolerance) = self.parallel_tolerance { config.frontage.parallel_tolerance_deg = tolerance }
    }
}

impl MeasureArgs {
    pub fn apply(&self, config: &mut Config) {
        self.layers.apply(config);
        if let Some(radius) = self.radius { config.ranker.radius = radius }
        if let Some(max) = self.max_candidates { config.ranker.max_candidates = max }
        if let Some(max) = self.max_side_fields { config.max_side_fields = max }
    }
}
