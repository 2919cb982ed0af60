use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use parcel_setbacks::cli::{Cli, Commands};
use parcel_setbacks::commands::{measure, segments};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match &cli.command {
        Commands::Measure(args) => measure::run(args),
        Commands::Segments(args) => segments::run(args),
    }
}
