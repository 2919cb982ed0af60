//! Subcommand entry points.

pub mod measure;
pub mod segments;

use std::path::Path;

use anyhow::Result;
use log::debug;

use crate::cli::LayerOptions;
use crate::config::Config;
use crate::error::SetbackError;
use crate::io::LayerSpec;

/// Configuration from the optional file, with command-line overrides applied
/// afterwards by the caller, then validated.
fn load_config(options: &LayerOptions, overrides: impl FnOnce(&mut Config)) -> Result<Config> {
    let mut config = match &options.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };
    overrides(&mut config);
    config.validate().map_err(SetbackError::from)?;
    debug!("[config] {config:?}");
    Ok(config)
}

fn parcel_layer(path: &Path, options: &LayerOptions) -> LayerSpec {
    LayerSpec { id_field: options.parcel_id_field.clone(), ..LayerSpec::new("parcels", path) }
}

fn street_layer(path: &Path, options: &LayerOptions) -> LayerSpec {
    LayerSpec {
        id_field: options.street_id_field.clone(),
        name_field: options.street_name_field.clone(),
        ..LayerSpec::new("streets", path)
    }
}
