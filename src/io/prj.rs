use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;

use crate::error::GeometryError;
use crate::types::LinearUnit;

/// Linear unit declared by WKT text from a `.prj` sidecar.
///
/// A geographic system (no projection) is rejected. For projected systems the
/// last `UNIT`/`LENGTHUNIT` entry is the projected unit; earlier entries belong
/// to the base geographic system. Text without any unit yields `None`.
pub fn units_from_wkt(wkt: &str, layer: &str) -> Result<Option<LinearUnit>> {
    let text = wkt.trim();
    let projected = text.contains("PROJCS[") || text.contains("PROJCRS[");
    let geographic = text.starts_with("GEOGCS[") || text.starts_with("GEOGCRS[") || text.starts_with("GEODCRS[");
    if geographic && !projected {
        return Err(GeometryError::NonPlanar { layer: layer.to_string() }.into());
    }

    let unit = Regex::new(r#"(?:LENGTH)?UNIT\[\s*"([^"]+)"\s*,\s*([0-9.eE+-]+)"#)
        .context("[io::prj] Invalid unit pattern")?;
    let Some(caps) = unit.captures_iter(text).last() else { return Ok(None) };

    let name = &caps[1];
    let factor: Option<f64> = caps[2].parse().ok();
    factor.and_then(LinearUnit::from_factor)
        .or_else(|| LinearUnit::from_name(name))
        .map(Some)
        .ok_or_else(|| GeometryError::UnsupportedUnit { layer: layer.to_string(), unit: name.to_string() }.into())
}

/// Units declared by the `.prj` next to `shp_path`, if there is one.
pub fn units_for_shapefile(shp_path: &Path, layer: &str) -> Result<Option<LinearUnit>> {
    let prj = shp_path.with_extension("prj");
    if !prj.exists() { return Ok(None) }
    let text = std::fs::read_to_string(&prj)
        .with_context(|| format!("[io::prj] Failed to read {}", prj.display()))?;
    units_from_wkt(&text, layer)
}
