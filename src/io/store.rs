use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use geo::{Area, LineString, MultiPolygon, Polygon};
use log::{debug, info};

use crate::error::GeometryError;
use crate::pipeline::Inputs;
use crate::types::{Building, BuildingId, LinearUnit, Parcel, ParcelId, Street, StreetId};

use super::geojson::GeoJsonStore;
use super::shp::ShapefileStore;

/// Where a layer lives and which attributes carry its ids.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayerSpec {
    /// Name used in messages and unit checks.
    pub name: String,
    pub path: PathBuf,
    /// Integer attribute holding the feature id; record order (from 1) when absent.
    pub id_field: Option<String>,
    /// Integer attribute naming the owning parcel (building layers).
    pub owner_field: Option<String>,
    /// Text attribute holding the street name (street layers).
    pub name_field: Option<String>,
}

impl LayerSpec {
    pub fn new(name: &str, path: &Path) -> Self {
        Self { name: name.to_string(), path: path.to_path_buf(), ..Self::default() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolygonFeature {
    pub id: u64,
    pub shape: MultiPolygon<f64>,
    pub owner: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineFeature {
    pub id: u64,
    pub parts: Vec<LineString<f64>>,
    pub name: Option<String>,
}

/// Features of one layer plus its declared linear unit, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer<T> {
    pub features: Vec<T>,
    pub units: Option<LinearUnit>,
}

/// Source of planar features.
pub trait GeometryStore {
    fn load_polygons(&self, layer: &LayerSpec) -> Result<Layer<PolygonFeature>>;
    fn load_lines(&self, layer: &LayerSpec) -> Result<Layer<LineFeature>>;
}

/// Pick a store by file extension.
pub fn store_for(path: &Path) -> Result<Box<dyn GeometryStore>> {
    let ext = path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "shp" => Ok(Box::new(ShapefileStore)),
        "geojson" | "json" => Ok(Box::new(GeoJsonStore)),
        _ => bail!("[io::store] Unsupported input format for {} (expected .shp, .geojson or .json)", path.display()),
    }
}

/// The largest part of a multipart polygon; an empty polygon when there are none.
pub(crate) fn largest_part(shape: MultiPolygon<f64>, layer: &str, id: u64) -> Polygon<f64> {
    if shape.0.len() > 1 {
        debug!("[io::store] {layer} feature {id} has {} parts; using the largest", shape.0.len());
    }
    shape.0.into_iter()
        .max_by(|a, b| a.unsigned_area().total_cmp(&b.unsigned_area()))
        .unwrap_or_else(|| Polygon::new(LineString::new(Vec::new()), Vec::new()))
}

/// Check declared units against each other and against `expected`.
///
/// Layers without a declaration are accepted as-is.
pub fn check_units(
    declared: &[(&str, Option<LinearUnit>)],
    expected: Option<LinearUnit>,
) -> Result<Option<LinearUnit>, GeometryError> {
    let mut reference = expected;
    for &(layer, units) in declared {
        let Some(found) = units else { continue };
        match reference {
            None => reference = Some(found),
            Some(expected) if expected != found => {
                return Err(GeometryError::UnitMismatch { layer: layer.to_string(), expected, found });
            }
            Some(_) => {}
        }
    }
    Ok(reference)
}

fn require_present(layer: &LayerSpec) -> Result<()> {
    if !layer.path.exists() {
        return Err(crate::error::SetbackError::MissingLayer(layer.path.display().to_string()).into());
    }
    Ok(())
}

fn load_parcels(spec: &LayerSpec) -> Result<(Vec<Parcel>, Option<LinearUnit>)> {
    require_present(spec)?;
    let layer = store_for(&spec.path)?.load_polygons(spec)
        .with_context(|| format!("[io::store] Failed to load {} from {}", spec.name, spec.path.display()))?;
    let parcels = layer.features.into_iter()
        .map(|f| Parcel::new(ParcelId(f.id), largest_part(f.shape, &spec.name, f.id)))
        .collect();
    Ok((parcels, layer.units))
}

fn load_buildings(spec: &LayerSpec) -> Result<(Vec<Building>, Option<LinearUnit>)> {
    require_present(spec)?;
    let layer = store_for(&spec.path)?.load_polygons(spec)
        .with_context(|| format!("[io::store] Failed to load {} from {}", spec.name, spec.path.display()))?;
    let buildings = layer.features.into_iter()
        .map(|f| {
            let mut building = Building::new(BuildingId(f.id), largest_part(f.shape, &spec.name, f.id));
            building.parcel = f.owner.map(ParcelId);
            building
        })
        .collect();
    Ok((buildings, layer.units))
}

fn load_streets(spec: &LayerSpec) -> Result<(Vec<Street>, Option<LinearUnit>)> {
    require_present(spec)?;
    let layer = store_for(&spec.path)?.load_lines(spec)
        .with_context(|| format!("[io::store] Failed to load {} from {}", spec.name, spec.path.display()))?;
    let streets = layer.features.into_iter()
        .flat_map(|f| {
            let (id, name) = (StreetId(f.id), f.name);
            f.parts.into_iter()
                .filter(|part| part.0.len() >= 2)
                .map(move |part| Street::new(id, name.clone(), part))
        })
        .collect();
    Ok((streets, layer.units))
}

/// Load the layers of a run and check that their units agree.
///
/// `buildings` may be omitted when only segments are wanted.
pub fn load_inputs(
    parcels: &LayerSpec,
    buildings: Option<&LayerSpec>,
    streets: &LayerSpec,
    expected: Option<LinearUnit>,
) -> Result<(Inputs, Option<LinearUnit>)> {
    let (parcel_features, parcel_units) = load_parcels(parcels)?;
    let (street_features, street_units) = load_streets(streets)?;
    let (building_features, building_units) = match buildings {
        Some(spec) => load_buildings(spec)?,
        None => (Vec::new(), None),
    };

    let mut declared = vec![(parcels.name.as_str(), parcel_units), (streets.name.as_str(), street_units)];
    if let Some(spec) = buildings { declared.push((spec.name.as_str(), building_units)) }
    let units = check_units(&declared, expected)?;

    info!(
        "[io::store] loaded {} parcels, {} buildings, {} street parts ({})",
        parcel_features.len(),
        building_features.len(),
        street_features.len(),
        units.map_or("undeclared units".to_string(), |u| u.to_string()),
    );

    Ok((
        Inputs { parcels: parcel_features, buildings: building_features, streets: street_features },
        units,
    ))
}
