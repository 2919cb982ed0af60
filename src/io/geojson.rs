use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::{json, Map, Value};

use crate::error::GeometryError;
use crate::segment::SegmentSet;
use crate::types::LinearUnit;

use super::store::{GeometryStore, Layer, LayerSpec, LineFeature, PolygonFeature};

/// GeoJSON FeatureCollections. Units come from a top-level `"units"` member;
/// a CRS naming WGS 84 longitude/latitude is rejected as non-planar.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoJsonStore;

fn parse_coord(value: &Value) -> Result<Coord<f64>> {
    let pair = value.as_array()
        .filter(|a| a.len() >= 2)
        .ok_or_else(|| anyhow!("[io::geojson] Invalid position: {value}"))?;
    match (pair[0].as_f64(), pair[1].as_f64()) {
        (Some(x), Some(y)) => Ok(Coord { x, y }),
        _ => bail!("[io::geojson] Non-numeric position: {value}"),
    }
}

fn parse_line(value: &Value) -> Result<LineString<f64>> {
    value.as_array()
        .ok_or_else(|| anyhow!("[io::geojson] Invalid line coordinates"))?
        .iter()
        .map(parse_coord)
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}

fn parse_polygon(value: &Value) -> Result<Polygon<f64>> {
    let rings = value.as_array()
        .ok_or_else(|| anyhow!("[io::geojson] Invalid polygon coordinates"))?
        .iter()
        .map(parse_line)
        .collect::<Result<Vec<_>>>()?;
    let mut rings = rings.into_iter();
    let exterior = rings.next().unwrap_or_else(|| LineString::new(Vec::new()));
    Ok(Polygon::new(exterior, rings.collect()))
}

fn each<T>(value: &Value, parse: impl Fn(&Value) -> Result<T>) -> Result<Vec<T>> {
    value.as_array()
        .ok_or_else(|| anyhow!("[io::geojson] Invalid multi-part coordinates"))?
        .iter()
        .map(parse)
        .collect()
}

fn read_collection(path: &Path) -> Result<Value> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("[io::geojson] Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_slice(&bytes)
        .with_context(|| format!("[io::geojson] Failed to parse {}", path.display()))?;
    if value["type"].as_str() != Some("FeatureCollection") {
        bail!("[io::geojson] {} is not a FeatureCollection", path.display());
    }
    Ok(value)
}

/// Declared units of a collection.
fn collection_units(collection: &Value, layer: &str) -> Result<Option<LinearUnit>> {
    if let Some(crs) = collection["crs"]["properties"]["name"].as_str() {
        let crs = crs.to_ascii_uppercase();
        if crs.contains("CRS84") || crs.ends_with("EPSG::4326") || crs.ends_with("EPSG:4326") {
            return Err(GeometryError::NonPlanar { layer: layer.to_string() }.into());
        }
    }
    match collection["units"].as_str() {
        None => Ok(None),
        Some(name) => LinearUnit::from_name(name)
            .map(Some)
            .ok_or_else(|| GeometryError::UnsupportedUnit { layer: layer.to_string(), unit: name.to_string() }.into()),
    }
}

fn property_integer(properties: &Value, field: &str) -> Result<Option<u64>> {
    match &properties[field] {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_u64()
            .or_else(|| n.as_f64().filter(|v| *v >= 0.0 && v.fract() == 0.0).map(|v| v as u64))
            .map(Some)
            .ok_or_else(|| anyhow!("[io::geojson] property {field} value {n} is not a non-negative integer")),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s.trim().parse::<u64>()
            .map(Some)
            .with_context(|| format!("[io::geojson] property {field} value '{s}' is not an integer")),
        other => bail!("[io::geojson] property {field} has unexpected value {other}"),
    }
}

fn feature_id(feature: &Value, layer: &LayerSpec, index: usize) -> Result<u64> {
    match &layer.id_field {
        Some(field) => property_integer(&feature["properties"], field)?
            .with_context(|| format!("[io::geojson] feature {} has no {field}", index + 1)),
        None => Ok(index as u64 + 1),
    }
}

fn feature_list(collection: &Value) -> impl Iterator<Item = &Value> {
    collection["features"].as_array().into_iter().flatten()
}

impl GeometryStore for GeoJsonStore {
    fn load_polygons(&self, layer: &LayerSpec) -> Result<Layer<PolygonFeature>> {
        let collection = read_collection(&layer.path)?;
        let units = collection_units(&collection, &layer.name)?;

        let features = feature_list(&collection).enumerate()
            .map(|(i, feature)| -> Result<PolygonFeature> {
                let geometry = &feature["geometry"];
                let shape = match geometry["type"].as_str() {
                    Some("Polygon") => MultiPolygon(vec![parse_polygon(&geometry["coordinates"])?]),
                    Some("MultiPolygon") => MultiPolygon(each(&geometry["coordinates"], parse_polygon)?),
                    None => MultiPolygon(Vec::new()),
                    Some(other) => bail!("[io::geojson] {}: expected polygons, found {other}", layer.name),
                };
                let owner = match &layer.owner_field {
                    Some(field) => property_integer(&feature["properties"], field)?,
                    None => None,
                };
                Ok(PolygonFeature { id: feature_id(feature, layer, i)?, shape, owner })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Layer { features, units })
    }

    fn load_lines(&self, layer: &LayerSpec) -> Result<Layer<LineFeature>> {
        let collection = read_collection(&layer.path)?;
        let units = collection_units(&collection, &layer.name)?;

        let features = feature_list(&collection).enumerate()
            .map(|(i, feature)| -> Result<LineFeature> {
                let geometry = &feature["geometry"];
                let parts = match geometry["type"].as_str() {
                    Some("LineString") => vec![parse_line(&geometry["coordinates"])?],
                    Some("MultiLineString") => each(&geometry["coordinates"], parse_line)?,
                    None => Vec::new(),
                    Some(other) => bail!("[io::geojson] {}: expected lines, found {other}", layer.name),
                };
                let name = layer.name_field.as_ref()
                    .and_then(|field| feature["properties"][field].as_str())
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from);
                Ok(LineFeature { id: feature_id(feature, layer, i)?, parts, name })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Layer { features, units })
    }
}

/// The classified segment layer as a GeoJSON FeatureCollection of LineStrings.
pub fn segments_to_geojson(segments: &SegmentSet, units: Option<LinearUnit>) -> Value {
    let features: Vec<Value> = segments.iter()
        .map(|s| {
            let coordinates: Vec<[f64; 2]> = s.vertices.iter().map(|c| [c.x, c.y]).collect();
            let frontage = s.frontage.as_ref().filter(|_| !s.shared);
            json!({
                "type": "Feature",
                "geometry": { "type": "LineString", "coordinates": coordinates },
                "properties": {
                    "key": s.key.to_string(),
                    "parcel": s.key.parcel.0,
                    "seq": s.key.seq,
                    "length": s.length(),
                    "shared": s.shared,
                    "counterpart": s.counterpart.map(|k| k.to_string()),
                    "facing_street": s.facing_street(),
                    "street_id": frontage.map(|f| f.street.0),
                    "street_name": frontage.and_then(|f| f.name.clone()),
                    "street_angle": frontage.map(|f| f.angle_deg),
                    "curved": s.curved,
                },
            })
        })
        .collect();

    let mut collection = Map::new();
    collection.insert("type".into(), json!("FeatureCollection"));
    if let Some(units) = units {
        collection.insert("units".into(), serde_json::to_value(units).unwrap_or(Value::Null));
    }
    collection.insert("features".into(), Value::Array(features));
    Value::Object(collection)
}

/// Write the classified segment layer to a `.geojson` file.
pub fn write_segments_geojson(segments: &SegmentSet, units: Option<LinearUnit>, path: &Path) -> Result<()> {
    let bytes = serde_json::to_vec(&segments_to_geojson(segments, units))
        .context("[io::geojson] Failed to serialize segments")?;
    std::fs::write(path, bytes)
        .with_context(|| format!("[io::geojson] Failed to write {}", path.display()))
}
