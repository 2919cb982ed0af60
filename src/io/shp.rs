use anyhow::{bail, Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use shapefile::dbase::{FieldValue, Record};
use shapefile::{PolygonRing, Reader, Shape};

use super::prj::units_for_shapefile;
use super::store::{GeometryStore, Layer, LayerSpec, LineFeature, PolygonFeature};

/// ESRI shapefile layers, with units taken from the `.prj` sidecar.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShapefileStore;

/// Group shapefile rings into polygons: each outer ring starts a polygon and
/// the inner rings that follow it are its holes.
fn rings_to_geo<P>(rings: &[PolygonRing<P>], xy: impl Fn(&P) -> Coord<f64>) -> MultiPolygon<f64> {
    let mut polygons = Vec::new();
    let mut exterior: Option<LineString<f64>> = None;
    let mut holes = Vec::new();

    for ring in rings {
        let line: LineString<f64> = ring.points().iter().map(&xy).collect();
        match ring {
            PolygonRing::Outer(_) => {
                if let Some(ext) = exterior.replace(line) {
                    polygons.push(Polygon::new(ext, std::mem::take(&mut holes)));
                }
            }
            PolygonRing::Inner(_) => holes.push(line),
        }
    }
    if let Some(ext) = exterior {
        polygons.push(Polygon::new(ext, holes));
    }
    MultiPolygon(polygons)
}

fn parts_to_geo<P>(parts: &[Vec<P>], xy: impl Fn(&P) -> Coord<f64>) -> Vec<LineString<f64>> {
    parts.iter().map(|part| part.iter().map(&xy).collect()).collect()
}

/// Value of an integer-like attribute.
fn integer_field(record: &Record, field: &str) -> Result<Option<u64>> {
    let value = match record.get(field) {
        Some(FieldValue::Numeric(n)) => *n,
        Some(FieldValue::Integer(n)) => Some(*n as f64),
        Some(FieldValue::Double(n)) => Some(*n),
        Some(FieldValue::Float(n)) => (*n).map(f64::from),
        Some(FieldValue::Character(s)) => match s.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(text) => Some(text.parse::<f64>()
                .with_context(|| format!("[io::shp] field {field} value '{text}' is not a number"))?),
        },
        Some(_) => bail!("[io::shp] field {field} is not numeric"),
        None => bail!("[io::shp] missing field: {field}"),
    };
    match value {
        Some(v) if v >= 0.0 && v.fract() == 0.0 => Ok(Some(v as u64)),
        Some(v) => bail!("[io::shp] field {field} value {v} is not a non-negative integer"),
        None => Ok(None),
    }
}

fn text_field(record: &Record, field: &str) -> Result<Option<String>> {
    match record.get(field) {
        Some(FieldValue::Character(s)) => Ok(s.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(String::from)),
        Some(FieldValue::Memo(s)) => Ok(Some(s.trim().to_string()).filter(|s| !s.is_empty())),
        Some(_) => bail!("[io::shp] field {field} is not text"),
        None => bail!("[io::shp] missing field: {field}"),
    }
}

fn feature_id(record: &Record, layer: &LayerSpec, index: usize) -> Result<u64> {
    match &layer.id_field {
        Some(field) => integer_field(record, field)?
            .with_context(|| format!("[io::shp] record {} has no {field}", index + 1)),
        None => Ok(index as u64 + 1),
    }
}

fn read_all(layer: &LayerSpec) -> Result<Vec<(Shape, Record)>> {
    let mut reader = Reader::from_path(&layer.path)
        .with_context(|| format!("[io::shp] Failed to open shapefile: {}", layer.path.display()))?;
    reader.iter_shapes_and_records()
        .map(|result| result.context("[io::shp] Error reading shape+record"))
        .collect()
}

impl GeometryStore for ShapefileStore {
    fn load_polygons(&self, layer: &LayerSpec) -> Result<Layer<PolygonFeature>> {
        let mut features = Vec::new();
        for (i, (shape, record)) in read_all(layer)?.into_iter().enumerate() {
            let shape = match shape {
                Shape::Polygon(p) => rings_to_geo(p.rings(), |pt| Coord { x: pt.x, y: pt.y }),
                Shape::PolygonM(p) => rings_to_geo(p.rings(), |pt| Coord { x: pt.x, y: pt.y }),
                Shape::PolygonZ(p) => rings_to_geo(p.rings(), |pt| Coord { x: pt.x, y: pt.y }),
                Shape::NullShape => MultiPolygon(Vec::new()),
                other => bail!("[io::shp] {}: expected polygons, found {}", layer.name, other.shapetype()),
            };
            let owner = match &layer.owner_field {
                Some(field) => integer_field(&record, field)?,
                None => None,
            };
            features.push(PolygonFeature { id: feature_id(&record, layer, i)?, shape, owner });
        }
        Ok(Layer { features, units: units_for_shapefile(&layer.path, &layer.name)? })
    }

    fn load_lines(&self, layer: &LayerSpec) -> Result<Layer<LineFeature>> {
        let mut features = Vec::new();
        for (i, (shape, record)) in read_all(layer)?.into_iter().enumerate() {
            let parts = match shape {
                Shape::Polyline(p) => parts_to_geo(p.parts(), |pt| Coord { x: pt.x, y: pt.y }),
                Shape::PolylineM(p) => parts_to_geo(p.parts(), |pt| Coord { x: pt.x, y: pt.y }),
                Shape::PolylineZ(p) => parts_to_geo(p.parts(), |pt| Coord { x: pt.x, y: pt.y }),
                Shape::NullShape => Vec::new(),
                other => bail!("[io::shp] {}: expected polylines, found {}", layer.name, other.shapetype()),
            };
            let name = match &layer.name_field {
                Some(field) => text_field(&record, field)?,
                None => None,
            };
            features.push(LineFeature { id: feature_id(&record, layer, i)?, parts, name });
        }
        Ok(Layer { features, units: units_for_shapefile(&layer.path, &layer.name)? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapefile::Point;
    use std::path::Path;

    fn xy(p: &Point) -> Coord<f64> { Coord { x: p.x, y: p.y } }

    fn ring(pts: &[(f64, f64)]) -> Vec<Point> {
        pts.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    fn make_test_record(fields: Vec<(&str, FieldValue)>) -> Record {
        let mut record = Record::default();
        for (name, value) in fields {
            record.insert(name.to_string(), value);
        }
        record
    }

    #[test]
    fn test_inner_rings_attach_to_preceding_outer() {
        let rings = vec![
            PolygonRing::Outer(ring(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0), (0.0, 0.0)])),
            PolygonRing::Inner(ring(&[(2.0, 2.0), (4.0, 2.0), (4.0, 4.0), (2.0, 2.0)])),
            PolygonRing::Outer(ring(&[(20.0, 0.0), (20.0, 5.0), (25.0, 5.0), (20.0, 0.0)])),
        ];
        let shape = rings_to_geo(&rings, xy);
        assert_eq!(shape.0.len(), 2);
        assert_eq!(shape.0[0].interiors().len(), 1);
        assert!(shape.0[1].interiors().is_empty());
        assert_eq!(shape.0[1].exterior().0[0], Coord { x: 20.0, y: 0.0 });
    }

    #[test]
    fn test_integer_field_accepts_numeric_and_text() {
        let record = make_test_record(vec![
            ("APN", FieldValue::Numeric(Some(1207.0))),
            ("LOT", FieldValue::Character(Some(" 42 ".into()))),
            ("BLANK", FieldValue::Character(Some("  ".into()))),
            ("NEG", FieldValue::Numeric(Some(-3.0))),
            ("FRAC", FieldValue::Double(2.5)),
            ("WORD", FieldValue::Character(Some("corner".into()))),
        ]);
        assert_eq!(integer_field(&record, "APN").unwrap(), Some(1207));
        assert_eq!(integer_field(&record, "LOT").unwrap(), Some(42));
        assert_eq!(integer_field(&record, "BLANK").unwrap(), None);
        assert!(integer_field(&record, "NEG").is_err());
        assert!(integer_field(&record, "FRAC").is_err());
        assert!(integer_field(&record, "WORD").is_err());
        assert!(integer_field(&record, "MISSING").is_err());
    }

    #[test]
    fn test_text_field_trims_and_drops_blanks() {
        let record = make_test_record(vec![
            ("NAME", FieldValue::Character(Some("  Main St ".into()))),
            ("EMPTY", FieldValue::Character(None)),
            ("NUM", FieldValue::Numeric(Some(1.0))),
        ]);
        assert_eq!(text_field(&record, "NAME").unwrap().as_deref(), Some("Main St"));
        assert_eq!(text_field(&record, "EMPTY").unwrap(), None);
        assert!(text_field(&record, "NUM").is_err());
    }

    #[test]
    fn test_feature_id_falls_back_to_record_order() {
        let record = make_test_record(vec![("FID", FieldValue::Numeric(None))]);
        let mut layer = LayerSpec::new("parcels", Path::new("parcels.shp"));
        assert_eq!(feature_id(&record, &layer, 4).unwrap(), 5);

        layer.id_field = Some("FID".into());
        assert!(feature_id(&record, &layer, 4).is_err());
    }
}
