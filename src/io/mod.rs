//! Reading input layers and writing run outputs, organised by format.
//!
//! - `store` - the `GeometryStore` trait, layer loading and unit checks
//! - `shp` - ESRI shapefiles, with units from the sidecar `.prj`
//! - `geojson` - GeoJSON FeatureCollections in and the segment layer out
//! - `prj` - linear units from WKT
//! - `csv` - wide table, aggregate, near table and segment tables
//! - `summary` - `summary.json`

pub mod csv;
pub mod geojson;
pub mod prj;
pub mod shp;
pub mod store;
pub mod summary;

pub use store::{check_units, load_inputs, store_for, GeometryStore, Layer, LayerSpec, LineFeature, PolygonFeature};
