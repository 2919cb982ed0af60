#![doc = "Building setback measurement against classified parcel boundaries"]
pub mod aggregate;
pub mod cli;
pub mod commands;
pub mod common;
pub mod config;
pub mod error;
pub mod frontage;
mod geom;
pub mod io;
pub mod ownership;
pub mod pipeline;
pub mod ranker;
pub mod segment;
pub mod shared;
pub mod types;
pub mod wide;

#[doc(inline)]
pub use config::Config;

#[doc(inline)]
pub use error::{ConfigError, GeometryError, SetbackError};

#[doc(inline)]
pub use pipeline::{classify_segments, run, Inputs, RunOutput, RunSummary};

#[doc(inline)]
pub use types::{BoundarySegment, Building, BuildingId, Parcel, ParcelId, SegmentKey, Street, StreetId};
