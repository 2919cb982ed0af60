mod feature;
mod ids;
mod segment;
mod units;

pub use feature::{Building, Parcel, Street};
pub use ids::{BuildingId, ParcelId, SegmentKey, StreetId};
pub use segment::{BoundarySegment, Frontage, SegmentClass};
pub use units::LinearUnit;
