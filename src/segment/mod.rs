mod curve;
mod segmenter;
mod set;

pub use curve::is_curved;
pub use segmenter::{clean_ring, segment_parcel, segment_ring};
pub use set::SegmentSet;
