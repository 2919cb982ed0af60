pub mod angle;
pub mod distance;
pub mod overlap;

pub use angle::{axial_bearing, axial_difference, bearing, normalize_signed, turning_angle};
pub use distance::{
    closest_point_on_segment, point_segment_distance, polyline_distance, polyline_length,
    polyline_nearest, segment_distance, segments_intersect, Nearest,
};
pub use overlap::{coincident_overlap, polyline_overlap};
