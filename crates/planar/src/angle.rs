use geo::Coord;

/// Wrap an angle in degrees into the half-open range (-180, 180].
#[inline]
pub fn normalize_signed(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped > 180.0 { wrapped - 360.0 } else { wrapped }
}

/// Direction of travel from `a` to `b` in degrees, measured counter-clockwise
/// from the positive x axis, in (-180, 180].
#[inline]
pub fn bearing(a: Coord<f64>, b: Coord<f64>) -> f64 {
    normalize_signed((b.y - a.y).atan2(b.x - a.x).to_degrees())
}

/// Undirected orientation of the line through `a` and `b`, in [0, 180).
#[inline]
pub fn axial_bearing(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let axial = bearing(a, b).rem_euclid(180.0);
    if axial >= 180.0 { 0.0 } else { axial }
}

/// Smallest angle between two undirected orientations, in [0, 90].
///
/// Inputs may be any bearings in degrees; opposite directions compare as equal.
#[inline]
pub fn axial_difference(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(180.0);
    diff.min(180.0 - diff)
}

/// Signed change of direction at `at` when walking `prev -> at -> next`.
///
/// Positive values turn left (counter-clockwise), negative values turn right.
/// The result lies in (-180, 180]; a full reversal reports 180.
#[inline]
pub fn turning_angle(prev: Coord<f64>, at: Coord<f64>, next: Coord<f64>) -> f64 {
    normalize_signed(bearing(at, next) - bearing(prev, at))
}
