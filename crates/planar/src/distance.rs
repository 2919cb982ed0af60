use geo::Coord;

/// Closest pair of pieces between two polylines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest {
    pub distance: f64,
    /// Index of the piece `[i, i + 1]` on the first polyline.
    pub a_piece: usize,
    /// Index of the piece `[j, j + 1]` on the second polyline.
    pub b_piece: usize,
}

#[inline]
fn dot(a: Coord<f64>, b: Coord<f64>) -> f64 { a.x * b.x + a.y * b.y }

#[inline]
fn cross(a: Coord<f64>, b: Coord<f64>) -> f64 { a.x * b.y - a.y * b.x }

#[inline]
fn length(v: Coord<f64>) -> f64 { v.x.hypot(v.y) }

/// Point on segment `[a, b]` closest to `p`. A zero-length segment returns `a`.
pub fn closest_point_on_segment(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> Coord<f64> {
    let ab = b - a;
    let len2 = dot(ab, ab);
    if len2 <= f64::EPSILON { return a }
    let t = (dot(p - a, ab) / len2).clamp(0.0, 1.0);
    a + ab * t
}

#[inline]
pub fn point_segment_distance(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    length(p - closest_point_on_segment(p, a, b))
}

/// Orientation of `c` relative to the directed line `a -> b` (+1 left, -1 right, 0 collinear).
fn orientation(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>) -> i8 {
    let v = cross(b - a, c - a);
    let scale = length(b - a).max(length(c - a)).max(1.0);
    if v.abs() <= 1e-12 * scale * scale { 0 } else if v > 0.0 { 1 } else { -1 }
}

fn on_segment(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// True when the closed segments `[a0, a1]` and `[b0, b1]` share at least one point.
pub fn segments_intersect(a0: Coord<f64>, a1: Coord<f64>, b0: Coord<f64>, b1: Coord<f64>) -> bool {
    let o1 = orientation(a0, a1, b0);
    let o2 = orientation(a0, a1, b1);
    let o3 = orientation(b0, b1, a0);
    let o4 = orientation(b0, b1, a1);

    if o1 != o2 && o3 != o4 { return true }

    (o1 == 0 && on_segment(b0, a0, a1))
        || (o2 == 0 && on_segment(b1, a0, a1))
        || (o3 == 0 && on_segment(a0, b0, b1))
        || (o4 == 0 && on_segment(a1, b0, b1))
}

/// Minimum distance between two closed segments; zero when they touch or cross.
pub fn segment_distance(a0: Coord<f64>, a1: Coord<f64>, b0: Coord<f64>, b1: Coord<f64>) -> f64 {
    if segments_intersect(a0, a1, b0, b1) { return 0.0 }
    point_segment_distance(a0, b0, b1)
        .min(point_segment_distance(a1, b0, b1))
        .min(point_segment_distance(b0, a0, a1))
        .min(point_segment_distance(b1, a0, a1))
}

/// Pieces of a polyline as `(start, end)` pairs. A single vertex yields one
/// zero-length piece so that points still participate in distance queries.
fn pieces(line: &[Coord<f64>]) -> impl Iterator<Item = (Coord<f64>, Coord<f64>)> + '_ {
    let single = (line.len() == 1).then(|| (line[0], line[0]));
    single.into_iter().chain(line.windows(2).map(|w| (w[0], w[1])))
}

/// Closest pair of pieces between two polylines. Ties resolve to the lowest
/// piece indices. Returns `None` when either polyline is empty.
pub fn polyline_nearest(a: &[Coord<f64>], b: &[Coord<f64>]) -> Option<Nearest> {
    let mut best: Option<Nearest> = None;
    for (i, (a0, a1)) in pieces(a).enumerate() {
        for (j, (b0, b1)) in pieces(b).enumerate() {
            let distance = segment_distance(a0, a1, b0, b1);
            if best.is_none_or(|n| distance < n.distance) {
                best = Some(Nearest { distance, a_piece: i, b_piece: j });
                if distance == 0.0 { return best }
            }
        }
    }
    best
}

/// Minimum distance between two polylines, or infinity if either is empty.
#[inline]
pub fn polyline_distance(a: &[Coord<f64>], b: &[Coord<f64>]) -> f64 {
    polyline_nearest(a, b).map_or(f64::INFINITY, |n| n.distance)
}

#[inline]
pub fn polyline_length(line: &[Coord<f64>]) -> f64 {
    line.windows(2).map(|w| length(w[1] - w[0])).sum()
}
