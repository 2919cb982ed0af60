use geo::Coord;

/// True when `vertices` contain at least `min_points` consecutive spacings
/// shorter than `spacing`: the signature of a digitised arc.
pub fn is_curved(vertices: &[Coord<f64>], spacing: f64, min_points: usize) -> bool {
    let mut run = 0;
    for w in vertices.windows(2) {
        let d = (w[1] - w[0]).x.hypot((w[1] - w[0]).y);
        if d < spacing {
            run += 1;
            if run >= min_points { return true }
        } else {
            run = 0;
        }
    }
    false
}
