use geo::Coord;

/// Length along `[a0, a1]` over which `[b0, b1]` runs within `epsilon` of it.
///
/// `b` is projected into the frame of `a`: each endpoint gets a position `t`
/// along `a` and a signed perpendicular offset. The overlap is the part of
/// `b`'s projected interval that lies inside `[0, |a|]` and where the linearly
/// interpolated offset stays within `epsilon`. The measure is taken along `a`,
/// so callers wanting a symmetric score should evaluate both directions.
pub fn coincident_overlap(
    a0: Coord<f64>,
    a1: Coord<f64>,
    b0: Coord<f64>,
    b1: Coord<f64>,
    epsilon: f64,
) -> f64 {
    let d = a1 - a0;
    let len = d.x.hypot(d.y);
    if len <= f64::EPSILON { return 0.0 }
    let (ux, uy) = (d.x / len, d.y / len);

    let frame = |p: Coord<f64>| {
        let (px, py) = (p.x - a0.x, p.y - a0.y);
        (px * ux + py * uy, py * ux - px * uy)
    };

    let (mut s, mut e) = (frame(b0), frame(b1));
    if s.0 > e.0 { std::mem::swap(&mut s, &mut e) }
    let ((t0, d0), (t1, d1)) = (s, e);

    // Perpendicular to `a`: no length is shared.
    if t1 - t0 <= f64::EPSILON { return 0.0 }

    let mut lo = t0.max(0.0);
    let mut hi = t1.min(len);
    if hi <= lo { return 0.0 }

    let slope = (d1 - d0) / (t1 - t0);
    if slope.abs() <= f64::EPSILON {
        if d0.abs() > epsilon { return 0.0 }
    } else {
        let ta = t0 + (-epsilon - d0) / slope;
        let tb = t0 + (epsilon - d0) / slope;
        lo = lo.max(ta.min(tb));
        hi = hi.min(ta.max(tb));
    }

    (hi - lo).max(0.0)
}

/// Total coincident length of polyline `b` measured along polyline `a`.
pub fn polyline_overlap(a: &[Coord<f64>], b: &[Coord<f64>], epsilon: f64) -> f64 {
    a.windows(2)
        .map(|pa| {
            b.windows(2)
                .map(|pb| coincident_overlap(pa[0], pa[1], pb[0], pb[1], epsilon))
                .sum::<f64>()
        })
        .sum()
}
