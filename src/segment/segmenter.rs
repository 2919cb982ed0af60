use geo::Coord;
use smallvec::SmallVec;

use planar::turning_angle;

use crate::config::SegmentConfig;
use crate::error::{GeometryError, Result};
use crate::types::{BoundarySegment, Parcel, ParcelId, SegmentKey};

use super::curve::is_curved;

/// Vertices closer than this are the same vertex.
const DUPLICATE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Turn {
    Straight,
    Gentle,
    Sharp,
}

#[inline]
fn same(a: Coord<f64>, b: Coord<f64>) -> bool {
    (a.x - b.x).abs() <= DUPLICATE_TOLERANCE && (a.y - b.y).abs() <= DUPLICATE_TOLERANCE
}

/// Normalise a ring: reject non-finite input, drop consecutive duplicates and
/// the closing duplicate. Fails when fewer than two distinct vertices remain.
pub fn clean_ring(parcel: ParcelId, ring: &[Coord<f64>]) -> Result<Vec<Coord<f64>>> {
    if ring.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(GeometryError::NonFinite { parcel });
    }

    let mut out: Vec<Coord<f64>> = Vec::with_capacity(ring.len());
    for &c in ring {
        if out.last().is_none_or(|&prev| !same(prev, c)) { out.push(c) }
    }
    while out.len() > 1 && same(out[0], out[out.len() - 1]) { out.pop(); }

    if out.len() < 2 {
        return Err(GeometryError::DegenerateRing { parcel, vertices: out.len() });
    }
    Ok(out)
}

/// Maximal runs of consecutive gentle vertices, walking the ring cyclically.
/// A ring made only of gentle vertices has no run boundaries and yields nothing.
fn gentle_runs(turns: &[Turn]) -> Vec<Vec<usize>> {
    let n = turns.len();
    let Some(start) = turns.iter().position(|&t| t != Turn::Gentle) else { return Vec::new() };

    let mut runs = Vec::new();
    let mut current = Vec::new();
    for step in 1..=n {
        let i = (start + step) % n;
        if turns[i] == Turn::Gentle {
            current.push(i);
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    runs
}

/// Index of the vertex with the highest `score`. Equal scores go to the
/// lowest (x, y), so the pick does not depend on where the ring starts.
fn best_vertex(v: &[Coord<f64>], score: impl Fn(usize) -> f64) -> usize {
    (1..v.len()).fold(0, |best, i| {
        let order = score(i).total_cmp(&score(best))
            .then_with(|| v[best].x.total_cmp(&v[i].x))
            .then_with(|| v[best].y.total_cmp(&v[i].y));
        if order.is_gt() { i } else { best }
    })
}

/// Split a parcel's outer ring into boundary segments.
pub fn segment_parcel(parcel: &Parcel, config: &SegmentConfig) -> Result<Vec<BoundarySegment>> {
    segment_ring(parcel.id, parcel.ring(), config)
}

/// Split a ring into boundary segments in traversal order, sequence ids from 1.
///
/// Vertices turning by more than `theta_high_deg` are corners. Consecutive
/// vertices turning by more than `theta_low_deg` form a gentle run whose net
/// turn decides how it is cut: a net turn within `theta_low_deg` is jitter and
/// is left alone; otherwise the run is split at both ends, and once more in the
/// middle when the net turn exceeds `theta_high_deg`. Pieces lying entirely
/// inside a cut run become chords; other pieces keep their source vertices.
///
/// A ring with fewer than two cuts is anchored at its sharpest vertex and the
/// vertex farthest from it, so every ring of three or more vertices yields at
/// least two segments. A two-vertex ring yields one segment per edge.
pub fn segment_ring(
    parcel: ParcelId,
    ring: &[Coord<f64>],
    config: &SegmentConfig,
) -> Result<Vec<BoundarySegment>> {
    let v = clean_ring(parcel, ring)?;
    let n = v.len();

    let build = |seq: u32, full: SmallVec<[Coord<f64>; 4]>, chord: bool| {
        let curved = is_curved(&full, config.curve_spacing, config.curve_min_points);
        let vertices = if chord && full.len() > 2 {
            SmallVec::from_slice(&[full[0], full[full.len() - 1]])
        } else {
            full
        };
        BoundarySegment::new(SegmentKey::new(parcel, seq), vertices, curved)
    };

    if n == 2 {
        return Ok(vec![
            build(1, SmallVec::from_slice(&[v[0], v[1]]), false),
            build(2, SmallVec::from_slice(&[v[1], v[0]]), false),
        ]);
    }

    let angles: Vec<f64> = (0..n)
        .map(|i| turning_angle(v[(i + n - 1) % n], v[i], v[(i + 1) % n]))
        .collect();
    let turns: Vec<Turn> = angles.iter()
        .map(|a| match a.abs() {
            x if x > config.theta_high_deg => Turn::Sharp,
            x if x > config.theta_low_deg => Turn::Gentle,
            _ => Turn::Straight,
        })
        .collect();

    let mut split: Vec<bool> = turns.iter().map(|&t| t == Turn::Sharp).collect();
    let mut collapsed = vec![false; n];

    for run in gentle_runs(&turns) {
        let net = run.iter().map(|&i| angles[i]).sum::<f64>().abs();
        // Net turn within theta_low is jitter; the run stays unsplit.
        if net <= config.theta_low_deg { continue }

        split[run[0]] = true;
        split[run[run.len() - 1]] = true;
        if net > config.theta_high_deg { split[run[run.len() / 2]] = true }
        if run.len() > 2 {
            for &i in &run[1..run.len() - 1] { collapsed[i] = true }
        }
    }

    if split.iter().filter(|&&s| s).count() < 2 {
        let anchor = split.iter().position(|&s| s)
            .unwrap_or_else(|| best_vertex(&v, |i| angles[i].abs()));
        let far = best_vertex(&v, |i| {
            let d = v[i] - v[anchor];
            d.x.hypot(d.y)
        });
        split[anchor] = true;
        split[far] = true;
    }

    let cuts: Vec<usize> = (0..n).filter(|&i| split[i]).collect();
    let segments = cuts.iter().enumerate()
        .map(|(j, &from)| {
            let to = cuts[(j + 1) % cuts.len()];
            let span = (to + n - from) % n;
            let full: SmallVec<[Coord<f64>; 4]> = (0..=span).map(|k| v[(from + k) % n]).collect();
            let chord = (1..span).all(|k| collapsed[(from + k) % n]);
            build(j as u32 + 1, full, chord)
        })
        .collect();

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::coord;

    fn config() -> SegmentConfig { SegmentConfig::default() }

    fn square(size: f64) -> Vec<Coord<f64>> {
        vec![
            coord! { x: 0.0, y: 0.0 },
            coord! { x: size, y: 0.0 },
            coord! { x: size, y: size },
            coord! { x: 0.0, y: size },
            coord! { x: 0.0, y: 0.0 },
        ]
    }

    /// Walk from the origin along `(heading_deg, length)` legs.
    fn walk(legs: &[(f64, f64)]) -> Vec<Coord<f64>> {
        let mut at = coord! { x: 0.0, y: 0.0 };
        let mut out = vec![at];
        for &(heading, length) in legs {
            let t = heading.to_radians();
            at = coord! { x: at.x + length * t.cos(), y: at.y + length * t.sin() };
            out.push(at);
        }
        out
    }

    /// A lot whose bottom edge bends left through four 6-degree turns,
    /// closed by a tall box.
    fn make_test_bend() -> Vec<Coord<f64>> {
        let mut ring = walk(&[(0.0, 40.0), (6.0, 10.0), (12.0, 10.0), (18.0, 10.0), (24.0, 10.0), (24.0, 40.0)]);
        let last = ring[ring.len() - 1];
        ring.push(coord! { x: last.x, y: 200.0 });
        ring.push(coord! { x: 0.0, y: 200.0 });
        ring
    }

    #[test]
    fn test_square_has_four_chords() {
        let segments = segment_ring(ParcelId(1), &square(100.0), &config()).unwrap();
        assert_eq!(segments.len(), 4);
        for (i, s) in segments.iter().enumerate() {
            assert_eq!(s.key, SegmentKey::new(ParcelId(1), i as u32 + 1));
            assert_eq!(s.vertices.len(), 2);
            assert_relative_eq!(s.length(), 100.0);
            assert!(!s.curved);
        }
        assert_eq!(segments[0].start(), coord! { x: 0.0, y: 0.0 });
        assert_eq!(segments[0].end(), coord! { x: 100.0, y: 0.0 });
    }

    #[test]
    fn test_collinear_vertices_do_not_split() {
        let ring = [
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 25.0, y: 0.0 },
            coord! { x: 60.0, y: 0.0 },
            coord! { x: 100.0, y: 0.0 },
            coord! { x: 100.0, y: 50.0 },
            coord! { x: 100.0, y: 50.0 },
            coord! { x: 40.0, y: 50.0 },
            coord! { x: 0.0, y: 50.0 },
            coord! { x: 0.0, y: 20.0 },
        ];
        let segments = segment_ring(ParcelId(7), &ring, &config()).unwrap();
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0].vertices.len(), 4);
        let perimeter: f64 = segments.iter().map(|s| s.length()).sum();
        assert_relative_eq!(perimeter, 300.0, epsilon = 1e-9);
    }

    #[test]
    fn test_two_vertex_ring_yields_one_segment_per_edge() {
        let ring = [coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 0.0 }];
        let segments = segment_ring(ParcelId(2), &ring, &config()).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].end(), segments[1].start());
        assert_eq!(segments[1].end(), segments[0].start());
    }

    #[test]
    fn test_degenerate_rings_are_rejected() {
        let empty: [Coord<f64>; 0] = [];
        assert_eq!(
            segment_ring(ParcelId(3), &empty, &config()),
            Err(GeometryError::DegenerateRing { parcel: ParcelId(3), vertices: 0 }),
        );
        let point = [coord! { x: 1.0, y: 1.0 }; 3];
        assert_eq!(
            segment_ring(ParcelId(3), &point, &config()),
            Err(GeometryError::DegenerateRing { parcel: ParcelId(3), vertices: 1 }),
        );
    }

    #[test]
    fn test_non_finite_is_rejected() {
        let mut ring = square(10.0);
        ring[2].x = f64::NAN;
        assert_eq!(
            segment_ring(ParcelId(4), &ring, &config()),
            Err(GeometryError::NonFinite { parcel: ParcelId(4) }),
        );
    }

    #[test]
    fn test_single_gentle_vertex_splits_once() {
        // Bottom edge bends 10 degrees halfway along.
        let mut ring = walk(&[(0.0, 50.0), (10.0, 50.0)]);
        let last = ring[2];
        ring.push(coord! { x: last.x, y: 100.0 });
        ring.push(coord! { x: 0.0, y: 100.0 });
        let segments = segment_ring(ParcelId(5), &ring, &config()).unwrap();
        assert_eq!(segments.len(), 5);
    }

    #[test]
    fn test_long_gentle_run_gets_middle_split() {
        let segments = segment_ring(ParcelId(6), &make_test_bend(), &config()).unwrap();
        // Corners at v0, v6, v7, v8; run v1..v4 split at v1, v3, v4.
        assert_eq!(segments.len(), 7);
        let bend = &segments[1];
        assert_eq!(bend.vertices.len(), 2, "interior of the run collapses to a chord");
        let tail = &segments[3];
        assert_eq!(tail.vertices.len(), 3, "straight vertex after the run is kept");
    }

    #[test]
    fn test_zigzag_jitter_does_not_split() {
        let mut ring = walk(&[(0.0, 30.0), (8.0, 10.0), (0.0, 30.0)]);
        let last = ring[3];
        ring.push(coord! { x: last.x, y: 60.0 });
        ring.push(coord! { x: 0.0, y: 60.0 });
        let segments = segment_ring(ParcelId(8), &ring, &config()).unwrap();
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0].vertices.len(), 4);
    }

    #[test]
    fn test_triangle_falls_back_to_corners() {
        let ring = [coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 0.0 }, coord! { x: 0.0, y: 10.0 }];
        let segments = segment_ring(ParcelId(9), &ring, &config()).unwrap();
        assert_eq!(segments.len(), 3);
    }

    #[test]
    fn test_smooth_ring_still_has_two_segments() {
        // 36-gon: every vertex turns 10 degrees, so no vertex is a corner.
        let ring: Vec<_> = (0..36)
            .map(|k| {
                let t = (k as f64 * 10.0).to_radians();
                coord! { x: 20.0 * t.cos(), y: 20.0 * t.sin() }
            })
            .collect();
        let segments = segment_ring(ParcelId(10), &ring, &config()).unwrap();
        assert_eq!(segments.len(), 2);
        assert!(segments.iter().all(|s| s.curved));
    }

    #[test]
    fn test_segmentation_is_deterministic() {
        let ring = make_test_bend();
        let a = segment_ring(ParcelId(11), &ring, &config()).unwrap();
        let b = segment_ring(ParcelId(11), &ring, &config()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_resegmenting_chords_is_stable() {
        let first = segment_ring(ParcelId(12), &square(40.0), &config()).unwrap();
        let ring: Vec<_> = first.iter().map(|s| s.start()).collect();
        let second = segment_ring(ParcelId(12), &ring, &config()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_equal_scores_pick_lowest_coordinate() {
        let ring = [
            coord! { x: 5.0, y: 5.0 },
            coord! { x: 1.0, y: 9.0 },
            coord! { x: 1.0, y: 2.0 },
            coord! { x: 7.0, y: 0.0 },
        ];
        for shift in 0..ring.len() {
            let mut rotated = ring.to_vec();
            rotated.rotate_left(shift);
            let picked = best_vertex(&rotated, |_| 1.0);
            assert_eq!(rotated[picked], coord! { x: 1.0, y: 2.0 }, "shift {shift}");
        }
        // A strictly higher score still wins.
        assert_eq!(best_vertex(&ring, |i| if i == 3 { 2.0 } else { 1.0 }), 3);
    }

    #[test]
    fn test_rotation_invariance() {
        let ring = make_test_bend();
        let base = segment_ring(ParcelId(13), &ring, &config()).unwrap();
        let mut expected: Vec<_> = base.iter().map(|s| s.vertices.to_vec()).collect();
        expected.sort_by(|a, b| a[0].x.total_cmp(&b[0].x).then(a[0].y.total_cmp(&b[0].y)));

        for shift in 1..ring.len() {
            let mut rotated = ring.clone();
            rotated.rotate_left(shift);
            let segments = segment_ring(ParcelId(13), &rotated, &config()).unwrap();
            let mut got: Vec<_> = segments.iter().map(|s| s.vertices.to_vec()).collect();
            got.sort_by(|a, b| a[0].x.total_cmp(&b[0].x).then(a[0].y.total_cmp(&b[0].y)));
            assert_eq!(got, expected, "shift {shift}");
        }
    }
}
