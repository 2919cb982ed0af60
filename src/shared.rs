//! Shared-boundary detection.
//!
//! Runs in two phases. Discovery looks at one parcel at a time and proposes
//! every (own segment, neighbour segment) pair that is coincident along enough
//! of its length; it only reads the segment set, so parcels can be processed
//! in parallel. Resolution then merges all proposals keyed by composite key.
//! Every segment with at least one qualifying proposal is shared, and its
//! counterpart is chosen from its own proposals alone, so the outcome does not
//! depend on the order in which parcels were visited.

use ahash::AHashMap;
use log::{debug, warn};
use rayon::prelude::*;

use planar::polyline_overlap;

use crate::config::SharedConfig;
use crate::segment::SegmentSet;
use crate::types::{BoundarySegment, ParcelId, SegmentKey};

/// A qualifying coincident pair. `a < b` by composite key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SharedCandidate {
    pub a: SegmentKey,
    pub b: SegmentKey,
    /// Coincident length, the smaller of the two directional overlaps.
    pub overlap: f64,
}

/// Outcome of resolving candidates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SharedResolution {
    /// Every qualifying pair, `a < b`, in key order.
    pub pairs: Vec<(SegmentKey, SegmentKey)>,
    /// Each shared segment and its chosen counterpart, in key order.
    pub counterparts: Vec<(SegmentKey, SegmentKey)>,
    /// Segments that had more than one qualifying counterpart.
    pub tie_breaks: usize,
}

/// Coincident length of two segments, independent of argument order.
pub fn pair_overlap(a: &BoundarySegment, b: &BoundarySegment, epsilon: f64) -> f64 {
    let (a, b) = if a.key <= b.key { (a, b) } else { (b, a) };
    polyline_overlap(&a.vertices, &b.vertices, epsilon)
        .min(polyline_overlap(&b.vertices, &a.vertices, epsilon))
}

/// Qualifying counterparts for every segment of `parcel`.
pub fn discover(parcel: ParcelId, segments: &SegmentSet, config: &SharedConfig) -> Vec<SharedCandidate> {
    let mut found = Vec::new();
    for own in segments.of_parcel(parcel) {
        let own_len = own.length();
        for other in segments.within(own.bounds(), config.epsilon) {
            if other.key.parcel == parcel { continue }

            let shorter = own_len.min(other.length());
            if shorter <= 0.0 { continue }

            let overlap = pair_overlap(own, other, config.epsilon);
            if overlap / shorter >= config.min_overlap_fraction {
                let (a, b) = if own.key < other.key { (own.key, other.key) } else { (other.key, own.key) };
                found.push(SharedCandidate { a, b, overlap });
            }
        }
    }
    found
}

/// Merge candidates from all parcels.
///
/// A segment's counterpart is its longest overlap among its own candidates,
/// with equal lengths falling to the lowest key. Counterparts need not be
/// mutual: a long edge facing two short neighbours is shared with both, and
/// each of them points back at it.
pub fn resolve(mut candidates: Vec<SharedCandidate>) -> SharedResolution {
    candidates.sort_by(|x, y| (x.a, x.b).cmp(&(y.a, y.b)));
    candidates.dedup_by(|x, y| x.a == y.a && x.b == y.b);

    // segment -> (candidate count, best overlap, best counterpart)
    let mut best: AHashMap<SegmentKey, (usize, f64, SegmentKey)> = AHashMap::new();
    for c in &candidates {
        for (own, other) in [(c.a, c.b), (c.b, c.a)] {
            best.entry(own)
                .and_modify(|(count, overlap, counterpart)| {
                    *count += 1;
                    if c.overlap > *overlap || (c.overlap == *overlap && other < *counterpart) {
                        (*overlap, *counterpart) = (c.overlap, other);
                    }
                })
                .or_insert((1, c.overlap, other));
        }
    }

    let mut chosen: Vec<(SegmentKey, usize, SegmentKey)> = best
        .into_iter()
        .map(|(key, (count, _, counterpart))| (key, count, counterpart))
        .collect();
    chosen.sort_by_key(|(key, _, _)| *key);

    let mut tie_breaks = 0;
    for (key, count, counterpart) in &chosen {
        if *count > 1 {
            tie_breaks += 1;
            warn!("[shared] segment {key} has {count} coincident candidates; counterpart is {counterpart}");
        }
    }

    SharedResolution {
        pairs: candidates.iter().map(|c| (c.a, c.b)).collect(),
        counterparts: chosen.into_iter().map(|(key, _, counterpart)| (key, counterpart)).collect(),
        tie_breaks,
    }
}

/// Flag every segment coincident with one from a different parcel as shared.
pub fn detect_shared(segments: &mut SegmentSet, parcels: &[ParcelId], config: &SharedConfig) -> SharedResolution {
    let view: &SegmentSet = segments;
    let candidates: Vec<SharedCandidate> = parcels
        .par_iter()
        .flat_map_iter(|&parcel| discover(parcel, view, config))
        .collect();
    debug!("[shared] {} candidate pairs before resolution", candidates.len());

    let resolution = resolve(candidates);
    for &(key, counterpart) in &resolution.counterparts {
        if let Some(segment) = segments.get_mut(key) {
            segment.shared = true;
            segment.counterpart = Some(counterpart);
        }
    }
    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::segment_ring;
    use crate::config::SegmentConfig;
    use geo::{coord, Coord};
    use smallvec::SmallVec;

    fn key(parcel: u64, seq: u32) -> SegmentKey { SegmentKey::new(ParcelId(parcel), seq) }

    fn seg(parcel: u64, seq: u32, pts: &[(f64, f64)]) -> BoundarySegment {
        let vertices: SmallVec<[Coord<f64>; 4]> = pts.iter().map(|&(x, y)| coord! { x: x, y: y }).collect();
        BoundarySegment::new(key(parcel, seq), vertices, false)
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Coord<f64>> {
        vec![
            coord! { x: x0, y: y0 },
            coord! { x: x1, y: y0 },
            coord! { x: x1, y: y1 },
            coord! { x: x0, y: y1 },
        ]
    }

    /// Two lots side by side sharing x = 50, plus a detached lot.
    fn make_test_block() -> SegmentSet {
        let config = SegmentConfig::default();
        let mut all = Vec::new();
        all.extend(segment_ring(ParcelId(1), &rect(0.0, 0.0, 50.0, 30.0), &config).unwrap());
        all.extend(segment_ring(ParcelId(2), &rect(50.0, 0.0, 100.0, 30.0), &config).unwrap());
        all.extend(segment_ring(ParcelId(3), &rect(0.0, 60.0, 40.0, 90.0), &config).unwrap());
        SegmentSet::new(all)
    }

    #[test]
    fn test_adjacent_lots_share_one_edge() {
        let mut set = make_test_block();
        let resolution = detect_shared(&mut set, &[ParcelId(1), ParcelId(2), ParcelId(3)], &SharedConfig::default());
        // Parcel 1's right edge is seq 2; parcel 2's left edge is seq 4.
        assert_eq!(resolution.pairs, vec![(key(1, 2), key(2, 4))]);
        assert_eq!(resolution.tie_breaks, 0);
        assert_eq!(set.get(key(1, 2)).unwrap().counterpart, Some(key(2, 4)));
        assert_eq!(set.get(key(2, 4)).unwrap().counterpart, Some(key(1, 2)));
        assert_eq!(set.iter().filter(|s| s.shared).count(), 2);
        assert!(set.of_parcel(ParcelId(3)).iter().all(|s| !s.shared));
    }

    #[test]
    fn test_shared_is_symmetric() {
        let set = make_test_block();
        let config = SharedConfig::default();
        let from_one = discover(ParcelId(1), &set, &config);
        let from_two = discover(ParcelId(2), &set, &config);
        assert_eq!(from_one, from_two);
    }

    #[test]
    fn test_pair_overlap_argument_order() {
        let a = seg(1, 1, &[(0.0, 0.0), (10.0, 0.0)]);
        let b = seg(2, 1, &[(10.0, 0.3), (2.0, 0.1)]);
        assert_eq!(pair_overlap(&a, &b, 0.5), pair_overlap(&b, &a, 0.5));
    }

    #[test]
    fn test_short_overlap_does_not_qualify() {
        // 10-unit edges touching along only 5 units.
        let set = SegmentSet::new(vec![
            seg(1, 1, &[(0.0, 0.0), (10.0, 0.0)]),
            seg(2, 1, &[(15.0, 0.0), (5.0, 0.0)]),
        ]);
        assert!(discover(ParcelId(1), &set, &SharedConfig::default()).is_empty());
    }

    #[test]
    fn test_same_parcel_never_matches() {
        let set = SegmentSet::new(vec![
            seg(1, 1, &[(0.0, 0.0), (10.0, 0.0)]),
            seg(1, 2, &[(10.0, 0.0), (0.0, 0.0)]),
        ]);
        assert!(discover(ParcelId(1), &set, &SharedConfig::default()).is_empty());
    }

    #[test]
    fn test_tie_break_prefers_longest_then_lowest_key() {
        // 1-1 has three candidates; 5-1 sees 3-1 and 4-1 with equal overlap.
        let candidates = vec![
            SharedCandidate { a: key(1, 1), b: key(3, 1), overlap: 9.0 },
            SharedCandidate { a: key(1, 1), b: key(2, 1), overlap: 10.0 },
            SharedCandidate { a: key(1, 1), b: key(4, 1), overlap: 9.0 },
            SharedCandidate { a: key(3, 1), b: key(5, 1), overlap: 9.0 },
            SharedCandidate { a: key(4, 1), b: key(5, 1), overlap: 9.0 },
        ];
        let resolution = resolve(candidates);
        assert_eq!(resolution.pairs.len(), 5);
        assert_eq!(resolution.counterparts, vec![
            (key(1, 1), key(2, 1)),
            (key(2, 1), key(1, 1)),
            (key(3, 1), key(1, 1)),
            (key(4, 1), key(1, 1)),
            (key(5, 1), key(3, 1)),
        ]);
        assert_eq!(resolution.tie_breaks, 4);
    }

    #[test]
    fn test_resolution_ignores_candidate_order() {
        let mut candidates = vec![
            SharedCandidate { a: key(1, 1), b: key(2, 1), overlap: 7.0 },
            SharedCandidate { a: key(1, 1), b: key(3, 1), overlap: 7.0 },
            SharedCandidate { a: key(2, 1), b: key(3, 1), overlap: 8.0 },
        ];
        let forward = resolve(candidates.clone());
        candidates.reverse();
        assert_eq!(resolve(candidates), forward);
        // Nobody is left unshared even though 1-1 loses both of its neighbours.
        assert_eq!(forward.counterparts, vec![
            (key(1, 1), key(2, 1)),
            (key(2, 1), key(3, 1)),
            (key(3, 1), key(2, 1)),
        ]);
    }

    #[test]
    fn test_long_edge_over_two_short_lots_is_shared_on_both_sides() {
        // Lot 1 sits across the top of lots 2 and 3; its bottom edge runs the full width.
        let config = SegmentConfig::default();
        let top = vec![
            coord! { x: 0.0, y: 50.0 },
            coord! { x: 50.0, y: 50.0 },
            coord! { x: 100.0, y: 50.0 },
            coord! { x: 100.0, y: 100.0 },
            coord! { x: 0.0, y: 100.0 },
        ];
        let mut all = Vec::new();
        all.extend(segment_ring(ParcelId(1), &top, &config).unwrap());
        all.extend(segment_ring(ParcelId(2), &rect(0.0, 0.0, 50.0, 50.0), &config).unwrap());
        all.extend(segment_ring(ParcelId(3), &rect(50.0, 0.0, 100.0, 50.0), &config).unwrap());
        let mut set = SegmentSet::new(all);

        let resolution = detect_shared(&mut set, &[ParcelId(1), ParcelId(2), ParcelId(3)], &SharedConfig::default());
        assert_eq!(resolution.tie_breaks, 1);

        let bottom = set.get(key(1, 1)).unwrap();
        assert!(bottom.shared);
        assert_eq!(bottom.counterpart, Some(key(2, 3)));
        for tops in [key(2, 3), key(3, 3)] {
            let s = set.get(tops).unwrap();
            assert!(s.shared, "{tops} should be shared");
            assert_eq!(s.counterpart, Some(key(1, 1)));
        }
        // The party wall between lots 2 and 3 is unaffected.
        assert_eq!(set.get(key(2, 2)).unwrap().counterpart, Some(key(3, 4)));
        assert_eq!(set.get(key(3, 4)).unwrap().counterpart, Some(key(2, 2)));
    }
}
