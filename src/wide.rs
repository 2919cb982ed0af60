use crate::ranker::NeighborRecord;
use crate::types::{BoundarySegment, Building, BuildingId, ParcelId, SegmentClass, SegmentKey};

/// One populated slot of a track.
#[derive(Debug, Clone, PartialEq)]
pub struct SideSlot {
    pub segment: SegmentKey,
    pub distance: f64,
    /// Street fronted by the segment; facing-street track only.
    pub street: Option<String>,
}

/// Fixed-width setback row for one building.
///
/// Each track holds at most `max_side_fields` slots ordered by distance then
/// key; slots beyond the populated ones are written as nulls.
#[derive(Debug, Clone, PartialEq)]
pub struct SetbackRecord {
    pub building: BuildingId,
    pub parcel: Option<ParcelId>,
    pub partial_or_unowned: bool,
    pub facing: Vec<SideSlot>,
    pub other: Vec<SideSlot>,
    /// Track sizes before capping.
    pub facing_raw: usize,
    pub other_raw: usize,
    pub capacity_exceeded: bool,
    /// Some ranked segment touches or crosses the footprint, whether or not
    /// it landed in a track.
    pub zero_contact: bool,
}

impl SetbackRecord {
    /// A record with both tracks empty.
    pub fn empty(building: &Building) -> Self {
        Self {
            building: building.id,
            parcel: building.parcel,
            partial_or_unowned: building.partial_or_unowned,
            facing: Vec::new(),
            other: Vec::new(),
            facing_raw: 0,
            other_raw: 0,
            capacity_exceeded: false,
            zero_contact: false,
        }
    }

    /// Every populated distance, facing track first.
    pub fn distances(&self) -> impl Iterator<Item = f64> + '_ {
        self.facing.iter().chain(&self.other).map(|slot| slot.distance)
    }
}

fn fill(mut track: Vec<SideSlot>, max_side_fields: usize) -> (Vec<SideSlot>, usize) {
    track.sort_by(|x, y| x.distance.total_cmp(&y.distance).then(x.segment.cmp(&y.segment)));
    track.dedup_by_key(|slot| slot.segment);
    let raw = track.len();
    track.truncate(max_side_fields);
    (track, raw)
}

/// Reshape one building's ranked neighbours into a setback row.
///
/// `sides` must be the classified segments the records refer to, sorted by
/// key (a parcel's own segments are). Records whose segment is neither shared
/// nor facing a street are left out of both tracks.
pub fn to_setback_record(
    building: &Building,
    records: &[NeighborRecord],
    sides: &[BoundarySegment],
    max_side_fields: usize,
) -> SetbackRecord {
    let mut facing = Vec::new();
    let mut other = Vec::new();
    let mut zero_contact = false;

    for record in records.iter().filter(|r| r.building == building.id) {
        zero_contact |= record.distance == 0.0;
        let Ok(i) = sides.binary_search_by_key(&record.segment, |s| s.key) else { continue };
        let side = &sides[i];
        match side.class() {
            SegmentClass::FacingStreet => facing.push(SideSlot {
                segment: record.segment,
                distance: record.distance,
                street: side.frontage.as_ref().and_then(|f| f.name.clone()),
            }),
            SegmentClass::OtherSide => other.push(SideSlot {
                segment: record.segment,
                distance: record.distance,
                street: None,
            }),
            SegmentClass::Unclassified => {}
        }
    }

    let (facing, facing_raw) = fill(facing, max_side_fields);
    let (other, other_raw) = fill(other, max_side_fields);

    SetbackRecord {
        facing,
        other,
        facing_raw,
        other_raw,
        capacity_exceeded: facing_raw > max_side_fields || other_raw > max_side_fields,
        zero_contact,
        ..SetbackRecord::empty(building)
    }
}
