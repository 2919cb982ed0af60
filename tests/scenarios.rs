use geo::{line_string, polygon, Polygon};

use parcel_setbacks::aggregate::Exclusion;
use parcel_setbacks::{
    run, Building, BuildingId, Config, Inputs, Parcel, ParcelId, SegmentKey, SetbackError, Street, StreetId,
};

fn square(x: f64, y: f64, w: f64, h: f64) -> Polygon<f64> {
    polygon![(x: x, y: y), (x: x + w, y: y), (x: x + w, y: y + h), (x: x, y: y + h), (x: x, y: y)]
}

fn street_below(y: f64) -> Street {
    Street::new(StreetId(1), Some("Main St".into()), line_string![(x: -50.0, y: y), (x: 250.0, y: y)])
}

/// Two 100 x 100 lots side by side along one street, a centred house on each.
fn make_test_block() -> Inputs {
    Inputs {
        parcels: vec![
            Parcel::new(ParcelId(1), square(0.0, 0.0, 100.0, 100.0)),
            Parcel::new(ParcelId(2), square(100.0, 0.0, 100.0, 100.0)),
        ],
        buildings: vec![
            Building::new(BuildingId(11), square(40.0, 40.0, 20.0, 20.0)),
            Building::new(BuildingId(12), square(140.0, 40.0, 20.0, 20.0)),
        ],
        streets: vec![street_below(-5.0)],
    }
}

#[test]
fn shared_lot_line_is_symmetric() {
    let output = run(make_test_block(), &Config::default()).unwrap();

    let shared: Vec<_> = output.segments.iter().filter(|s| s.shared).collect();
    assert_eq!(shared.len(), 2);
    for s in &shared {
        let other = output.segments.get(s.counterpart.unwrap()).unwrap();
        assert!(other.shared);
        assert_eq!(other.counterpart, Some(s.key));
        assert_ne!(other.key.parcel, s.key.parcel);
    }
    assert_eq!(output.summary.shared_segments, 2);
    assert_eq!(output.summary.tie_breaks, 0);
}

#[test]
fn each_house_gets_one_facing_and_one_other_side() {
    let output = run(make_test_block(), &Config::default()).unwrap();

    assert_eq!(output.setbacks.len(), 2);
    for row in &output.setbacks {
        assert!(!row.partial_or_unowned);
        assert_eq!(row.facing.len(), 1);
        assert_eq!(row.facing[0].distance, 40.0);
        assert_eq!(row.facing[0].street.as_deref(), Some("Main St"));
        assert_eq!(row.other.len(), 1);
        assert_eq!(row.other[0].distance, 40.0);
    }
    assert_eq!(output.setbacks[0].other[0].segment, SegmentKey::new(ParcelId(1), 2));
    assert_eq!(output.setbacks[1].other[0].segment, SegmentKey::new(ParcelId(2), 4));

    let agg = &output.aggregate;
    assert_eq!(agg.included, 2);
    assert_eq!(agg.facing_street.count, 2);
    assert_eq!(agg.other_side.mean(), Some(40.0));
    assert_eq!(agg.overall.count, 4);
}

#[test]
fn near_table_only_holds_owned_segments() {
    let output = run(make_test_block(), &Config::default()).unwrap();
    assert_eq!(output.near_table.len(), 8);
    for r in &output.near_table {
        let owner = output.setbacks.iter().find(|s| s.building == r.building).unwrap().parcel;
        assert_eq!(Some(r.segment.parcel), owner);
    }
}

#[test]
fn crossing_footprint_is_excluded_but_reported() {
    let inputs = Inputs {
        parcels: vec![Parcel::new(ParcelId(1), square(0.0, 0.0, 100.0, 100.0))],
        buildings: vec![
            Building::new(BuildingId(1), square(40.0, 40.0, 20.0, 20.0)),
            Building::new(BuildingId(2), square(40.0, -5.0, 20.0, 15.0)),
        ],
        streets: vec![street_below(-5.0)],
    };
    let output = run(inputs, &Config::default()).unwrap();

    let crossing = &output.setbacks[1];
    assert_eq!(crossing.building, BuildingId(2));
    assert_eq!(crossing.facing[0].distance, 0.0);
    assert!(crossing.partial_or_unowned);
    let reasons = parcel_setbacks::aggregate::exclusions(crossing);
    assert!(reasons.contains(&Exclusion::ZeroDistance));

    assert_eq!(output.aggregate.included, 1);
    assert_eq!(output.aggregate.excluded, 1);
    assert_eq!(output.aggregate.facing_street.mean(), Some(40.0));
}

#[test]
fn input_order_does_not_change_results() {
    let forward = run(make_test_block(), &Config::default()).unwrap();

    let mut reversed = make_test_block();
    reversed.parcels.reverse();
    reversed.buildings.reverse();
    let backward = run(reversed, &Config::default()).unwrap();

    assert_eq!(forward.segments.as_slice(), backward.segments.as_slice());
    assert_eq!(forward.near_table, backward.near_table);
    assert_eq!(forward.aggregate, backward.aggregate);
}

#[test]
fn run_needs_every_layer() {
    let mut inputs = make_test_block();
    inputs.streets.clear();
    let err = run(inputs, &Config::default()).unwrap_err();
    assert!(err.to_string().contains("streets"));
}

#[test]
fn long_rear_line_is_shared_with_both_lots_below() {
    // Lot 1 spans the rear of lots 2 and 3; its bottom edge passes through (50, 50).
    let inputs = Inputs {
        parcels: vec![
            Parcel::new(ParcelId(1), polygon![
                (x: 0.0, y: 50.0), (x: 50.0, y: 50.0), (x: 100.0, y: 50.0), (x: 100.0, y: 100.0), (x: 0.0, y: 100.0),
                (x: 0.0, y: 50.0),
            ]),
            Parcel::new(ParcelId(2), square(0.0, 0.0, 50.0, 50.0)),
            Parcel::new(ParcelId(3), square(50.0, 0.0, 50.0, 50.0)),
        ],
        buildings: vec![Building::new(BuildingId(31), square(65.0, 10.0, 20.0, 25.0))],
        streets: vec![street_below(-5.0)],
    };
    let output = run(inputs, &Config::default()).unwrap();

    let key = |p: u64, seq: u32| SegmentKey::new(ParcelId(p), seq);
    assert_eq!(output.segments.get(key(1, 1)).unwrap().counterpart, Some(key(2, 3)));
    assert_eq!(output.segments.get(key(2, 3)).unwrap().counterpart, Some(key(1, 1)));
    assert_eq!(output.segments.get(key(3, 3)).unwrap().counterpart, Some(key(1, 1)));
    assert_eq!(output.summary.tie_breaks, 1);

    let row = &output.setbacks[0];
    assert_eq!(row.parcel, Some(ParcelId(3)));
    assert_eq!(row.facing.len(), 1);
    assert_eq!(row.facing[0].distance, 10.0);
    let other: Vec<(SegmentKey, f64)> = row.other.iter().map(|s| (s.segment, s.distance)).collect();
    assert_eq!(other, vec![(key(3, 3), 15.0), (key(3, 4), 15.0)]);
}

#[test]
fn house_across_lot_line_is_measured_and_excluded() {
    let mut inputs = make_test_block();
    inputs.buildings.push(Building::new(BuildingId(13), square(90.0, 40.0, 20.0, 20.0)));
    let output = run(inputs, &Config::default()).unwrap();

    let row = &output.setbacks[2];
    assert_eq!(row.building, BuildingId(13));
    assert_eq!(row.parcel, None);
    assert!(row.partial_or_unowned);
    assert!(row.zero_contact);
    let zero: Vec<SegmentKey> = row.other.iter().filter(|s| s.distance == 0.0).map(|s| s.segment).collect();
    assert_eq!(zero, vec![SegmentKey::new(ParcelId(1), 2), SegmentKey::new(ParcelId(2), 4)]);

    let parcels: Vec<ParcelId> = output.near_table.iter()
        .filter(|r| r.building == BuildingId(13))
        .map(|r| r.segment.parcel)
        .collect();
    assert!(parcels.contains(&ParcelId(1)) && parcels.contains(&ParcelId(2)));

    let reasons = parcel_setbacks::aggregate::exclusions(row);
    assert_eq!(reasons, vec![Exclusion::ZeroDistance, Exclusion::PartialOrUnowned]);
    assert_eq!(output.aggregate.included, 2);
    assert_eq!(output.aggregate.exclusions.zero_distance, 1);
}

#[test]
fn repeated_parcel_id_is_an_error() {
    let mut inputs = make_test_block();
    inputs.parcels[1].id = ParcelId(1);
    let err = run(inputs, &Config::default()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SetbackError>(),
        Some(SetbackError::DuplicateId { id: 1, .. }),
    ));
}
