use ahash::AHashMap;
use geo::{Contains, Intersects};
use log::{debug, warn};
use rayon::prelude::*;

use crate::geom::SpatialIndex;
use crate::types::{Building, Parcel, ParcelId};

/// How a footprint relates to the parcel layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ownership {
    /// Fully inside exactly one parcel.
    Contained(ParcelId),
    /// Overlaps exactly one parcel without being inside it.
    Partial(ParcelId),
    /// Overlaps several parcels, or none. Holds the intersected parcels, ascending.
    Unowned(Vec<ParcelId>),
}

impl Ownership {
    /// Apply to a building, setting owner and `partial_or_unowned`.
    pub fn apply(self, building: &mut Building) {
        (building.parcel, building.partial_or_unowned, building.straddles) = match self {
            Self::Contained(p) => (Some(p), false, Vec::new()),
            Self::Partial(p) => (Some(p), true, Vec::new()),
            Self::Unowned(touching) => (None, true, touching),
        };
    }
}

/// Parcels with an envelope index, for point-in-polygon style lookups.
#[derive(Debug)]
pub struct ParcelLookup<'a> {
    parcels: &'a [Parcel],
    by_id: AHashMap<ParcelId, usize>,
    index: SpatialIndex,
}

impl<'a> ParcelLookup<'a> {
    pub fn new(parcels: &'a [Parcel]) -> Self {
        Self {
            parcels,
            by_id: parcels.iter().enumerate().map(|(i, p)| (p.id, i)).collect(),
            index: SpatialIndex::new(parcels.iter().map(Parcel::bounds)),
        }
    }

    pub fn get(&self, id: ParcelId) -> Option<&'a Parcel> {
        self.by_id.get(&id).map(|&i| &self.parcels[i])
    }

    /// Parcels whose polygon intersects the footprint.
    fn touching(&self, building: &Building) -> Vec<&'a Parcel> {
        let Some(bounds) = building.bounds() else { return Vec::new() };
        let parcels = self.parcels;
        self.index.within(bounds, 0.0).into_iter()
            .map(|i| &parcels[i])
            .filter(|p| p.polygon.intersects(&building.footprint))
            .collect()
    }

    fn unowned(touching: &[&Parcel]) -> Ownership {
        let mut ids: Vec<ParcelId> = touching.iter().map(|p| p.id).collect();
        ids.sort();
        Ownership::Unowned(ids)
    }

    /// Relate a footprint to the parcel layer.
    pub fn locate(&self, building: &Building) -> Ownership {
        let touching = self.touching(building);
        if let Some(owner) = touching.iter().find(|p| p.polygon.contains(&building.footprint)) {
            return Ownership::Contained(owner.id);
        }
        match touching.as_slice() {
            [only] => Ownership::Partial(only.id),
            _ => Self::unowned(&touching),
        }
    }

    /// Check an owner supplied with the input against the parcel geometry.
    pub fn verify(&self, building: &Building, owner: ParcelId) -> Ownership {
        match self.get(owner) {
            Some(p) if p.polygon.contains(&building.footprint) => Ownership::Contained(owner),
            Some(p) if p.polygon.intersects(&building.footprint) => Ownership::Partial(owner),
            Some(_) => Self::unowned(&self.touching(building)),
            None => {
                warn!("[ownership] building {} names unknown parcel {owner}", building.id);
                Self::unowned(&self.touching(building))
            }
        }
    }
}

/// Resolve the owning parcel of every building.
///
/// Buildings that arrive with an owner are checked against that parcel;
/// the rest are located by containment. Returns the number of buildings left
/// partial or unowned.
pub fn resolve_owners(buildings: &mut [Building], parcels: &[Parcel]) -> usize {
    let lookup = ParcelLookup::new(parcels);
    buildings.par_iter_mut().for_each(|building| {
        let ownership = match building.parcel {
            Some(owner) => lookup.verify(building, owner),
            None => lookup.locate(building),
        };
        if !matches!(ownership, Ownership::Contained(_)) {
            debug!("[ownership] building {}: {ownership:?}", building.id);
        }
        ownership.apply(building);
    });

    let flagged = buildings.iter().filter(|b| b.partial_or_unowned).count();
    if flagged > 0 {
        warn!("[ownership] {flagged} of {} buildings are partial or unowned", buildings.len());
    }
    flagged
}
