use serde::Serialize;

use crate::wide::SetbackRecord;

/// Why a building is left out of the averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Exclusion {
    ZeroDistance,
    CapacityExceeded,
    PartialOrUnowned,
}

impl Exclusion {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ZeroDistance => "zero_distance",
            Self::CapacityExceeded => "capacity_exceeded",
            Self::PartialOrUnowned => "partial_or_unowned",
        }
    }
}

/// Every exclusion rule a record trips, in a fixed order.
pub fn exclusions(record: &SetbackRecord) -> Vec<Exclusion> {
    let mut reasons = Vec::new();
    if record.zero_contact || record.distances().any(|d| d == 0.0) { reasons.push(Exclusion::ZeroDistance) }
    if record.capacity_exceeded { reasons.push(Exclusion::CapacityExceeded) }
    if record.partial_or_unowned { reasons.push(Exclusion::PartialOrUnowned) }
    reasons
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CategoryStats {
    pub count: usize,
    pub sum: f64,
}

impl CategoryStats {
    fn add(&mut self, distance: f64) {
        self.count += 1;
        self.sum += distance;
    }

    /// `None` when nothing was counted.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ExclusionCounts {
    pub zero_distance: usize,
    pub capacity_exceeded: usize,
    pub partial_or_unowned: usize,
}

/// Summary statistics over the buildings that pass every exclusion rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateResult {
    pub facing_street: CategoryStats,
    pub other_side: CategoryStats,
    pub overall: CategoryStats,
    pub included: usize,
    pub excluded: usize,
    /// A building tripping several rules counts once under each.
    pub exclusions: ExclusionCounts,
}

impl AggregateResult {
    /// Rows of the aggregate table, in output order.
    pub fn rows(&self) -> [(&'static str, &CategoryStats); 3] {
        [
            ("facing_street", &self.facing_street),
            ("other_side", &self.other_side),
            ("overall", &self.overall),
        ]
    }
}

/// Apply the exclusion rules and total the surviving distances.
///
/// Tracks are averaged independently, so a building with only a facing
/// track contributes to the facing and overall rows only.
pub fn aggregate(records: &[SetbackRecord]) -> AggregateResult {
    let mut result = AggregateResult::default();
    for record in records {
        let reasons = exclusions(record);
        if !reasons.is_empty() {
            result.excluded += 1;
            for reason in reasons {
                match reason {
                    Exclusion::ZeroDistance => result.exclusions.zero_distance += 1,
                    Exclusion::CapacityExceeded => result.exclusions.capacity_exceeded += 1,
                    Exclusion::PartialOrUnowned => result.exclusions.partial_or_unowned += 1,
                }
            }
            continue;
        }

        result.included += 1;
        for slot in &record.facing {
            result.facing_street.add(slot.distance);
            result.overall.add(slot.distance);
        }
        for slot in &record.other {
            result.other_side.add(slot.distance);
            result.overall.add(slot.distance);
        }
    }
    result
}
