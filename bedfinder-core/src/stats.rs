use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::{AvailabilityMap, CategoryCounts, HospitalProfile, ResourceCategory};

/// Capacity summary for one resource category.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct CategoryStats {
    pub total_capacity: u64,
    pub total_available: u64,
    pub percent_available: f64,
}

impl CategoryStats {
    fn add(&mut self, counts: CategoryCounts) {
        self.total_capacity += u64::from(counts.total);
        self.total_available += u64::from(counts.available);
    }

    fn finish(mut self) -> Self {
        self.percent_available = if self.total_capacity == 0 {
            0.0
        } else {
            self.total_available as f64 / self.total_capacity as f64 * 100.0
        };
        self
    }
}

/// Totals shown on the statistics panel.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Stats {
    pub icu_beds: CategoryStats,
    pub general_beds: CategoryStats,
    pub oxygen_beds: CategoryStats,
    pub ventilators: CategoryStats,
    pub ambulances: CategoryStats,
    pub total_hospitals: usize,
    pub verified_hospitals: usize,
    /// Hospitals that contributed a snapshot to the capacity sums.
    pub reporting_hospitals: usize,
}

impl Stats {
    pub fn category(&self, category: ResourceCategory) -> &CategoryStats {
        match category {
            ResourceCategory::IcuBeds => &self.icu_beds,
            ResourceCategory::GeneralBeds => &self.general_beds,
            ResourceCategory::OxygenBeds => &self.oxygen_beds,
            ResourceCategory::Ventilators => &self.ventilators,
            ResourceCategory::Ambulances => &self.ambulances,
        }
    }

    fn category_mut(&mut self, category: ResourceCategory) -> &mut CategoryStats {
        match category {
            ResourceCategory::IcuBeds => &mut self.icu_beds,
            ResourceCategory::GeneralBeds => &mut self.general_beds,
            ResourceCategory::OxygenBeds => &mut self.oxygen_beds,
            ResourceCategory::Ventilators => &mut self.ventilators,
            ResourceCategory::Ambulances => &mut self.ambulances,
        }
    }
}

/// Reduce hospitals and snapshots to panel totals.
///
/// Only hospitals that appear in both inputs add to capacity; snapshots for
/// hospitals missing from `hospitals` are ignored. A hospital listed twice is
/// counted once.
pub fn summarize(hospitals: &[HospitalProfile], availability: &AvailabilityMap) -> Stats {
    let mut stats = Stats::default();
    let mut seen = HashSet::new();

    for hospital in hospitals {
        if !seen.insert(&hospital.id) {
            continue;
        }
        stats.total_hospitals += 1;
        if hospital.is_verified {
            stats.verified_hospitals += 1;
        }
        let Some(snapshot) = availability.get(&hospital.id) else {
            continue;
        };
        stats.reporting_hospitals += 1;
        for category in ResourceCategory::ALL {
            stats.category_mut(category).add(snapshot.counts(category));
        }
    }

    for category in ResourceCategory::ALL {
        let finished = stats.category(category).finish();
        *stats.category_mut(category) = finished;
    }
    stats
}
