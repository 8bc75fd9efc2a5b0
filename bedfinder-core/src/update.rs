//! Validation and derivation for dashboard availability edits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BedFinderError, ValidationReason};
use crate::model::{
    AmbulanceCounts, BedAvailability, BedCounts, ChangeAction, HistoricalLog, HospitalId,
    ResourceCategory,
};

/// Raw numbers typed by an operator. Signed so that bad input can be reported.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EditedCounts {
    pub total: i64,
    pub available: i64,
}

impl EditedCounts {
    pub fn new(total: i64, available: i64) -> Self {
        Self { total, available }
    }

    fn validate(self, category: ResourceCategory) -> Result<(u32, u32), BedFinderError> {
        let reject = |reason| BedFinderError::Validation { category, reason };

        if self.total < 0 {
            return Err(reject(ValidationReason::NegativeTotal { total: self.total }));
        }
        if self.available < 0 {
            return Err(reject(ValidationReason::NegativeAvailable {
                available: self.available,
            }));
        }
        if self.available > self.total {
            return Err(reject(ValidationReason::AvailableExceedsTotal {
                available: self.available,
                total: self.total,
            }));
        }
        let total = u32::try_from(self.total)
            .map_err(|_| reject(ValidationReason::ExceedsLimit { value: self.total }))?;
        let available = u32::try_from(self.available)
            .map_err(|_| reject(ValidationReason::ExceedsLimit { value: self.available }))?;
        Ok((total, available))
    }
}

/// A full dashboard form: every category must be supplied.
///
/// Occupied and on-duty figures are not part of the form; they are always derived.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailabilityEdit {
    pub icu_beds: EditedCounts,
    pub general_beds: EditedCounts,
    pub oxygen_beds: EditedCounts,
    pub ventilators: EditedCounts,
    pub ambulances: EditedCounts,
}

impl AvailabilityEdit {
    /// Pre-fill the form with the current snapshot.
    pub fn from_snapshot(snapshot: &BedAvailability) -> Self {
        let mut edit = Self::default();
        for category in ResourceCategory::ALL {
            let counts = snapshot.counts(category);
            *edit.get_mut(category) =
                EditedCounts::new(counts.total.into(), counts.available.into());
        }
        edit
    }

    pub fn get(&self, category: ResourceCategory) -> EditedCounts {
        match category {
            ResourceCategory::IcuBeds => self.icu_beds,
            ResourceCategory::GeneralBeds => self.general_beds,
            ResourceCategory::OxygenBeds => self.oxygen_beds,
            ResourceCategory::Ventilators => self.ventilators,
            ResourceCategory::Ambulances => self.ambulances,
        }
    }

    pub fn get_mut(&mut self, category: ResourceCategory) -> &mut EditedCounts {
        match category {
            ResourceCategory::IcuBeds => &mut self.icu_beds,
            ResourceCategory::GeneralBeds => &mut self.general_beds,
            ResourceCategory::OxygenBeds => &mut self.oxygen_beds,
            ResourceCategory::Ventilators => &mut self.ventilators,
            ResourceCategory::Ambulances => &mut self.ambulances,
        }
    }

    pub fn with(mut self, category: ResourceCategory, counts: EditedCounts) -> Self {
        *self.get_mut(category) = counts;
        self
    }

    /// Check every category; the first offending one is reported.
    pub fn validate(&self) -> Result<(), BedFinderError> {
        for category in ResourceCategory::ALL {
            self.get(category).validate(category)?;
        }
        Ok(())
    }
}

/// Turn an edit into the next snapshot, or reject it without touching anything.
///
/// The snapshot id is kept across writes so that a hospital keeps one record.
pub fn apply_edit(
    previous: Option<&BedAvailability>,
    hospital_id: &HospitalId,
    edit: &AvailabilityEdit,
    updated_by: &str,
    now: DateTime<Utc>,
) -> Result<BedAvailability, BedFinderError> {
    let bed = |category: ResourceCategory| -> Result<BedCounts, BedFinderError> {
        let (total, available) = edit.get(category).validate(category)?;
        Ok(BedCounts::derive(total, available))
    };

    let icu_beds = bed(ResourceCategory::IcuBeds)?;
    let general_beds = bed(ResourceCategory::GeneralBeds)?;
    let oxygen_beds = bed(ResourceCategory::OxygenBeds)?;
    let ventilators = bed(ResourceCategory::Ventilators)?;
    let (total, available) = edit
        .ambulances
        .validate(ResourceCategory::Ambulances)?;
    let ambulances = AmbulanceCounts::derive(total, available);

    let id = previous
        .map(|snapshot| snapshot.id.clone())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    Ok(BedAvailability {
        id,
        hospital_id: hospital_id.clone(),
        icu_beds,
        general_beds,
        oxygen_beds,
        ventilators,
        ambulances,
        last_updated: now,
        updated_by: updated_by.to_string(),
    })
}

/// Audit entries for the categories that changed between two snapshots.
///
/// A changed `available` count is logged as an increase or decrease of that count.
/// A category whose capacity changed while `available` stayed put is logged as an
/// `update` of the total. A first write is compared against zero.
pub fn history_entries(
    previous: Option<&BedAvailability>,
    next: &BedAvailability,
) -> Vec<HistoricalLog> {
    ResourceCategory::ALL
        .into_iter()
        .filter_map(|category| {
            let before = previous.map(|snapshot| snapshot.counts(category)).unwrap_or_default();
            let after = next.counts(category);

            let (previous_value, new_value) = if before.available != after.available {
                (before.available, after.available)
            } else if before.total != after.total {
                (before.total, after.total)
            } else {
                return None;
            };

            let action = if before.available != after.available {
                ChangeAction::classify(previous_value, new_value)
            } else {
                ChangeAction::Update
            };

            Some(HistoricalLog {
                hospital_id: next.hospital_id.clone(),
                resource_type: category,
                previous_value,
                new_value,
                updated_by: next.updated_by.clone(),
                action,
                timestamp: next.last_updated,
            })
        })
        .collect()
}
