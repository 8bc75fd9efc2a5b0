//! Hospital profiles, availability snapshots and the audit trail.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BedFinderError;

/// Stable identifier of a hospital.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HospitalId(String);

impl HospitalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HospitalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HospitalId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for HospitalId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting anything outside lat [-90, 90] / lng [-180, 180].
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, BedFinderError> {
        let coordinate = Self {
            latitude,
            longitude,
        };
        coordinate.validate()?;
        Ok(coordinate)
    }

    pub fn validate(&self) -> Result<(), BedFinderError> {
        let lat_ok = self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude);
        let lng_ok = self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude);
        if lat_ok && lng_ok {
            Ok(())
        } else {
            Err(BedFinderError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

/// Identity and location of a facility.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HospitalProfile {
    pub id: HospitalId,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub pincode: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub registration_number: Option<String>,
    pub location: Coordinate,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub admin_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HospitalProfile {
    pub fn validate(&self) -> Result<(), BedFinderError> {
        if self.id.as_str().trim().is_empty() {
            return Err(BedFinderError::Parse(format!(
                "hospital '{}' has an empty id",
                self.name
            )));
        }
        self.location.validate()
    }
}

/// One of the five tracked resources.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceCategory {
    #[serde(rename = "icu")]
    IcuBeds,
    #[serde(rename = "general")]
    GeneralBeds,
    #[serde(rename = "oxygen")]
    OxygenBeds,
    #[serde(rename = "ventilator")]
    Ventilators,
    #[serde(rename = "ambulance")]
    Ambulances,
}

impl ResourceCategory {
    pub const ALL: [ResourceCategory; 5] = [
        ResourceCategory::IcuBeds,
        ResourceCategory::GeneralBeds,
        ResourceCategory::OxygenBeds,
        ResourceCategory::Ventilators,
        ResourceCategory::Ambulances,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::IcuBeds => "icu",
            Self::GeneralBeds => "general",
            Self::OxygenBeds => "oxygen",
            Self::Ventilators => "ventilator",
            Self::Ambulances => "ambulance",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::IcuBeds => "ICU Beds",
            Self::GeneralBeds => "General Beds",
            Self::OxygenBeds => "Oxygen Beds",
            Self::Ventilators => "Ventilators",
            Self::Ambulances => "Ambulances",
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceCategory {
    type Err = BedFinderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == value.trim().to_lowercase())
            .ok_or_else(|| BedFinderError::Parse(format!("unknown resource category '{value}'")))
    }
}

/// Counts for a bed or ventilator category.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BedCounts {
    pub total: u32,
    pub available: u32,
    pub occupied: u32,
}

impl BedCounts {
    /// Occupied is always derived, never taken from input.
    pub fn derive(total: u32, available: u32) -> Self {
        Self {
            total,
            available,
            occupied: total.saturating_sub(available),
        }
    }
}

/// Ambulance fleet counts; `on_duty` plays the role of `occupied`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AmbulanceCounts {
    pub total: u32,
    pub available: u32,
    pub on_duty: u32,
}

impl AmbulanceCounts {
    pub fn derive(total: u32, available: u32) -> Self {
        Self {
            total,
            available,
            on_duty: total.saturating_sub(available),
        }
    }
}

/// Uniform view over either count shape.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryCounts {
    pub total: u32,
    pub available: u32,
    pub in_use: u32,
}

impl From<BedCounts> for CategoryCounts {
    fn from(counts: BedCounts) -> Self {
        Self {
            total: counts.total,
            available: counts.available,
            in_use: counts.occupied,
        }
    }
}

impl From<AmbulanceCounts> for CategoryCounts {
    fn from(counts: AmbulanceCounts) -> Self {
        Self {
            total: counts.total,
            available: counts.available,
            in_use: counts.on_duty,
        }
    }
}

/// The single current availability record for a hospital ("latest wins").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BedAvailability {
    pub id: String,
    pub hospital_id: HospitalId,
    pub icu_beds: BedCounts,
    pub general_beds: BedCounts,
    pub oxygen_beds: BedCounts,
    pub ventilators: BedCounts,
    pub ambulances: AmbulanceCounts,
    pub last_updated: DateTime<Utc>,
    pub updated_by: String,
}

impl BedAvailability {
    /// Zero-everywhere snapshot seeded when a hospital registers.
    pub fn empty(hospital_id: HospitalId, updated_by: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            hospital_id,
            icu_beds: BedCounts::default(),
            general_beds: BedCounts::default(),
            oxygen_beds: BedCounts::default(),
            ventilators: BedCounts::default(),
            ambulances: AmbulanceCounts::default(),
            last_updated: Utc::now(),
            updated_by: updated_by.into(),
        }
    }

    pub fn counts(&self, category: ResourceCategory) -> CategoryCounts {
        match category {
            ResourceCategory::IcuBeds => self.icu_beds.into(),
            ResourceCategory::GeneralBeds => self.general_beds.into(),
            ResourceCategory::OxygenBeds => self.oxygen_beds.into(),
            ResourceCategory::Ventilators => self.ventilators.into(),
            ResourceCategory::Ambulances => self.ambulances.into(),
        }
    }

    pub fn available(&self, category: ResourceCategory) -> u32 {
        self.counts(category).available
    }

    pub fn has_any_available(&self) -> bool {
        ResourceCategory::ALL
            .into_iter()
            .any(|category| self.available(category) > 0)
    }

    /// Check `available <= total` and `in_use == total - available` for every category.
    pub fn check_invariants(&self) -> Result<(), BedFinderError> {
        use crate::error::ValidationReason;

        for category in ResourceCategory::ALL {
            let counts = self.counts(category);
            if counts.available > counts.total {
                return Err(BedFinderError::Validation {
                    category,
                    reason: ValidationReason::AvailableExceedsTotal {
                        available: counts.available.into(),
                        total: counts.total.into(),
                    },
                });
            }
            if counts.in_use != counts.total - counts.available {
                return Err(BedFinderError::Parse(format!(
                    "snapshot for {} has inconsistent {category} counts",
                    self.hospital_id
                )));
            }
        }
        Ok(())
    }
}

/// Hospital id -> current snapshot. Hospitals without a key have not reported yet.
pub type AvailabilityMap = HashMap<HospitalId, BedAvailability>;

/// Index snapshots by hospital, keeping the most recently updated one per key.
pub fn index_availability(snapshots: impl IntoIterator<Item = BedAvailability>) -> AvailabilityMap {
    let mut map = AvailabilityMap::new();
    for snapshot in snapshots {
        let is_latest = map
            .get(&snapshot.hospital_id)
            .map_or(true, |existing| snapshot.last_updated >= existing.last_updated);
        if is_latest {
            map.insert(snapshot.hospital_id.clone(), snapshot);
        }
    }
    map
}

/// Direction of an audited change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Increase,
    Decrease,
    Update,
}

impl ChangeAction {
    pub fn classify(previous: u32, new: u32) -> Self {
        match new.cmp(&previous) {
            std::cmp::Ordering::Greater => Self::Increase,
            std::cmp::Ordering::Less => Self::Decrease,
            std::cmp::Ordering::Equal => Self::Update,
        }
    }
}

/// Append-only audit entry for one category change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoricalLog {
    pub hospital_id: HospitalId,
    pub resource_type: ResourceCategory,
    pub previous_value: u32,
    pub new_value: u32,
    pub updated_by: String,
    pub action: ChangeAction,
    pub timestamp: DateTime<Utc>,
}
