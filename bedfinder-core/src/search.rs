//! Filter & rank pipeline over hospitals and their availability snapshots.
//!
//! Predicates run in a fixed order: city, pincode, resource type, availability-only.
//! A hospital without a snapshot is never excluded by the two availability
//! predicates: missing data means "unknown", not "zero".

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::error::BedFinderError;
use crate::geo::distance_km;
use crate::model::{
    AvailabilityMap, BedAvailability, Coordinate, HospitalProfile, ResourceCategory,
};

/// Resource selector offered in the search form.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    #[default]
    All,
    Icu,
    General,
    Oxygen,
    Ventilator,
    Ambulance,
}

impl ResourceType {
    pub fn category(self) -> Option<ResourceCategory> {
        match self {
            Self::All => None,
            Self::Icu => Some(ResourceCategory::IcuBeds),
            Self::General => Some(ResourceCategory::GeneralBeds),
            Self::Oxygen => Some(ResourceCategory::OxygenBeds),
            Self::Ventilator => Some(ResourceCategory::Ventilators),
            Self::Ambulance => Some(ResourceCategory::Ambulances),
        }
    }
}

impl From<ResourceCategory> for ResourceType {
    fn from(category: ResourceCategory) -> Self {
        match category {
            ResourceCategory::IcuBeds => Self::Icu,
            ResourceCategory::GeneralBeds => Self::General,
            ResourceCategory::OxygenBeds => Self::Oxygen,
            ResourceCategory::Ventilators => Self::Ventilator,
            ResourceCategory::Ambulances => Self::Ambulance,
        }
    }
}

impl std::str::FromStr for ResourceType {
    type Err = BedFinderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        value
            .parse::<ResourceCategory>()
            .map(Self::from)
            .map_err(|_| BedFinderError::InvalidFilter(format!("unknown resource type '{value}'")))
    }
}

/// Ephemeral search form state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchFilters {
    pub city: String,
    pub pincode: String,
    pub resource_type: ResourceType,
    pub availability_only: bool,
    pub radius_km: f64,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            city: String::new(),
            pincode: String::new(),
            resource_type: ResourceType::All,
            availability_only: false,
            radius_km: SearchConfig::default().default_radius_km,
        }
    }
}

impl SearchFilters {
    /// Reject radii that are not a positive, finite number of kilometres.
    pub fn check_radius(&self) -> Result<(), BedFinderError> {
        if self.radius_km.is_finite() && self.radius_km > 0.0 {
            Ok(())
        } else {
            Err(BedFinderError::InvalidFilter(format!(
                "radius must be a positive number of kilometres, got {}",
                self.radius_km
            )))
        }
    }

    /// Like [`check_radius`](Self::check_radius), and also require one of the offered radii.
    pub fn validate(&self, config: &SearchConfig) -> Result<(), BedFinderError> {
        self.check_radius()?;
        if !config.allows_radius(self.radius_km) {
            return Err(BedFinderError::InvalidFilter(format!(
                "radius {} km is not one of {:?}",
                self.radius_km, config.allowed_radii_km
            )));
        }
        Ok(())
    }
}

/// A hospital that survived filtering.
///
/// `distance_km` is `None` when the search had no origin; it is never defaulted to zero.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchHit<'a> {
    pub hospital: &'a HospitalProfile,
    pub availability: Option<&'a BedAvailability>,
    pub distance_km: Option<f64>,
}

impl SearchHit<'_> {
    pub fn to_ranked(&self) -> RankedHospital {
        RankedHospital {
            hospital: self.hospital.clone(),
            availability: self.availability.cloned(),
            distance_km: self.distance_km,
        }
    }
}

/// Owned form of [`SearchHit`], for results that outlive the input collections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedHospital {
    pub hospital: HospitalProfile,
    pub availability: Option<BedAvailability>,
    pub distance_km: Option<f64>,
}

/// Filter, then (with an origin) radius-limit and sort ascending by distance.
///
/// Without an origin the surviving hospitals keep their input order. The sort is
/// stable, so equidistant hospitals also keep their input order.
pub fn search<'a>(
    hospitals: &'a [HospitalProfile],
    availability: &'a AvailabilityMap,
    filters: &SearchFilters,
    origin: Option<Coordinate>,
) -> Result<Vec<SearchHit<'a>>, BedFinderError> {
    filters.check_radius()?;
    if let Some(origin) = origin {
        origin.validate()?;
    }

    let criteria = Criteria::new(filters);
    let hits: Vec<SearchHit<'a>> = hospitals
        .iter()
        .filter_map(|hospital| {
            let snapshot = availability.get(&hospital.id);
            criteria.accepts(hospital, snapshot).then_some(SearchHit {
                hospital,
                availability: snapshot,
                distance_km: None,
            })
        })
        .collect();

    debug!(
        "filters kept {} of {} hospitals",
        hits.len(),
        hospitals.len()
    );

    let Some(origin) = origin else {
        return Ok(hits);
    };

    let mut ranked: Vec<SearchHit<'a>> = hits
        .into_iter()
        .filter_map(|mut hit| match distance_km(origin, hit.hospital.location) {
            Ok(distance) if distance <= filters.radius_km => {
                hit.distance_km = Some(distance);
                Some(hit)
            }
            Ok(_) => None,
            Err(err) => {
                debug!("skipping {} in radius search: {err}", hit.hospital.id);
                None
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        let a = a.distance_km.unwrap_or(f64::INFINITY);
        let b = b.distance_km.unwrap_or(f64::INFINITY);
        a.total_cmp(&b)
    });

    debug!(
        "{} hospitals within {} km of ({}, {})",
        ranked.len(),
        filters.radius_km,
        origin.latitude,
        origin.longitude
    );

    Ok(ranked)
}

/// Normalized predicate inputs, computed once per search.
struct Criteria<'f> {
    city: String,
    pincode: &'f str,
    category: Option<ResourceCategory>,
    availability_only: bool,
}

impl<'f> Criteria<'f> {
    fn new(filters: &'f SearchFilters) -> Self {
        Self {
            city: filters.city.trim().to_lowercase(),
            pincode: filters.pincode.trim(),
            category: filters.resource_type.category(),
            availability_only: filters.availability_only,
        }
    }

    fn accepts(&self, hospital: &HospitalProfile, snapshot: Option<&BedAvailability>) -> bool {
        self.matches_city(hospital)
            && self.matches_pincode(hospital)
            && self.matches_resource(snapshot)
            && self.matches_any_available(snapshot)
    }

    fn matches_city(&self, hospital: &HospitalProfile) -> bool {
        self.city.is_empty() || hospital.city.to_lowercase().contains(&self.city)
    }

    fn matches_pincode(&self, hospital: &HospitalProfile) -> bool {
        self.pincode.is_empty() || hospital.pincode.contains(self.pincode)
    }

    fn matches_resource(&self, snapshot: Option<&BedAvailability>) -> bool {
        match (self.category, snapshot) {
            (Some(category), Some(snapshot)) => snapshot.available(category) > 0,
            _ => true,
        }
    }

    fn matches_any_available(&self, snapshot: Option<&BedAvailability>) -> bool {
        match snapshot {
            Some(snapshot) if self.availability_only => snapshot.has_any_available(),
            _ => true,
        }
    }
}
