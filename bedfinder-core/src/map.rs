//! Provider-neutral marker data for map widgets.

use serde::{Deserialize, Serialize};

use crate::model::{
    BedAvailability, CategoryCounts, Coordinate, HospitalId, HospitalProfile, ResourceCategory,
};
use crate::search::SearchHit;

/// Badge level shown next to a category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityLevel {
    High,
    Moderate,
    Low,
    Exhausted,
    Unknown,
}

impl AvailabilityLevel {
    pub fn classify(counts: Option<CategoryCounts>) -> Self {
        let Some(counts) = counts else {
            return Self::Unknown;
        };
        if counts.available == 0 {
            return Self::Exhausted;
        }
        let ratio = f64::from(counts.available) / f64::from(counts.total.max(1));
        if ratio < 0.2 {
            Self::Low
        } else if ratio < 0.5 {
            Self::Moderate
        } else {
            Self::High
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapCategory {
    pub category: ResourceCategory,
    pub available: u32,
    pub total: u32,
    pub level: AvailabilityLevel,
}

/// Everything a marker needs, with no dependency on the search internals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapDataPoint {
    pub id: HospitalId,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub coordinate: Coordinate,
    pub label: String,
    /// Empty when the hospital has not reported availability.
    pub categories: Vec<MapCategory>,
    pub availability_summary: String,
    pub distance_km: Option<f64>,
}

impl MapDataPoint {
    pub fn from_parts(
        hospital: &HospitalProfile,
        snapshot: Option<&BedAvailability>,
        distance_km: Option<f64>,
    ) -> Self {
        let categories: Vec<MapCategory> = snapshot
            .map(|snapshot| {
                ResourceCategory::ALL
                    .into_iter()
                    .map(|category| {
                        let counts = snapshot.counts(category);
                        MapCategory {
                            category,
                            available: counts.available,
                            total: counts.total,
                            level: AvailabilityLevel::classify(Some(counts)),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let availability_summary = if categories.is_empty() {
            "Availability not reported".to_string()
        } else {
            categories
                .iter()
                .map(|entry| {
                    format!(
                        "{} {}/{}",
                        entry.category.label(),
                        entry.available,
                        entry.total
                    )
                })
                .collect::<Vec<_>>()
                .join(", ")
        };

        let label = match distance_km {
            Some(distance) => format!("{} ({distance:.1} km)", hospital.name),
            None => hospital.name.clone(),
        };

        Self {
            id: hospital.id.clone(),
            name: hospital.name.clone(),
            address: hospital.address.clone(),
            phone: hospital.phone.clone(),
            coordinate: hospital.location,
            label,
            categories,
            availability_summary,
            distance_km,
        }
    }
}

/// Markers for a result list, in result order.
pub fn map_points(hits: &[SearchHit<'_>]) -> Vec<MapDataPoint> {
    hits.iter()
        .map(|hit| MapDataPoint::from_parts(hit.hospital, hit.availability, hit.distance_km))
        .collect()
}
