use serde::{Deserialize, Serialize};

use crate::model::Coordinate;

/// Tunables shared by the search entry points and the dashboard flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Radius choices offered to searchers, in kilometres.
    pub allowed_radii_km: Vec<f64>,
    pub default_radius_km: f64,
    /// Origin used when the device location cannot be obtained.
    pub fallback_origin: Coordinate,
    pub geolocation_timeout_ms: u64,
    /// Append a history entry for each changed category on dashboard writes.
    pub record_history: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            allowed_radii_km: vec![5.0, 10.0, 25.0, 50.0, 100.0],
            default_radius_km: 25.0,
            fallback_origin: Coordinate {
                latitude: 18.5204,
                longitude: 73.8567,
            },
            geolocation_timeout_ms: 10_000,
            record_history: true,
        }
    }
}

impl SearchConfig {
    pub fn allows_radius(&self, radius_km: f64) -> bool {
        self.allowed_radii_km
            .iter()
            .any(|allowed| (allowed - radius_km).abs() < f64::EPSILON)
    }
}
