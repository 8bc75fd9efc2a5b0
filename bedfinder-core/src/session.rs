use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::error::BedFinderError;
use crate::map::{map_points, MapDataPoint};
use crate::model::{AvailabilityMap, Coordinate, HospitalProfile};
use crate::search::{search, SearchFilters, SearchHit};

/// Explicit searcher state: the form plus the origin of the last "find nearest".
///
/// List and map views are derived from the same (hospitals, availability) pair
/// through this value. Statistics come from [`summarize`](crate::summarize) over
/// that pair and are not scoped by the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchSession {
    pub filters: SearchFilters,
    pub origin: Option<Coordinate>,
}

impl SearchSession {
    pub fn new(filters: SearchFilters) -> Self {
        Self {
            filters,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: Coordinate) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn clear_origin(&mut self) {
        self.origin = None;
    }

    /// List view.
    pub fn results<'a>(
        &self,
        hospitals: &'a [HospitalProfile],
        availability: &'a AvailabilityMap,
        config: &SearchConfig,
    ) -> Result<Vec<SearchHit<'a>>, BedFinderError> {
        self.filters.validate(config)?;
        search(hospitals, availability, &self.filters, self.origin)
    }

    /// Map view over the same results as [`results`](Self::results).
    pub fn map_points(
        &self,
        hospitals: &[HospitalProfile],
        availability: &AvailabilityMap,
        config: &SearchConfig,
    ) -> Result<Vec<MapDataPoint>, BedFinderError> {
        Ok(map_points(&self.results(hospitals, availability, config)?))
    }
}
