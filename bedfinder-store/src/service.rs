//! Searcher and operator flows over the store contracts.

use std::sync::Arc;

use bedfinder_core::{
    apply_edit, history_entries, summarize, AvailabilityEdit, AvailabilityMap, BedAvailability,
    BedFinderError, HospitalId, HospitalProfile, RankedHospital, SearchConfig, SearchFilters,
    SearchHit, SearchSession, Stats,
};
use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::contracts::{AvailabilityStore, GeolocationProvider, HistoryStore, HospitalDirectory};
use crate::locate::{resolve_origin, ResolvedOrigin};

/// The two collections every searcher view is derived from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub hospitals: Vec<HospitalProfile>,
    pub availability: AvailabilityMap,
}

impl Catalog {
    /// Replace the availability side with a mapping delivered by a feed.
    pub fn apply(&mut self, availability: &AvailabilityMap) {
        self.availability = availability.clone();
    }

    pub fn results(
        &self,
        session: &SearchSession,
        config: &SearchConfig,
    ) -> Result<Vec<SearchHit<'_>>, BedFinderError> {
        session.results(&self.hospitals, &self.availability, config)
    }

    pub fn stats(&self) -> Stats {
        summarize(&self.hospitals, &self.availability)
    }
}

/// Result of a "find nearest" action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NearestHospitals {
    pub origin: ResolvedOrigin,
    pub hospitals: Vec<RankedHospital>,
}

/// Searcher-side entry points.
#[derive(Clone)]
pub struct Finder {
    directory: Arc<dyn HospitalDirectory>,
    availability: Arc<dyn AvailabilityStore>,
    config: SearchConfig,
}

impl Finder {
    pub fn new(
        directory: Arc<dyn HospitalDirectory>,
        availability: Arc<dyn AvailabilityStore>,
        config: SearchConfig,
    ) -> Self {
        Self {
            directory,
            availability,
            config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Fetch hospitals (name-ordered) and snapshots concurrently.
    pub async fn load(&self) -> Result<Catalog, BedFinderError> {
        let (hospitals, availability) = tokio::try_join!(
            self.directory.list_hospitals_by_name(),
            self.availability.list_availability()
        )?;
        Ok(Catalog {
            hospitals,
            availability,
        })
    }

    /// Resolve an origin (device or fallback) and rank hospitals around it.
    pub async fn find_nearest(
        &self,
        provider: &dyn GeolocationProvider,
        filters: &SearchFilters,
    ) -> Result<NearestHospitals, BedFinderError> {
        filters.validate(&self.config)?;
        let origin = resolve_origin(provider, &self.config).await?;
        let catalog = self.load().await?;

        let session = SearchSession {
            filters: filters.clone(),
            origin: Some(origin.coordinate),
        };
        let hospitals = catalog
            .results(&session, &self.config)?
            .iter()
            .map(SearchHit::to_ranked)
            .collect();

        Ok(NearestHospitals { origin, hospitals })
    }
}

/// Operator-side update flow.
#[derive(Clone)]
pub struct Dashboard {
    directory: Arc<dyn HospitalDirectory>,
    availability: Arc<dyn AvailabilityStore>,
    history: Option<Arc<dyn HistoryStore>>,
    config: SearchConfig,
}

impl Dashboard {
    pub fn new(
        directory: Arc<dyn HospitalDirectory>,
        availability: Arc<dyn AvailabilityStore>,
        config: SearchConfig,
    ) -> Self {
        Self {
            directory,
            availability,
            history: None,
            config,
        }
    }

    pub fn with_history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    /// Form pre-fill: the current snapshot, or zeros when the hospital has not reported.
    pub async fn edit_form(
        &self,
        hospital_id: &HospitalId,
    ) -> Result<AvailabilityEdit, BedFinderError> {
        self.require_hospital(hospital_id).await?;
        Ok(self
            .availability
            .get_availability(hospital_id)
            .await?
            .map(|snapshot| AvailabilityEdit::from_snapshot(&snapshot))
            .unwrap_or_default())
    }

    /// Validate, derive, stamp and persist an operator edit.
    ///
    /// Nothing is written unless every category is valid. When the store write
    /// fails, the previous snapshot stays authoritative. Audit entries are
    /// appended only after a successful write, and a failed append is logged
    /// rather than returned.
    ///
    /// Concurrent edits for the same hospital resolve last-write-wins. Audit
    /// entries diff against the snapshot the store actually displaced, not the
    /// one read when the edit was built, so a racing session cannot leave a
    /// stale `previous_value` in the trail.
    pub async fn update_availability(
        &self,
        hospital_id: &HospitalId,
        edit: &AvailabilityEdit,
        updated_by: &str,
    ) -> Result<BedAvailability, BedFinderError> {
        self.require_hospital(hospital_id).await?;
        let previous = self.availability.get_availability(hospital_id).await?;

        let next = apply_edit(previous.as_ref(), hospital_id, edit, updated_by, Utc::now())
            .map_err(|err| {
                warn!("rejected availability edit for {hospital_id} by {updated_by}: {err}");
                err
            })?;

        let displaced = self
            .availability
            .replace_availability(next.clone())
            .await
            .map_err(|err| {
                warn!("availability write for {hospital_id} failed: {err}");
                err
            })?;

        if self.config.record_history {
            if let Some(history) = &self.history {
                let entries = history_entries(displaced.as_ref(), &next);
                if !entries.is_empty() {
                    if let Err(err) = history.append(&entries).await {
                        warn!("could not record history for {hospital_id}: {err}");
                    }
                }
            }
        }

        info!("availability for {hospital_id} updated by {updated_by}");
        Ok(next)
    }

    async fn require_hospital(
        &self,
        hospital_id: &HospitalId,
    ) -> Result<HospitalProfile, BedFinderError> {
        self.directory
            .get_hospital(hospital_id)
            .await?
            .ok_or_else(|| BedFinderError::NotFound(format!("hospital {hospital_id}")))
    }
}
