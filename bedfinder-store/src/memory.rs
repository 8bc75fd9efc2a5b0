//! In-process reference datastore.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bedfinder_core::{
    AvailabilityMap, BedAvailability, BedFinderError, HistoricalLog, HospitalId, HospitalProfile,
};
use chrono::Utc;
use log::{info, warn};
use tokio::sync::RwLock;

use crate::contracts::{AvailabilityStore, HistoryStore, HospitalDirectory};
use crate::feed::{AvailabilityFeed, Subscribers};
use crate::seed::SeedData;

/// Hospitals, snapshots and audit log held in memory.
///
/// `set_offline(true)` makes every operation fail with `StoreUnavailable`, which
/// mimics a lost connection to a remote datastore.
#[derive(Debug)]
pub struct MemoryStore {
    hospitals: RwLock<BTreeMap<HospitalId, HospitalProfile>>,
    snapshots: RwLock<AvailabilityMap>,
    history: RwLock<Vec<HistoricalLog>>,
    subscribers: Arc<Subscribers>,
    offline: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            hospitals: RwLock::new(BTreeMap::new()),
            snapshots: RwLock::new(AvailabilityMap::new()),
            history: RwLock::new(Vec::new()),
            subscribers: Subscribers::new(),
            offline: AtomicBool::new(false),
        }
    }

    /// Build a store from seed data. Invalid hospitals or snapshots are rejected;
    /// snapshots for unknown hospitals are skipped.
    pub fn from_seed(seed: SeedData) -> Result<Self, BedFinderError> {
        let mut hospitals = BTreeMap::new();
        for hospital in seed.hospitals {
            hospital.validate()?;
            if hospitals.contains_key(&hospital.id) {
                return Err(BedFinderError::Parse(format!(
                    "duplicate hospital id {}",
                    hospital.id
                )));
            }
            hospitals.insert(hospital.id.clone(), hospital);
        }

        let mut reported = Vec::new();
        for snapshot in seed.availability {
            if !hospitals.contains_key(&snapshot.hospital_id) {
                warn!(
                    "skipping availability for unknown hospital {}",
                    snapshot.hospital_id
                );
                continue;
            }
            snapshot.check_invariants()?;
            reported.push(snapshot);
        }
        let snapshots = bedfinder_core::index_availability(reported);

        info!(
            "memory store seeded with {} hospitals, {} snapshots",
            hospitals.len(),
            snapshots.len()
        );

        Ok(Self {
            hospitals: RwLock::new(hospitals),
            snapshots: RwLock::new(snapshots),
            ..Self::new()
        })
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Insert or replace a profile. The id and creation time of an existing
    /// profile are kept; the coordinate must be valid.
    pub async fn upsert_hospital(
        &self,
        mut profile: HospitalProfile,
    ) -> Result<HospitalProfile, BedFinderError> {
        self.ensure_online()?;
        profile.validate()?;
        let mut hospitals = self.hospitals.write().await;
        if let Some(existing) = hospitals.get(&profile.id) {
            profile.created_at = existing.created_at;
        }
        profile.updated_at = Utc::now();
        hospitals.insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }

    /// Verification authority toggle.
    pub async fn set_verified(
        &self,
        id: &HospitalId,
        verified: bool,
    ) -> Result<HospitalProfile, BedFinderError> {
        self.ensure_online()?;
        let mut hospitals = self.hospitals.write().await;
        let hospital = hospitals
            .get_mut(id)
            .ok_or_else(|| BedFinderError::NotFound(format!("hospital {id}")))?;
        hospital.is_verified = verified;
        hospital.updated_at = Utc::now();
        info!("hospital {id} verification set to {verified}");
        Ok(hospital.clone())
    }

    fn ensure_online(&self) -> Result<(), BedFinderError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(BedFinderError::StoreUnavailable(
                "memory store is offline".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl HospitalDirectory for MemoryStore {
    async fn list_hospitals(&self) -> Result<Vec<HospitalProfile>, BedFinderError> {
        self.ensure_online()?;
        Ok(self.hospitals.read().await.values().cloned().collect())
    }

    async fn get_hospital(
        &self,
        id: &HospitalId,
    ) -> Result<Option<HospitalProfile>, BedFinderError> {
        self.ensure_online()?;
        Ok(self.hospitals.read().await.get(id).cloned())
    }
}

#[async_trait]
impl AvailabilityStore for MemoryStore {
    async fn get_availability(
        &self,
        hospital_id: &HospitalId,
    ) -> Result<Option<BedAvailability>, BedFinderError> {
        self.ensure_online()?;
        Ok(self.snapshots.read().await.get(hospital_id).cloned())
    }

    async fn list_availability(&self) -> Result<AvailabilityMap, BedFinderError> {
        self.ensure_online()?;
        Ok(self.snapshots.read().await.clone())
    }

    async fn subscribe_availability(&self) -> Result<AvailabilityFeed, BedFinderError> {
        self.ensure_online()?;
        // holding the read lock keeps writers out until the initial mapping is queued
        let snapshots = self.snapshots.read().await;
        Ok(self.subscribers.subscribe(Some(&*snapshots)))
    }

    async fn replace_availability(
        &self,
        snapshot: BedAvailability,
    ) -> Result<Option<BedAvailability>, BedFinderError> {
        self.ensure_online()?;
        snapshot.check_invariants()?;

        let hospital_id = snapshot.hospital_id.clone();
        let updated_by = snapshot.updated_by.clone();
        let mut snapshots = self.snapshots.write().await;
        let displaced = snapshots.insert(hospital_id.clone(), snapshot);
        self.subscribers.publish(&snapshots);
        drop(snapshots);

        info!("availability for {hospital_id} written by {updated_by}");
        Ok(displaced)
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn append(&self, entries: &[HistoricalLog]) -> Result<(), BedFinderError> {
        self.ensure_online()?;
        self.history.write().await.extend_from_slice(entries);
        Ok(())
    }

    async fn list_for_hospital(
        &self,
        hospital_id: &HospitalId,
    ) -> Result<Vec<HistoricalLog>, BedFinderError> {
        self.ensure_online()?;
        Ok(self
            .history
            .read()
            .await
            .iter()
            .filter(|entry| &entry.hospital_id == hospital_id)
            .cloned()
            .collect())
    }
}
