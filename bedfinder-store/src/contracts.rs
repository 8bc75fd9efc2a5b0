//! Datastore contracts consumed by the search and dashboard flows.

use async_trait::async_trait;
use bedfinder_core::{
    AvailabilityMap, BedAvailability, BedFinderError, Coordinate, HistoricalLog, HospitalId,
    HospitalProfile,
};

use crate::feed::AvailabilityFeed;

/// Read access to hospital profiles.
#[async_trait]
pub trait HospitalDirectory: Send + Sync {
    /// All known hospitals, in no particular order.
    async fn list_hospitals(&self) -> Result<Vec<HospitalProfile>, BedFinderError>;

    async fn get_hospital(&self, id: &HospitalId)
        -> Result<Option<HospitalProfile>, BedFinderError>;

    /// All known hospitals ordered by name (case-insensitive), then id.
    async fn list_hospitals_by_name(&self) -> Result<Vec<HospitalProfile>, BedFinderError> {
        let mut hospitals = self.list_hospitals().await?;
        hospitals.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(hospitals)
    }
}

/// Per-hospital availability snapshots with change notification.
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    async fn get_availability(
        &self,
        hospital_id: &HospitalId,
    ) -> Result<Option<BedAvailability>, BedFinderError>;

    /// One entry per hospital that has reported.
    async fn list_availability(&self) -> Result<AvailabilityMap, BedFinderError>;

    /// Subscribe to full mappings. The current mapping is delivered first, then one
    /// mapping per committed write, in commit order.
    async fn subscribe_availability(&self) -> Result<AvailabilityFeed, BedFinderError>;

    /// Upsert keyed by `snapshot.hospital_id` and return the snapshot it displaced,
    /// read in the same critical section as the write. The last committed write wins.
    ///
    /// Implementations must reject snapshots that break the count invariants
    /// and must leave the previous snapshot in place on any failure.
    async fn replace_availability(
        &self,
        snapshot: BedAvailability,
    ) -> Result<Option<BedAvailability>, BedFinderError>;

    /// Upsert returning the committed snapshot.
    async fn write_availability(
        &self,
        snapshot: BedAvailability,
    ) -> Result<BedAvailability, BedFinderError> {
        self.replace_availability(snapshot.clone()).await?;
        Ok(snapshot)
    }

    /// Seed a zero snapshot at registration time. Existing snapshots are left alone.
    async fn seed_default(
        &self,
        hospital_id: &HospitalId,
        updated_by: &str,
    ) -> Result<BedAvailability, BedFinderError> {
        if let Some(existing) = self.get_availability(hospital_id).await? {
            return Ok(existing);
        }
        self.write_availability(BedAvailability::empty(hospital_id.clone(), updated_by))
            .await
    }
}

/// Append-only audit trail.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, entries: &[HistoricalLog]) -> Result<(), BedFinderError>;

    async fn list_for_hospital(
        &self,
        hospital_id: &HospitalId,
    ) -> Result<Vec<HistoricalLog>, BedFinderError>;
}

/// Device location source, e.g. the browser geolocation API.
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    /// Fails with `PermissionDenied` or `LocationUnavailable`.
    async fn current_location(&self) -> Result<Coordinate, BedFinderError>;
}
