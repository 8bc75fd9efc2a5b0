//! Core logic for finding hospitals and their live bed availability.
//!
//! Everything in this crate is synchronous and free of I/O: the data model, the
//! haversine helpers, the filter & rank pipeline, the statistics reducer and the
//! validation half of the dashboard update flow. Stores and bridges live in the
//! sibling crates.

mod config;
mod error;
pub mod geo;
mod map;
mod model;
mod search;
mod session;
mod stats;
mod update;

pub use config::SearchConfig;
pub use error::{BedFinderError, ValidationReason};
pub use geo::{distance_km, is_within_radius};
pub use map::{map_points, AvailabilityLevel, MapCategory, MapDataPoint};
pub use model::{
    index_availability, AmbulanceCounts, AvailabilityMap, BedAvailability, BedCounts,
    CategoryCounts, ChangeAction, Coordinate, HistoricalLog, HospitalId, HospitalProfile,
    ResourceCategory,
};
pub use search::{search, RankedHospital, ResourceType, SearchFilters, SearchHit};
pub use session::SearchSession;
pub use stats::{summarize, CategoryStats, Stats};
pub use update::{apply_edit, history_entries, AvailabilityEdit, EditedCounts};
