//! Store contracts, an in-memory datastore and the async flows built on them.

mod contracts;
mod feed;
mod locate;
mod memory;
mod seed;
mod service;

pub use contracts::{AvailabilityStore, GeolocationProvider, HistoryStore, HospitalDirectory};
pub use feed::{AvailabilityFeed, Subscribers};
pub use locate::{
    acquire_location, resolve_origin, FixedLocation, NoLocation, OriginSource, ResolvedOrigin,
};
pub use memory::MemoryStore;
pub use seed::{parse_seed_str, parse_seed_value, SeedData};
pub use service::{Catalog, Dashboard, Finder, NearestHospitals};
