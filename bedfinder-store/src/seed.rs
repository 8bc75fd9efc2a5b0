use bedfinder_core::{BedAvailability, BedFinderError, HospitalProfile};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Initial contents for a store: `{ "hospitals": [...], "availability": [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SeedData {
    #[serde(default)]
    pub hospitals: Vec<HospitalProfile>,
    #[serde(default)]
    pub availability: Vec<BedAvailability>,
}

/// Parse seed data from a JSON string.
pub fn parse_seed_str(json: &str) -> Result<SeedData, BedFinderError> {
    let value: Value =
        serde_json::from_str(json).map_err(|err| BedFinderError::Parse(err.to_string()))?;
    parse_seed_value(value)
}

/// Parse seed data from a `serde_json::Value`.
pub fn parse_seed_value(value: Value) -> Result<SeedData, BedFinderError> {
    if !value.is_object() {
        return Err(BedFinderError::Parse(
            "seed data must be a JSON object".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|err| BedFinderError::Parse(err.to_string()))
}
