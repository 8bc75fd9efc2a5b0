//! Framework-neutral WASM <-> JavaScript bridge over the search, stats and edit engines.

use bedfinder_core::{
    apply_edit, history_entries, index_availability, map_points, summarize, AvailabilityEdit,
    AvailabilityMap, BedAvailability, BedFinderError, Coordinate, HistoricalLog, HospitalId,
    HospitalProfile, MapDataPoint, SearchConfig, SearchHit, SearchSession, Stats,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
struct JsSearchConfig {
    #[serde(default)]
    allowed_radii_km: Option<Vec<f64>>,
    #[serde(default)]
    default_radius_km: Option<f64>,
    #[serde(default)]
    fallback_origin: Option<Coordinate>,
    #[serde(default)]
    geolocation_timeout_ms: Option<u64>,
}

impl From<JsSearchConfig> for SearchConfig {
    fn from(cfg: JsSearchConfig) -> Self {
        let mut base = SearchConfig::default();
        if let Some(radii) = cfg.allowed_radii_km {
            base.allowed_radii_km = radii;
        }
        if let Some(radius) = cfg.default_radius_km {
            base.default_radius_km = radius;
        }
        if let Some(origin) = cfg.fallback_origin {
            base.fallback_origin = origin;
        }
        if let Some(timeout) = cfg.geolocation_timeout_ms {
            base.geolocation_timeout_ms = timeout;
        }
        base
    }
}

#[derive(Deserialize)]
struct SearchRequest {
    hospitals: Vec<HospitalProfile>,
    #[serde(default)]
    availability: Vec<BedAvailability>,
    #[serde(default)]
    session: SearchSession,
    #[serde(default)]
    config: Option<JsSearchConfig>,
}

#[derive(Serialize)]
struct SearchResponse<'a> {
    results: Vec<SearchHit<'a>>,
    map_points: Vec<MapDataPoint>,
    stats: Stats,
}

#[derive(Deserialize)]
struct SummarizeRequest {
    hospitals: Vec<HospitalProfile>,
    #[serde(default)]
    availability: Vec<BedAvailability>,
}

#[derive(Deserialize)]
struct EditRequest {
    hospital_id: HospitalId,
    #[serde(default)]
    previous: Option<BedAvailability>,
    edit: AvailabilityEdit,
    updated_by: String,
}

#[derive(Serialize)]
struct EditPreview {
    snapshot: BedAvailability,
    history: Vec<HistoricalLog>,
}

/// List, map and stats views for one search session, from a single input.
pub fn search_value(request: Value) -> Result<Value, BedFinderError> {
    let request: SearchRequest = decode(request)?;
    let config = request.config.map(SearchConfig::from).unwrap_or_default();
    let availability = index_checked(request.availability)?;

    let results = request
        .session
        .results(&request.hospitals, &availability, &config)?;
    let response = SearchResponse {
        map_points: map_points(&results),
        stats: summarize(&request.hospitals, &availability),
        results,
    };
    encode(&response)
}

pub fn summarize_value(request: Value) -> Result<Value, BedFinderError> {
    let request: SummarizeRequest = decode(request)?;
    let availability = index_checked(request.availability)?;
    encode(&summarize(&request.hospitals, &availability))
}

/// Validate an operator edit and show the snapshot it would produce.
pub fn preview_edit_value(request: Value) -> Result<Value, BedFinderError> {
    let request: EditRequest = decode(request)?;
    let snapshot = apply_edit(
        request.previous.as_ref(),
        &request.hospital_id,
        &request.edit,
        &request.updated_by,
        Utc::now(),
    )?;
    let history = history_entries(request.previous.as_ref(), &snapshot);
    encode(&EditPreview { snapshot, history })
}

#[wasm_bindgen]
pub fn search_hospitals(request: JsValue) -> Result<JsValue, JsValue> {
    bridge(request, search_value)
}

#[wasm_bindgen]
pub fn summarize_hospitals(request: JsValue) -> Result<JsValue, JsValue> {
    bridge(request, summarize_value)
}

#[wasm_bindgen]
pub fn preview_update(request: JsValue) -> Result<JsValue, JsValue> {
    bridge(request, preview_edit_value)
}

fn bridge(
    request: JsValue,
    run: impl FnOnce(Value) -> Result<Value, BedFinderError>,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let value = from_value::<Value>(request)
        .map_err(|err| JsValue::from_str(&format!("Could not read request JSON: {err}")))?;
    let output = run(value).map_err(|err| JsValue::from_str(&format_bridge_error(err)))?;
    to_value(&output)
        .map_err(|err| JsValue::from_str(&format!("Could not serialize result: {err}")))
}

/// Snapshots from JavaScript are untrusted: reject any whose counts do not add up.
fn index_checked(snapshots: Vec<BedAvailability>) -> Result<AvailabilityMap, BedFinderError> {
    for snapshot in &snapshots {
        snapshot.check_invariants()?;
    }
    Ok(index_availability(snapshots))
}

fn decode<T: for<'de> Deserialize<'de>>(value: Value) -> Result<T, BedFinderError> {
    serde_json::from_value(value).map_err(|err| BedFinderError::Parse(err.to_string()))
}

fn encode<T: Serialize>(value: &T) -> Result<Value, BedFinderError> {
    serde_json::to_value(value).map_err(|err| BedFinderError::Parse(err.to_string()))
}

fn format_bridge_error(err: BedFinderError) -> String {
    format!("BedFinder error: {}", err.user_message())
}

#[cfg(test)]
mod tests {
    use bedfinder_core::ResourceCategory;
    use serde_json::json;

    use super::*;

    fn hospital(id: &str, lat: f64) -> Value {
        json!({
            "id": id,
            "name": format!("{id} hospital"),
            "city": "Pune",
            "pincode": "411001",
            "location": { "latitude": lat, "longitude": 73.8567 },
            "is_verified": true,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    fn snapshot(id: &str, icu_available: u32) -> Value {
        let counts = json!({
            "total": 10,
            "available": icu_available,
            "occupied": 10 - icu_available
        });
        let zero = json!({ "total": 0, "available": 0, "occupied": 0 });
        json!({
            "id": format!("snap-{id}"),
            "hospital_id": id,
            "icu_beds": counts,
            "general_beds": zero,
            "oxygen_beds": zero,
            "ventilators": zero,
            "ambulances": { "total": 0, "available": 0, "on_duty": 0 },
            "last_updated": "2024-01-01T00:00:00Z",
            "updated_by": "seed"
        })
    }

    #[test]
    fn search_returns_all_three_views() {
        let request = json!({
            "hospitals": [hospital("far", 18.8801), hospital("near", 18.5393)],
            "availability": [snapshot("near", 4)],
            "session": {
                "filters": { "radius_km": 50.0, "resource_type": "icu" },
                "origin": { "latitude": 18.5204, "longitude": 73.8567 }
            }
        });
        let response = search_value(request).unwrap();

        let results = response["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["hospital"]["id"], "near");
        let near = results[0]["distance_km"].as_f64().unwrap();
        let far = results[1]["distance_km"].as_f64().unwrap();
        assert!(near < far);
        assert_eq!(
            response["map_points"][1]["availability_summary"],
            "Availability not reported"
        );
        assert_eq!(response["stats"]["total_hospitals"], 2);
        assert_eq!(response["stats"]["icu_beds"]["total_available"], 4);
    }

    #[test]
    fn search_without_origin_reports_null_distance() {
        let request = json!({ "hospitals": [hospital("a", 18.52)] });
        let response = search_value(request).unwrap();
        assert!(response["results"][0]["distance_km"].is_null());
    }

    #[test]
    fn custom_radii_come_from_partial_config() {
        let request = json!({
            "hospitals": [hospital("a", 18.52)],
            "session": { "filters": { "radius_km": 7.0 } },
            "config": { "allowed_radii_km": [7.0, 14.0] }
        });
        assert!(search_value(request).is_ok());

        let rejected = json!({
            "hospitals": [hospital("a", 18.52)],
            "session": { "filters": { "radius_km": 7.0 } }
        });
        assert!(matches!(
            search_value(rejected),
            Err(BedFinderError::InvalidFilter(_))
        ));
    }

    #[test]
    fn edit_preview_derives_and_rejects() {
        let request = json!({
            "hospital_id": "near",
            "previous": snapshot("near", 4),
            "edit": {
                "icu_beds": { "total": 10, "available": 6 },
                "general_beds": { "total": 0, "available": 0 },
                "oxygen_beds": { "total": 0, "available": 0 },
                "ventilators": { "total": 0, "available": 0 },
                "ambulances": { "total": 0, "available": 0 }
            },
            "updated_by": "user1"
        });
        let preview = preview_edit_value(request).unwrap();
        assert_eq!(preview["snapshot"]["icu_beds"]["occupied"], 4);
        assert_eq!(preview["snapshot"]["id"], "snap-near");
        assert_eq!(preview["history"][0]["action"], "increase");

        let bad = json!({
            "hospital_id": "near",
            "edit": {
                "icu_beds": { "total": 10, "available": 11 },
                "general_beds": { "total": 0, "available": 0 },
                "oxygen_beds": { "total": 0, "available": 0 },
                "ventilators": { "total": 0, "available": 0 },
                "ambulances": { "total": 0, "available": 0 }
            },
            "updated_by": "user1"
        });
        assert!(matches!(
            preview_edit_value(bad),
            Err(BedFinderError::Validation { .. })
        ));
    }

    #[test]
    fn inconsistent_snapshot_is_rejected() {
        let mut broken = snapshot("near", 4);
        broken["icu_beds"] = json!({ "total": 10, "available": 12, "occupied": 0 });

        let stats = summarize_value(json!({
            "hospitals": [hospital("near", 18.5393)],
            "availability": [broken.clone()]
        }));
        assert!(matches!(
            stats,
            Err(BedFinderError::Validation {
                category: ResourceCategory::IcuBeds,
                ..
            })
        ));

        let search = search_value(json!({
            "hospitals": [hospital("near", 18.5393)],
            "availability": [broken]
        }));
        assert!(matches!(search, Err(BedFinderError::Validation { .. })));
    }

    #[test]
    fn malformed_request_is_a_parse_error() {
        assert!(matches!(
            summarize_value(json!({ "hospitals": "nope" })),
            Err(BedFinderError::Parse(_))
        ));
    }
}
