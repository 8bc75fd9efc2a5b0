use bedfinder_core::{
    distance_km, index_availability, search, summarize, AvailabilityMap, BedAvailability,
    BedCounts, Coordinate, HospitalId, HospitalProfile, ResourceType, SearchConfig, SearchFilters,
    SearchSession,
};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;

const PUNE: Coordinate = Coordinate {
    latitude: 18.5204,
    longitude: 73.8567,
};

fn hospital(id: &str, city: &str, latitude: f64, longitude: f64) -> HospitalProfile {
    let stamp = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    HospitalProfile {
        id: HospitalId::from(id),
        name: format!("{id} Hospital"),
        address: format!("{id} Road"),
        city: city.to_string(),
        state: "Maharashtra".to_string(),
        pincode: "411001".to_string(),
        phone: Some("020-0000000".to_string()),
        email: None,
        registration_number: None,
        location: Coordinate {
            latitude,
            longitude,
        },
        is_verified: true,
        admin_id: None,
        created_at: stamp,
        updated_at: stamp,
    }
}

/// A is ~2.1 km and B ~40 km due north of Pune city centre.
fn pune_pair() -> Vec<HospitalProfile> {
    vec![
        hospital("B", "Pune", 18.8801, 73.8567),
        hospital("A", "Pune", 18.5393, 73.8567),
    ]
}

fn ids(hospitals: &[bedfinder_core::SearchHit<'_>]) -> Vec<String> {
    hospitals.iter().map(|hit| hit.hospital.id.to_string()).collect()
}

#[test]
fn fixture_distances_are_as_described() {
    let hospitals = pune_pair();
    let b = distance_km(PUNE, hospitals[0].location).unwrap();
    let a = distance_km(PUNE, hospitals[1].location).unwrap();
    assert!((a - 2.1).abs() < 0.05, "A at {a} km");
    assert!((b - 40.0).abs() < 0.2, "B at {b} km");
}

#[test]
fn radius_limits_and_orders_results() {
    let hospitals = pune_pair();
    let availability = AvailabilityMap::new();

    let within_25 = SearchFilters {
        radius_km: 25.0,
        ..SearchFilters::default()
    };
    let hits = search(&hospitals, &availability, &within_25, Some(PUNE)).unwrap();
    assert_eq!(ids(&hits), vec!["A"]);

    let within_50 = SearchFilters {
        radius_km: 50.0,
        ..SearchFilters::default()
    };
    let hits = search(&hospitals, &availability, &within_50, Some(PUNE)).unwrap();
    assert_eq!(ids(&hits), vec!["A", "B"]);
    let distances: Vec<f64> = hits.iter().filter_map(|hit| hit.distance_km).collect();
    assert_eq!(distances.len(), 2);
    assert!(distances[0] < distances[1]);
}

#[test]
fn search_without_origin_keeps_input_order_and_omits_distance() {
    let hospitals = pune_pair();
    let availability = AvailabilityMap::new();
    let hits = search(&hospitals, &availability, &SearchFilters::default(), None).unwrap();
    assert_eq!(ids(&hits), vec!["B", "A"]);
    assert!(hits.iter().all(|hit| hit.distance_km.is_none()));
}

#[test]
fn search_is_deterministic() {
    let hospitals = pune_pair();
    let availability = AvailabilityMap::new();
    let filters = SearchFilters {
        radius_km: 100.0,
        ..SearchFilters::default()
    };
    let first = search(&hospitals, &availability, &filters, Some(PUNE)).unwrap();
    let second = search(&hospitals, &availability, &filters, Some(PUNE)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn unreported_hospital_counts_as_hospital_but_not_capacity() {
    let hospitals = vec![
        hospital("reported", "Pune", 18.52, 73.85),
        hospital("silent", "Pune", 18.53, 73.86),
    ];
    let mut snapshot = BedAvailability::empty(HospitalId::from("reported"), "seed");
    snapshot.icu_beds = BedCounts::derive(10, 0);
    let availability = index_availability([snapshot]);

    let filters = SearchFilters {
        resource_type: ResourceType::Icu,
        availability_only: true,
        ..SearchFilters::default()
    };
    let hits = search(&hospitals, &availability, &filters, None).unwrap();
    assert_eq!(ids(&hits), vec!["silent"]);

    let stats = summarize(&hospitals, &availability);
    assert_eq!(stats.total_hospitals, 2);
    assert_eq!(stats.reporting_hospitals, 1);
    assert_eq!(stats.icu_beds.total_capacity, 10);
}

#[test]
fn session_rejects_radius_outside_offered_choices() {
    let hospitals = pune_pair();
    let availability = AvailabilityMap::new();
    let session = SearchSession::new(SearchFilters {
        radius_km: 7.0,
        ..SearchFilters::default()
    })
    .with_origin(PUNE);
    assert!(session
        .results(&hospitals, &availability, &SearchConfig::default())
        .is_err());
}

#[test]
fn session_map_points_follow_result_order() {
    let hospitals = pune_pair();
    let mut snapshot = BedAvailability::empty(HospitalId::from("A"), "seed");
    snapshot.oxygen_beds = BedCounts::derive(20, 12);
    let availability = index_availability([snapshot]);
    let session = SearchSession::new(SearchFilters {
        radius_km: 50.0,
        ..SearchFilters::default()
    })
    .with_origin(PUNE);

    let points = session
        .map_points(&hospitals, &availability, &SearchConfig::default())
        .unwrap();
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].id, HospitalId::from("A"));
    assert_eq!(points[0].categories.len(), 5);
    assert!(points[0].availability_summary.contains("Oxygen Beds 12/20"));
    assert!(points[1].categories.is_empty());
    assert_eq!(points[1].availability_summary, "Availability not reported");
}

#[test]
fn stats_ignore_the_session_filters() {
    let hospitals = pune_pair();
    let availability = AvailabilityMap::new();
    let session = SearchSession::new(SearchFilters {
        city: "Mumbai".to_string(),
        ..SearchFilters::default()
    });
    let hits = session
        .results(&hospitals, &availability, &SearchConfig::default())
        .unwrap();
    assert!(hits.is_empty());
    assert_eq!(summarize(&hospitals, &availability).total_hospitals, 2);
}

#[test]
fn session_round_trips_through_json() {
    let session = SearchSession::new(SearchFilters {
        city: "Pune".to_string(),
        resource_type: ResourceType::Ventilator,
        ..SearchFilters::default()
    })
    .with_origin(PUNE);
    let json = serde_json::to_string(&session).unwrap();
    assert!(json.contains("\"resource_type\":\"ventilator\""));
    let back: SearchSession = serde_json::from_str(&json).unwrap();
    assert_eq!(back, session);
}

fn generated_world() -> impl Strategy<Value = (Vec<HospitalProfile>, AvailabilityMap)> {
    prop::collection::vec(
        (
            prop::sample::select(vec!["Pune", "Mumbai", "Nagpur"]),
            18.0f64..20.0,
            73.0f64..74.5,
            prop::option::of((0u32..20, 0u32..20, 0u32..5)),
        ),
        0..25,
    )
    .prop_map(|rows| {
        let mut hospitals = Vec::new();
        let mut snapshots = Vec::new();
        for (index, (city, lat, lng, counts)) in rows.into_iter().enumerate() {
            let id = format!("h{index}");
            hospitals.push(hospital(&id, city, lat, lng));
            if let Some((total, icu, oxygen)) = counts {
                let mut snapshot = BedAvailability::empty(HospitalId::from(id.as_str()), "gen");
                snapshot.icu_beds = BedCounts::derive(total, icu.min(total));
                snapshot.oxygen_beds = BedCounts::derive(total, oxygen.min(total));
                snapshots.push(snapshot);
            }
        }
        (hospitals, index_availability(snapshots))
    })
}

proptest! {
    #[test]
    fn extra_filters_never_grow_results(
        (hospitals, availability) in generated_world(),
        with_origin in any::<bool>(),
    ) {
        let origin = with_origin.then_some(PUNE);
        let base = SearchFilters { radius_km: 100.0, ..SearchFilters::default() };
        let base_len = search(&hospitals, &availability, &base, origin).unwrap().len();

        let narrowed = [
            SearchFilters { availability_only: true, ..base.clone() },
            SearchFilters { resource_type: ResourceType::Icu, ..base.clone() },
            SearchFilters { city: "pune".to_string(), ..base.clone() },
            SearchFilters { radius_km: 25.0, ..base.clone() },
        ];
        for filters in narrowed {
            let len = search(&hospitals, &availability, &filters, origin).unwrap().len();
            prop_assert!(len <= base_len);
        }
    }
}
