use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use bedfinder_core::{
    BedFinderError, Coordinate, EditedCounts, HospitalId, MapDataPoint, RankedHospital,
    ResourceCategory, ResourceType, SearchConfig, SearchFilters, SearchSession, Stats,
};
use bedfinder_store::{
    parse_seed_str, Dashboard, Finder, FixedLocation, GeolocationProvider, MemoryStore,
    NoLocation, OriginSource,
};
use clap::{Parser, Subcommand};
use log::debug;

#[derive(Parser, Debug)]
#[command(
    name = "bedfinder-cli",
    about = "Search hospitals and bed availability from a seed JSON file."
)]
struct Args {
    /// Path to the seed JSON file (hospitals + availability).
    #[arg(short, long)]
    input: PathBuf,
    /// Optional search config JSON; missing fields use defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Filter hospitals, optionally ranking them around a location.
    Search {
        #[arg(long, default_value = "")]
        city: String,
        #[arg(long, default_value = "")]
        pincode: String,
        /// all, icu, general, oxygen, ventilator or ambulance.
        #[arg(long, default_value = "all")]
        resource: ResourceType,
        #[arg(long)]
        available_only: bool,
        /// Radius in km; defaults to the configured default radius.
        #[arg(long)]
        radius: Option<f64>,
        #[arg(long, requires = "lng", allow_negative_numbers = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lng: Option<f64>,
        /// Rank by distance even without --lat/--lng (uses the fallback origin).
        #[arg(long)]
        nearest: bool,
    },
    /// Print availability totals.
    Stats,
    /// Apply one dashboard edit, keeping the other categories unchanged.
    Update {
        #[arg(long)]
        hospital: String,
        /// icu, general, oxygen, ventilator or ambulance.
        #[arg(long)]
        category: ResourceCategory,
        #[arg(long, allow_negative_numbers = true)]
        total: i64,
        #[arg(long, allow_negative_numbers = true)]
        available: i64,
        #[arg(long, default_value = "cli")]
        user: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let data = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Could not read file {:?}", args.input))?;
    let config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Could not read config {path:?}"))?;
            serde_json::from_str::<SearchConfig>(&raw)
                .with_context(|| format!("Invalid config {path:?}"))?
        }
        None => SearchConfig::default(),
    };
    debug!("using config {config:?}");

    let store = Arc::new(MemoryStore::from_seed(parse_seed_str(&data)?)?);
    let finder = Finder::new(store.clone(), store.clone(), config.clone());

    match args.command {
        Command::Search {
            city,
            pincode,
            resource,
            available_only,
            radius,
            lat,
            lng,
            nearest,
        } => {
            let filters = SearchFilters {
                city,
                pincode,
                resource_type: resource,
                availability_only: available_only,
                radius_km: radius.unwrap_or(config.default_radius_km),
            };

            let provider: Box<dyn GeolocationProvider> = match (lat, lng) {
                (Some(lat), Some(lng)) => Box::new(FixedLocation(Coordinate::new(lat, lng)?)),
                _ if nearest => Box::new(NoLocation(BedFinderError::LocationUnavailable(
                    "no location given".to_string(),
                ))),
                _ => {
                    let catalog = finder.load().await?;
                    let hits = catalog.results(&SearchSession::new(filters), &config)?;
                    println!("Hospitals: {}", hits.len());
                    for hit in &hits {
                        print_hospital(&hit.to_ranked());
                    }
                    return Ok(());
                }
            };

            let nearest = finder.find_nearest(provider.as_ref(), &filters).await?;
            let origin = &nearest.origin;
            match origin.source {
                OriginSource::Device => println!(
                    "Origin: {:.4}, {:.4}",
                    origin.coordinate.latitude, origin.coordinate.longitude
                ),
                OriginSource::Fallback => println!(
                    "Origin: {:.4}, {:.4} (fallback: {})",
                    origin.coordinate.latitude,
                    origin.coordinate.longitude,
                    origin.fallback_reason.as_deref().unwrap_or("unknown")
                ),
            }
            println!(
                "Hospitals within {} km: {}",
                filters.radius_km,
                nearest.hospitals.len()
            );
            for hospital in &nearest.hospitals {
                print_hospital(hospital);
            }
        }
        Command::Stats => {
            let catalog = finder.load().await?;
            print_stats(&catalog.stats());
        }
        Command::Update {
            hospital,
            category,
            total,
            available,
            user,
        } => {
            let hospital_id = HospitalId::from(hospital);
            let dashboard =
                Dashboard::new(store.clone(), store.clone(), config.clone()).with_history(store);
            let edit = dashboard
                .edit_form(&hospital_id)
                .await?
                .with(category, EditedCounts::new(total, available));

            let before = finder.load().await?.stats();
            match dashboard.update_availability(&hospital_id, &edit, &user).await {
                Ok(snapshot) => {
                    let counts = snapshot.counts(category);
                    println!(
                        "Updated {hospital_id}: {} {}/{} available, {} in use",
                        category.label(),
                        counts.available,
                        counts.total,
                        counts.in_use
                    );
                    let after = finder.load().await?.stats();
                    println!(
                        "{} available across hospitals: {} -> {}",
                        category.label(),
                        before.category(category).total_available,
                        after.category(category).total_available
                    );
                }
                Err(err @ BedFinderError::Validation { .. }) => {
                    println!("Rejected: {err}");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    Ok(())
}

fn print_hospital(hospital: &RankedHospital) {
    let point = MapDataPoint::from_parts(
        &hospital.hospital,
        hospital.availability.as_ref(),
        hospital.distance_km,
    );
    let distance = hospital
        .distance_km
        .map(|km| format!("{km:>6.1} km"))
        .unwrap_or_else(|| "     --  ".to_string());
    println!(
        "{distance}  {} [{} {}]{}\n           {}",
        point.name,
        hospital.hospital.city,
        hospital.hospital.pincode,
        if hospital.hospital.is_verified {
            " verified"
        } else {
            ""
        },
        point.availability_summary
    );
}

fn print_stats(stats: &Stats) {
    println!(
        "Hospitals: {} ({} verified, {} reporting)",
        stats.total_hospitals, stats.verified_hospitals, stats.reporting_hospitals
    );
    for category in ResourceCategory::ALL {
        let entry = stats.category(category);
        println!(
            "{:<13} {:>6} / {:<6} {:>5.1}%",
            category.label(),
            entry.total_available,
            entry.total_capacity,
            entry.percent_available
        );
    }
}
