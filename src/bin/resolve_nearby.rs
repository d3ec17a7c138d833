use std::env;

use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

use pharmacy_locator::config::AppConfig;
use pharmacy_locator::database;
use pharmacy_locator::models::Coordinate;
use pharmacy_locator::services::nearby_pharmacy_service::PharmacyLocator;

/// Prints what the resolver returns for NEARBY_LAT / NEARBY_LON (optional NEARBY_MIN_KM, NEARBY_MAX_KM).
#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config: {}", e);
            std::process::exit(1);
        }
    };

    let requester = match Coordinate::from_parts(env_f64("NEARBY_LAT"), env_f64("NEARBY_LON")) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("NEARBY_LAT/NEARBY_LON: {}", e);
            std::process::exit(2);
        }
    };

    let pool = match database::connect(&config.database_url).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("database: {}", e);
            std::process::exit(1);
        }
    };

    let locator = match PharmacyLocator::from_config(&config) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("locator: {}", e);
            std::process::exit(1);
        }
    };

    let window = locator
        .settings
        .window(env_f64("NEARBY_MIN_KM"), env_f64("NEARBY_MAX_KM"));
    let result = locator.find_nearby(&pool, requester, window).await;

    for p in &result.pharmacies {
        println!(
            "{:>7.1} km  {:<9} {}  ({}, {})",
            p.distance_km,
            format!("{:?}", p.distance_source).to_lowercase(),
            p.name,
            p.latitude,
            p.longitude
        );
    }
    println!(
        "{} pharmacies within {}-{} km (auto_expanded={})",
        result.pharmacies.len(),
        window.min_km,
        result.effective_max_distance_km,
        result.auto_expanded
    );
}

fn env_f64(key: &str) -> Option<f64> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
