use std::net::SocketAddr;
use std::sync::Arc;

use dotenvy::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use pharmacy_locator::config::AppConfig;
use pharmacy_locator::database;
use pharmacy_locator::services::nearby_pharmacy_service::PharmacyLocator;
use pharmacy_locator::web::{self, AppState};

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        error!("❌ Server stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    info!("🗄️  Connecting to database: {}", config.database_url);
    let pool = database::connect(&config.database_url).await?;
    if config.run_migrations {
        database::run_migrations(&pool).await?;
        info!("🗄️  Migrations applied");
    }

    let locator = PharmacyLocator::from_config(&config)?;
    let app = web::router(AppState {
        pool,
        locator: Arc::new(locator),
    });

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            let fallback: SocketAddr =
                format!("{}:{}", config.host, config.port.saturating_add(1)).parse()?;
            warn!(
                "⚠️  Could not bind {}: {}. Trying fallback {}",
                addr, e, fallback
            );
            tokio::net::TcpListener::bind(fallback).await?
        }
    };

    info!("🚀 Pharmacy locator listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
