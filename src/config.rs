use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::error::LocatorError;
use crate::services::distance_service::DEFAULT_ROAD_CORRECTION_FACTOR;
use crate::services::nearby_pharmacy_service::ResolverSettings;
use crate::services::routing_service::RoutingConfig;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub run_migrations: bool,
    pub routing: RoutingConfig,
    pub road_correction_factor: f64,
    pub resolver: ResolverSettings,
}

impl AppConfig {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, LocatorError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, LocatorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| LocatorError::Config("DATABASE_URL must be set".to_string()))?;

        let routing_defaults = RoutingConfig::default();
        let routing = RoutingConfig {
            enabled: parse_flag(&lookup, "ROUTING_ENABLED", routing_defaults.enabled)?,
            base_url: lookup("ROUTING_API_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(routing_defaults.base_url),
            timeout: Duration::from_millis(parse_var(
                &lookup,
                "ROUTING_TIMEOUT_MS",
                routing_defaults.timeout.as_millis() as u64,
            )?),
        };

        let defaults = ResolverSettings::default();
        let resolver = ResolverSettings {
            default_max_distance_km: parse_var(
                &lookup,
                "DEFAULT_MAX_DISTANCE_KM",
                defaults.default_max_distance_km,
            )?,
            min_max_distance_km: parse_var(
                &lookup,
                "MIN_MAX_DISTANCE_KM",
                defaults.min_max_distance_km,
            )?,
            max_distance_ceiling_km: parse_var(
                &lookup,
                "MAX_DISTANCE_CEILING_KM",
                defaults.max_distance_ceiling_km,
            )?,
            concurrency: parse_var(&lookup, "ROUTING_CONCURRENCY", defaults.concurrency)?.max(1),
            bypass_subscription_check: parse_flag(
                &lookup,
                "BYPASS_SUBSCRIPTION_CHECK",
                defaults.bypass_subscription_check,
            )?,
        };

        if resolver.min_max_distance_km > resolver.max_distance_ceiling_km {
            return Err(LocatorError::Config(format!(
                "MIN_MAX_DISTANCE_KM ({}) exceeds MAX_DISTANCE_CEILING_KM ({})",
                resolver.min_max_distance_km, resolver.max_distance_ceiling_km
            )));
        }

        let road_correction_factor = parse_var(
            &lookup,
            "ROAD_CORRECTION_FACTOR",
            DEFAULT_ROAD_CORRECTION_FACTOR,
        )?;
        if !road_correction_factor.is_finite() || road_correction_factor < 1.0 {
            return Err(LocatorError::Config(format!(
                "ROAD_CORRECTION_FACTOR must be a finite value >= 1.0, got {}",
                road_correction_factor
            )));
        }

        Ok(AppConfig {
            database_url,
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_var(&lookup, "PORT", 3000)?,
            run_migrations: parse_flag(&lookup, "RUN_MIGRATIONS", false)?,
            routing,
            road_correction_factor,
            resolver,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, LocatorError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .parse()
            .map_err(|e| LocatorError::Config(format!("{}={:?}: {}", key, raw, e))),
        None => Ok(default),
    }
}

fn parse_flag<F>(lookup: &F, key: &str, default: bool) -> Result<bool, LocatorError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key).map(|v| v.trim().to_lowercase()).filter(|v| !v.is_empty()) else {
        return Ok(default);
    };
    match raw.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(LocatorError::Config(format!(
            "{}={:?} is not a boolean",
            key, raw
        ))),
    }
}
