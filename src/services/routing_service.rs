use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::error::LocatorError;
use crate::models::Coordinate;

pub const DEFAULT_ROUTING_API_URL: &str = "https://router.project-osrm.org";
pub const DEFAULT_ROUTING_TIMEOUT: Duration = Duration::from_secs(4);

#[derive(Debug, Clone)]
pub struct RoutingConfig {
    pub enabled: bool,
    pub base_url: String,
    /// Per-request budget; an expired call degrades only that pair to the fallback.
    pub timeout: Duration,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_ROUTING_API_URL.to_string(),
            timeout: DEFAULT_ROUTING_TIMEOUT,
        }
    }
}

/// Road distance between two points, in kilometers.
#[async_trait]
pub trait RouteLookup: Send + Sync {
    async fn road_distance_km(&self, from: Coordinate, to: Coordinate)
        -> Result<f64, LocatorError>;
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    code: Option<String>,
    routes: Option<Vec<RouteHit>>,
}

#[derive(Debug, Deserialize)]
struct RouteHit {
    /// Meters.
    distance: Option<f64>,
}

/// Client for an OSRM-compatible `/route/v1/driving` endpoint.
pub struct OsrmClient {
    client: reqwest::Client,
    base_url: String,
}

impl OsrmClient {
    pub fn new(config: &RoutingConfig) -> Result<Self, LocatorError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LocatorError::Config(format!("routing client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn route_url(&self, from: Coordinate, to: Coordinate) -> String {
        // OSRM takes lon,lat order.
        format!(
            "{}/route/v1/driving/{},{};{},{}?overview=false",
            self.base_url,
            from.longitude(),
            from.latitude(),
            to.longitude(),
            to.latitude()
        )
    }
}

#[async_trait]
impl RouteLookup for OsrmClient {
    async fn road_distance_km(
        &self,
        from: Coordinate,
        to: Coordinate,
    ) -> Result<f64, LocatorError> {
        let url = self.route_url(from, to);
        let resp = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(LocatorError::RoutingUnavailable(format!(
                "routing upstream non-OK: {}",
                resp.status()
            )));
        }

        let parsed: RouteResponse = resp.json().await.map_err(|e| {
            LocatorError::RoutingUnavailable(format!("routing JSON parse failed: {}", e))
        })?;

        if let Some(code) = parsed.code.as_deref().filter(|c| *c != "Ok") {
            return Err(LocatorError::RoutingUnavailable(format!(
                "routing returned code {}",
                code
            )));
        }

        let meters = parsed
            .routes
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|r| r.distance)
            .ok_or_else(|| LocatorError::RoutingUnavailable("no routes".to_string()))?;

        if !meters.is_finite() || meters <= 0.0 {
            return Err(LocatorError::RoutingUnavailable(format!(
                "unusable route distance {}",
                meters
            )));
        }

        Ok(meters / 1000.0)
    }
}

/// `None` when routing is switched off; the estimator then uses the fallback only.
pub fn build_route_lookup(
    config: &RoutingConfig,
) -> Result<Option<Arc<dyn RouteLookup>>, LocatorError> {
    if !config.enabled {
        info!("🧭 Routing disabled, distances use the great-circle estimate");
        return Ok(None);
    }
    let client = OsrmClient::new(config)?;
    info!(
        "🧭 Routing via {} (timeout {:?})",
        client.base_url, config.timeout
    );
    Ok(Some(Arc::new(client)))
}
