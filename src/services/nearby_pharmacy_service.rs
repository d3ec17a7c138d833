use std::collections::HashMap;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::database::{pharmacy_profiles_repo, subscriptions_repo};
use crate::error::LocatorError;
use crate::models::{Coordinate, PharmacyCandidate, Subscription};
use crate::services::distance_service::{
    bounding_box, DistanceEstimate, DistanceEstimator, DistanceSource,
};
use crate::services::routing_service::build_route_lookup;

pub const DEFAULT_MIN_DISTANCE_KM: f64 = 0.0;
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 30.0;
/// Caller-supplied max distances are never tighter than this.
pub const MIN_MAX_DISTANCE_KM: f64 = 30.0;
/// Hard ceiling; auto-expansion widens to exactly this.
pub const MAX_DISTANCE_CEILING_KM: f64 = 200.0;
pub const DEFAULT_ROUTING_CONCURRENCY: usize = 8;

#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub default_max_distance_km: f64,
    pub min_max_distance_km: f64,
    pub max_distance_ceiling_km: f64,
    /// Upper bound on in-flight routing lookups per request.
    pub concurrency: usize,
    /// Treat every verified pharmacy as subscribed. Startup flag for test environments.
    pub bypass_subscription_check: bool,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            default_max_distance_km: DEFAULT_MAX_DISTANCE_KM,
            min_max_distance_km: MIN_MAX_DISTANCE_KM,
            max_distance_ceiling_km: MAX_DISTANCE_CEILING_KM,
            concurrency: DEFAULT_ROUTING_CONCURRENCY,
            bypass_subscription_check: false,
        }
    }
}

/// Inclusive `[min_km, max_km]` search band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceWindow {
    pub min_km: f64,
    pub max_km: f64,
}

impl ResolverSettings {
    /// Absent or non-finite bounds take the defaults; max is clamped into
    /// `[min_max_distance_km, max_distance_ceiling_km]` and min into `[0, max]`.
    pub fn window(&self, min_km: Option<f64>, max_km: Option<f64>) -> DistanceWindow {
        let max_km = max_km
            .filter(|v| v.is_finite())
            .unwrap_or(self.default_max_distance_km)
            .max(self.min_max_distance_km)
            .min(self.max_distance_ceiling_km);
        let min_km = min_km
            .filter(|v| v.is_finite())
            .unwrap_or(DEFAULT_MIN_DISTANCE_KM)
            .max(0.0)
            .min(max_km);
        DistanceWindow { min_km, max_km }
    }

    pub fn default_window(&self) -> DistanceWindow {
        self.window(None, None)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyPharmacy {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Rounded to one decimal.
    pub distance_km: f64,
    pub distance_source: DistanceSource,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyPharmacies {
    pub pharmacies: Vec<NearbyPharmacy>,
    pub auto_expanded: bool,
    pub effective_max_distance_km: f64,
}

impl NearbyPharmacies {
    pub fn empty(window: DistanceWindow) -> Self {
        Self {
            pharmacies: Vec::new(),
            auto_expanded: false,
            effective_max_distance_km: window.max_km,
        }
    }
}

/// Shared, immutable discovery context handed to every request.
#[derive(Clone)]
pub struct PharmacyLocator {
    pub estimator: DistanceEstimator,
    pub settings: ResolverSettings,
}

impl PharmacyLocator {
    pub fn new(estimator: DistanceEstimator, settings: ResolverSettings) -> Self {
        if settings.bypass_subscription_check {
            warn!("💊 Subscription check bypassed: every verified pharmacy is eligible");
        }
        Self {
            estimator,
            settings,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, LocatorError> {
        let routes = build_route_lookup(&config.routing)?;
        let estimator = DistanceEstimator::new(routes, config.road_correction_factor);
        Ok(Self::new(estimator, config.resolver.clone()))
    }

    /// Best-effort list: a store failure is logged and yields an empty result.
    pub async fn find_nearby(
        &self,
        pool: &SqlitePool,
        requester: Coordinate,
        window: DistanceWindow,
    ) -> NearbyPharmacies {
        let candidates = match load_candidates(
            pool,
            requester,
            self.settings.max_distance_ceiling_km,
            !self.settings.bypass_subscription_check,
        )
        .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                error!("💊 Nearby pharmacy lookup degraded to empty: {}", e);
                return NearbyPharmacies::empty(window);
            }
        };

        resolve_nearby_pharmacies(
            &self.estimator,
            &self.settings,
            requester,
            &candidates,
            window,
        )
        .await
    }
}

/// Verified pharmacies inside the bounding box of `radius_km`, with their subscriptions.
/// `require_active_subscription` drops pharmacies without any `active` row up front.
pub async fn load_candidates(
    pool: &SqlitePool,
    requester: Coordinate,
    radius_km: f64,
    require_active_subscription: bool,
) -> Result<Vec<PharmacyCandidate>, LocatorError> {
    let bbox = bounding_box(requester, radius_km);
    let rows = pharmacy_profiles_repo::list_verified_near(
        pool,
        requester,
        bbox,
        require_active_subscription,
    )
        .await
        .map_err(LocatorError::CandidateDataUnavailable)?;

    let ids = rows.iter().map(|r| r.id.as_str()).collect::<Vec<_>>();
    let subscription_rows = subscriptions_repo::list_for_pharmacies(pool, &ids)
        .await
        .map_err(LocatorError::CandidateDataUnavailable)?;

    let mut by_pharmacy: HashMap<String, Vec<Subscription>> = HashMap::new();
    for row in &subscription_rows {
        match Subscription::from_row(row) {
            Some(sub) => by_pharmacy
                .entry(row.pharmacy_id.clone())
                .or_default()
                .push(sub),
            None => warn!(
                "💊 Ignoring subscription {} with unknown status '{}'",
                row.id, row.status
            ),
        }
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let subs = by_pharmacy.remove(&row.id).unwrap_or_default();
            PharmacyCandidate::from_row(row, subs)
        })
        .collect())
}

pub async fn resolve_nearby_pharmacies(
    estimator: &DistanceEstimator,
    settings: &ResolverSettings,
    requester: Coordinate,
    candidates: &[PharmacyCandidate],
    window: DistanceWindow,
) -> NearbyPharmacies {
    resolve_nearby_pharmacies_at(estimator, settings, requester, candidates, window, Utc::now())
        .await
}

/// Same as [`resolve_nearby_pharmacies`] with subscription validity judged at `now`.
pub async fn resolve_nearby_pharmacies_at(
    estimator: &DistanceEstimator,
    settings: &ResolverSettings,
    requester: Coordinate,
    candidates: &[PharmacyCandidate],
    window: DistanceWindow,
    now: DateTime<Utc>,
) -> NearbyPharmacies {
    let eligible = candidates
        .iter()
        .filter_map(|candidate| {
            if !candidate.verified {
                debug!("💊 {} skipped: not verified", candidate.id);
                return None;
            }
            if !settings.bypass_subscription_check && !candidate.has_active_subscription(now) {
                debug!("💊 {} skipped: no active subscription", candidate.id);
                return None;
            }
            match candidate.coordinate() {
                Ok(coordinate) => Some((candidate, coordinate)),
                Err(e) => {
                    debug!("💊 {} skipped: {}", candidate.id, e);
                    None
                }
            }
        })
        .collect::<Vec<_>>();

    // buffered() keeps input order, so the stable sort below breaks ties by it.
    let destinations = eligible.iter().map(|(_, c)| *c).collect::<Vec<_>>();
    let estimates = stream::iter(destinations)
        .map(move |destination| {
            let estimator = estimator.clone();
            async move { estimator.estimate(requester, destination).await }
        })
        .buffered(settings.concurrency.max(1))
        .collect::<Vec<_>>()
        .await;

    let mut measured = eligible
        .into_iter()
        .zip(estimates)
        .filter_map(|((candidate, coordinate), estimate)| {
            if estimate.is_none() {
                debug!("💊 {} skipped: distance unknown", candidate.id);
            }
            estimate.map(|e| (candidate, coordinate, e))
        })
        .collect::<Vec<_>>();

    measured.sort_by(|a, b| a.2.km.total_cmp(&b.2.km));

    let mut pharmacies = within_window(&measured, window.min_km, window.max_km);
    let mut auto_expanded = false;
    let mut effective_max_distance_km = window.max_km;

    if pharmacies.is_empty() && window.max_km < settings.max_distance_ceiling_km {
        auto_expanded = true;
        effective_max_distance_km = settings.max_distance_ceiling_km;
        pharmacies = within_window(&measured, window.min_km, effective_max_distance_km);
    }

    info!(
        "💊 {} of {} candidates within {}-{} km (auto_expanded={})",
        pharmacies.len(),
        candidates.len(),
        window.min_km,
        effective_max_distance_km,
        auto_expanded
    );

    NearbyPharmacies {
        pharmacies,
        auto_expanded,
        effective_max_distance_km,
    }
}

fn within_window(
    measured: &[(&PharmacyCandidate, Coordinate, DistanceEstimate)],
    min_km: f64,
    max_km: f64,
) -> Vec<NearbyPharmacy> {
    measured
        .iter()
        .filter_map(|(candidate, coordinate, estimate)| {
            let distance_km = round_one_decimal(estimate.km);
            if distance_km < min_km || distance_km > max_km {
                return None;
            }
            Some(NearbyPharmacy {
                id: candidate.id.clone(),
                name: candidate.name.clone(),
                latitude: coordinate.latitude(),
                longitude: coordinate.longitude(),
                address: candidate.address.clone(),
                phone: candidate.phone.clone(),
                distance_km,
                distance_source: estimate.source,
            })
        })
        .collect()
}

fn round_one_decimal(km: f64) -> f64 {
    (km * 10.0).round() / 10.0
}
