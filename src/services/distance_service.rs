use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::models::Coordinate;
use crate::services::routing_service::RouteLookup;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Straight-line distance understates driving distance; the fallback multiplies by this.
/// Product-chosen approximation, not a derived value.
pub const DEFAULT_ROAD_CORRECTION_FACTOR: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceSource {
    /// Reported by the routing service.
    Road,
    /// Great-circle distance times the correction factor.
    Estimated,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceEstimate {
    pub km: f64,
    pub source: DistanceSource,
}

pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.latitude().to_radians();
    let lat2 = to.latitude().to_radians();
    let dlat = (to.latitude() - from.latitude()).to_radians();
    let dlon = (to.longitude() - from.longitude()).to_radians();
    let a = ((dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2))
        .clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Degree box enclosing every point within a radius of a center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Longitude spans to query, split in two when the box crosses the antimeridian.
    pub fn longitude_ranges(&self) -> Vec<(f64, f64)> {
        if self.max_lon - self.min_lon >= 360.0 {
            return vec![(-180.0, 180.0)];
        }
        if self.min_lon < -180.0 {
            vec![(self.min_lon + 360.0, 180.0), (-180.0, self.max_lon)]
        } else if self.max_lon > 180.0 {
            vec![(self.min_lon, 180.0), (-180.0, self.max_lon - 360.0)]
        } else {
            vec![(self.min_lon, self.max_lon)]
        }
    }
}

pub fn bounding_box(center: Coordinate, radius_km: f64) -> BoundingBox {
    let lat = center.latitude();
    let lon = center.longitude();
    let lat_change = radius_km / 111.0;
    // Infinite at the poles, which longitude_ranges() turns into the full circle.
    let lon_change = (radius_km / 111.0) / lat.to_radians().cos().abs();

    BoundingBox {
        min_lat: (lat - lat_change).max(-90.0),
        max_lat: (lat + lat_change).min(90.0),
        min_lon: lon - lon_change,
        max_lon: lon + lon_change,
    }
}

/// Two-tier road distance: routing service first, corrected great-circle second.
#[derive(Clone)]
pub struct DistanceEstimator {
    routes: Option<Arc<dyn RouteLookup>>,
    road_correction_factor: f64,
}

impl DistanceEstimator {
    pub fn new(routes: Option<Arc<dyn RouteLookup>>, road_correction_factor: f64) -> Self {
        Self {
            routes,
            road_correction_factor,
        }
    }

    pub fn straight_line(road_correction_factor: f64) -> Self {
        Self::new(None, road_correction_factor)
    }

    pub fn road_correction_factor(&self) -> f64 {
        self.road_correction_factor
    }

    pub fn estimated_road_km(&self, from: Coordinate, to: Coordinate) -> Option<f64> {
        let km = haversine_km(from, to) * self.road_correction_factor;
        (km.is_finite() && km >= 0.0).then_some(km)
    }

    /// `None` means both tiers failed; callers must exclude the pair, not treat it as zero.
    pub async fn estimate(&self, from: Coordinate, to: Coordinate) -> Option<DistanceEstimate> {
        if let Some(routes) = &self.routes {
            match routes.road_distance_km(from, to).await {
                Ok(km) if km.is_finite() && km > 0.0 => {
                    return Some(DistanceEstimate {
                        km,
                        source: DistanceSource::Road,
                    });
                }
                Ok(km) => {
                    warn!("🧭 Routing returned unusable distance {}, falling back", km);
                }
                Err(e) => {
                    warn!("🧭 {}, falling back to great-circle estimate", e);
                }
            }
        }

        match self.estimated_road_km(from, to) {
            Some(km) => Some(DistanceEstimate {
                km,
                source: DistanceSource::Estimated,
            }),
            None => {
                debug!(
                    "🧭 No distance for ({}, {}) -> ({}, {})",
                    from.latitude(),
                    from.longitude(),
                    to.latitude(),
                    to.longitude()
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LocatorError;
    use async_trait::async_trait;

    struct FixedRoute(Result<f64, ()>);

    #[async_trait]
    impl RouteLookup for FixedRoute {
        async fn road_distance_km(
            &self,
            _from: Coordinate,
            _to: Coordinate,
        ) -> Result<f64, LocatorError> {
            self.0
                .map_err(|_| LocatorError::RoutingUnavailable("connection refused".into()))
        }
    }

    fn algiers() -> Coordinate {
        Coordinate::new(36.7538, 3.0588).unwrap()
    }

    fn skikda() -> Coordinate {
        Coordinate::new(36.2868, 7.9732).unwrap()
    }

    fn estimator_with(route: Result<f64, ()>) -> DistanceEstimator {
        DistanceEstimator::new(
            Some(Arc::new(FixedRoute(route))),
            DEFAULT_ROAD_CORRECTION_FACTOR,
        )
    }

    #[test]
    fn haversine_matches_reference() {
        // Reference computed independently for these coordinates.
        let km = haversine_km(algiers(), skikda());
        assert!((km - 442.17).abs() < 442.17 * 0.01, "got {}", km);
    }

    #[test]
    fn haversine_is_symmetric_and_zero_on_identity() {
        let a = algiers();
        let b = skikda();
        assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-9);
        assert_eq!(haversine_km(a, a), 0.0);
    }

    #[test]
    fn haversine_is_finite_for_antipodes() {
        let a = Coordinate::new(0.0, 0.0).unwrap();
        let b = Coordinate::new(0.0, 180.0).unwrap();
        let km = haversine_km(a, b);
        assert!(km.is_finite());
        assert!((km - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn corrected_estimate_is_exactly_scaled() {
        let estimator = DistanceEstimator::straight_line(DEFAULT_ROAD_CORRECTION_FACTOR);
        let raw = haversine_km(algiers(), skikda());
        assert_eq!(estimator.estimated_road_km(algiers(), skikda()), Some(raw * 1.2));
    }

    #[test]
    fn bounding_box_contains_center() {
        let bbox = bounding_box(algiers(), 30.0);
        assert!(bbox.min_lat < 36.7538 && 36.7538 < bbox.max_lat);
        assert!(bbox.min_lon < 3.0588 && 3.0588 < bbox.max_lon);
        assert!((bbox.max_lat - bbox.min_lat - 60.0 / 111.0).abs() < 1e-9);
        assert_eq!(bbox.longitude_ranges(), vec![(bbox.min_lon, bbox.max_lon)]);
    }

    #[test]
    fn bounding_box_splits_at_the_antimeridian() {
        let east = bounding_box(Coordinate::new(-17.7, 179.9).unwrap(), 200.0);
        let ranges = east.longitude_ranges();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0], (east.min_lon, 180.0));
        assert_eq!(ranges[1].0, -180.0);
        assert!((ranges[1].1 - (east.max_lon - 360.0)).abs() < 1e-9);
        assert!(ranges[1].1 > -179.0);

        let west = bounding_box(Coordinate::new(-17.7, -179.9).unwrap(), 200.0);
        let ranges = west.longitude_ranges();
        assert_eq!(ranges.len(), 2);
        assert!(ranges[0].0 < 179.0 && ranges[0].1 == 180.0);
        assert_eq!(ranges[1], (-180.0, west.max_lon));
    }

    #[test]
    fn bounding_box_at_the_pole_covers_every_longitude() {
        let bbox = bounding_box(Coordinate::new(90.0, 0.0).unwrap(), 200.0);
        assert_eq!(bbox.longitude_ranges(), vec![(-180.0, 180.0)]);
        assert_eq!(bbox.max_lat, 90.0);
    }

    #[tokio::test]
    async fn road_distance_wins_when_available() {
        let estimate = estimator_with(Ok(512.4))
            .estimate(algiers(), skikda())
            .await
            .unwrap();
        assert_eq!(estimate.km, 512.4);
        assert_eq!(estimate.source, DistanceSource::Road);
    }

    #[tokio::test]
    async fn routing_error_falls_back_to_corrected_haversine() {
        let estimate = estimator_with(Err(()))
            .estimate(algiers(), skikda())
            .await
            .unwrap();
        assert_eq!(estimate.source, DistanceSource::Estimated);
        assert_eq!(estimate.km, haversine_km(algiers(), skikda()) * 1.2);
        assert!(estimate.km > 0.0);
    }

    #[tokio::test]
    async fn unusable_route_distances_fall_back() {
        for bad in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            let estimate = estimator_with(Ok(bad))
                .estimate(algiers(), skikda())
                .await
                .unwrap();
            assert_eq!(estimate.source, DistanceSource::Estimated);
            assert!(estimate.km.is_finite() && estimate.km > 0.0);
        }
    }

    #[tokio::test]
    async fn straight_line_estimator_never_calls_routing() {
        let estimate = DistanceEstimator::straight_line(1.2)
            .estimate(algiers(), algiers())
            .await
            .unwrap();
        assert_eq!(estimate.km, 0.0);
        assert_eq!(estimate.source, DistanceSource::Estimated);
    }
}
