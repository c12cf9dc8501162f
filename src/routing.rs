//! Routing port: driving distance/duration between two points (§4.2).
//!
//! Two implementations share one contract: a primary HTTP-backed router
//! that falls through to a pure haversine-based estimate on any failure.
//! Every successful result, from either path, is cached by a hash of the
//! four coordinates.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::cache::{stable_key, CacheStore};
use crate::geo::haversine_km;

/// Empirical road-to-straight-line distance ratio used by the fallback.
const ROAD_TO_STRAIGHT_RATIO: f64 = 1.4;

/// Coordinate precision (decimal places) used when hashing cache keys, so
/// that near-duplicate float coordinates collide into one cache entry.
const CACHE_COORD_PRECISION: usize = 6;

/// One driving segment between two points.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub distance_km: f64,
    pub duration_min: f64,
    /// Google-Polyline-encoded geometry, when the primary route provider
    /// supplied one. The optimizer and scheduler never consult this field;
    /// it exists only for external map/ICS consumers.
    pub geometry: Option<String>,
}

/// A point sequence encoded as a Google Polyline Algorithm string.
pub type EncodedPolyline = String;

/// Segment distance + duration between two points, with a routing
/// geometry extension for external consumers (SPEC_FULL §4.2a).
pub trait RoutingPort: Send + Sync {
    fn segment(&self, from: (f64, f64), to: (f64, f64)) -> Segment;

    /// Per-leg encoded polylines along an ordered waypoint list. Returns
    /// `None` for any leg the provider could not geometry-ize (e.g. the
    /// fallback path never has geometry).
    fn route_geometry(&self, waypoints: &[(f64, f64)]) -> Vec<Option<EncodedPolyline>> {
        waypoints
            .windows(2)
            .map(|pair| self.segment(pair[0], pair[1]).geometry)
            .collect()
    }
}

/// Haversine-distance fallback: `distance * 1.4 / speed_kmh`.
#[derive(Debug, Clone)]
pub struct FallbackRouter {
    pub speed_kmh: f64,
}

impl Default for FallbackRouter {
    fn default() -> Self {
        Self { speed_kmh: 40.0 }
    }
}

impl FallbackRouter {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    pub fn estimate(&self, from: (f64, f64), to: (f64, f64)) -> Segment {
        let straight_km = haversine_km(from, to);
        let road_km = straight_km * ROAD_TO_STRAIGHT_RATIO;
        let duration_min = (road_km / self.speed_kmh) * 60.0;
        Segment {
            distance_km: road_km,
            duration_min,
            geometry: None,
        }
    }
}

impl RoutingPort for FallbackRouter {
    fn segment(&self, from: (f64, f64), to: (f64, f64)) -> Segment {
        self.estimate(from, to)
    }
}

/// Primary router configuration.
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub cache_ttl_days: u32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://router.project-osrm.org".to_string(),
            timeout_secs: 10,
            cache_ttl_days: 7,
        }
    }
}

/// HTTP-backed driving router with a pure fallback and a shared cache.
///
/// On any failure — network error, non-OK status, malformed payload, or
/// timeout — falls through to `FallbackRouter` rather than propagating an
/// error; routing failures are never surfaced to callers (§7).
pub struct PrimaryRouter {
    config: RoutingConfig,
    client: reqwest::blocking::Client,
    fallback: FallbackRouter,
    cache: Arc<dyn CacheStore>,
}

impl PrimaryRouter {
    pub fn new(config: RoutingConfig, fallback: FallbackRouter, cache: Arc<dyn CacheStore>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self {
            config,
            client,
            fallback,
            cache,
        }
    }

    fn cache_key(from: (f64, f64), to: (f64, f64)) -> String {
        stable_key(
            "route",
            &[
                format!("{:.*}", CACHE_COORD_PRECISION, from.0),
                format!("{:.*}", CACHE_COORD_PRECISION, from.1),
                format!("{:.*}", CACHE_COORD_PRECISION, to.0),
                format!("{:.*}", CACHE_COORD_PRECISION, to.1),
            ],
        )
    }

    fn call_provider(&self, from: (f64, f64), to: (f64, f64)) -> Option<Segment> {
        let url = format!(
            "{}/route/v1/driving/{:.6},{:.6};{:.6},{:.6}?overview=false",
            self.config.base_url, from.1, from.0, to.1, to.0
        );

        let response = self.client.get(&url).send().ok()?;
        if !response.status().is_success() {
            tracing::info!(status = %response.status(), "routing provider returned non-OK status");
            return None;
        }
        let body: OsrmRouteResponse = response.json().ok()?;
        if body.code != "Ok" {
            tracing::info!(code = %body.code, "routing provider reported error code");
            return None;
        }
        let route = body.routes.into_iter().next()?;
        Some(Segment {
            distance_km: route.distance / 1000.0,
            duration_min: route.duration / 60.0,
            geometry: route.geometry,
        })
    }
}

impl RoutingPort for PrimaryRouter {
    fn segment(&self, from: (f64, f64), to: (f64, f64)) -> Segment {
        let key = Self::cache_key(from, to);
        if let Some(cached) = self.cache.get(&key) {
            if let Ok(segment) = serde_json::from_str::<CachedSegment>(&cached) {
                return segment.into();
            }
        }

        let segment = self
            .call_provider(from, to)
            .unwrap_or_else(|| self.fallback.estimate(from, to));

        if let Ok(serialized) = serde_json::to_string(&CachedSegment::from(&segment)) {
            self.cache.put(&key, serialized, self.config.cache_ttl_days);
        }

        segment
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct CachedSegment {
    distance_km: f64,
    duration_min: f64,
    geometry: Option<String>,
}

impl From<&Segment> for CachedSegment {
    fn from(s: &Segment) -> Self {
        Self {
            distance_km: s.distance_km,
            duration_min: s.duration_min,
            geometry: s.geometry.clone(),
        }
    }
}

impl From<CachedSegment> for Segment {
    fn from(c: CachedSegment) -> Self {
        Self {
            distance_km: c.distance_km,
            duration_min: c.duration_min,
            geometry: c.geometry,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    #[serde(default)]
    geometry: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCacheStore;

    #[test]
    fn fallback_multiplies_and_converts_to_minutes() {
        let router = FallbackRouter::new(40.0);
        // 10 km straight-line at ratio 1.4 = 14 km road distance, at 40 km/h = 21 min.
        let segment = router.estimate((0.0, 0.0), (0.0, 0.0898315));
        assert!((segment.distance_km - 14.0).abs() < 0.5, "got {}", segment.distance_km);
        assert!(segment.geometry.is_none());
    }

    #[test]
    fn fallback_same_point_is_zero() {
        let router = FallbackRouter::default();
        let segment = router.estimate((30.5, -97.5), (30.5, -97.5));
        assert!(segment.distance_km < 1e-6);
        assert!(segment.duration_min < 1e-6);
    }

    #[test]
    fn primary_router_falls_back_when_provider_unreachable() {
        let cache: Arc<dyn CacheStore> = Arc::new(InMemoryCacheStore::new());
        let config = RoutingConfig {
            base_url: "http://127.0.0.1:1".to_string(), // nothing listens here
            timeout_secs: 1,
            cache_ttl_days: 7,
        };
        let router = PrimaryRouter::new(config, FallbackRouter::default(), cache);
        let segment = router.segment((30.5, -97.5), (30.6, -97.6));
        assert!(segment.distance_km > 0.0);
    }

    #[test]
    fn primary_router_caches_results() {
        let cache: Arc<dyn CacheStore> = Arc::new(InMemoryCacheStore::new());
        let config = RoutingConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 1,
            cache_ttl_days: 7,
        };
        let router = PrimaryRouter::new(config, FallbackRouter::default(), cache.clone());
        let from = (30.5, -97.5);
        let to = (30.6, -97.6);
        let first = router.segment(from, to);
        let key = PrimaryRouter::cache_key(from, to);
        assert!(cache.get(&key).is_some());
        let second = router.segment(from, to);
        assert_eq!(first, second);
    }

    #[test]
    fn route_geometry_collects_per_leg_geometry() {
        let router = FallbackRouter::default();
        let waypoints = [(30.5, -97.5), (30.6, -97.6), (30.7, -97.7)];
        let legs = router.route_geometry(&waypoints);
        assert_eq!(legs.len(), 2);
        assert!(legs.iter().all(|g| g.is_none()));
    }
}
