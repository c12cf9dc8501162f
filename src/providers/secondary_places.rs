//! Secondary places adapter: a commercial place-search API operating in
//! meters, distance-ranked, not rate-limited by the adapter itself — the
//! provider is assumed to enforce its own quota (§4.3 adapter 2).

use std::sync::Arc;

use serde::Deserialize;

use crate::cache::{stable_key, CacheStore};
use crate::geo::{haversine_km, km_to_miles};
use crate::model::PlaceSource;

use super::{precision_from_type, sort_multi_hits, GeocodeHit, ProviderAdapter};

#[derive(Debug, Clone)]
pub struct SecondaryPlacesConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
    pub cache_ttl_days: u32,
    /// Results farther than this from the query's center are dropped
    /// after the call returns (the provider itself is not radius-bounded).
    pub max_miles: f64,
}

impl Default for SecondaryPlacesConfig {
    fn default() -> Self {
        Self {
            base_url: "https://places.example.com/v1".to_string(),
            api_key: String::new(),
            timeout_secs: 10,
            cache_ttl_days: 7,
            max_miles: 25.0,
        }
    }
}

pub struct SecondaryPlaces {
    config: SecondaryPlacesConfig,
    client: reqwest::blocking::Client,
    cache: Arc<dyn CacheStore>,
}

impl SecondaryPlaces {
    pub fn new(config: SecondaryPlacesConfig, cache: Arc<dyn CacheStore>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self { config, client, cache }
    }

    fn call(&self, query: &str, center: (f64, f64), limit: usize) -> Vec<PlaceHit> {
        let key = stable_key(
            "secondary_places",
            &[
                query.to_string(),
                format!("{:.4}", center.0),
                format!("{:.4}", center.1),
                limit.to_string(),
            ],
        );
        if let Some(cached) = self.cache.get(&key).and_then(|raw| serde_json::from_str(&raw).ok()) {
            return cached;
        }

        let radius_m = (self.config.max_miles * 1609.34).round() as i64;
        let url = format!(
            "{}/nearbysearch?keyword={}&location={:.6},{:.6}&radius={}&key={}",
            self.config.base_url, query, center.0, center.1, radius_m, self.config.api_key
        );

        let places = self
            .client
            .get(&url)
            .send()
            .ok()
            .filter(|r| r.status().is_success())
            .and_then(|r| r.json::<PlacesResponse>().ok())
            .map(|body| body.results)
            .unwrap_or_else(|| {
                tracing::info!(query, "secondary places request failed, returning no results");
                Vec::new()
            });

        if let Ok(raw) = serde_json::to_string(&places) {
            self.cache.put(&key, raw, self.config.cache_ttl_days);
        }
        places
    }
}

impl ProviderAdapter for SecondaryPlaces {
    fn geocode(&self, text: &str) -> Option<GeocodeHit> {
        // The secondary provider has no free-standing geocode endpoint in
        // this API shape; address resolution is the primary geocoder's job.
        self.search_nearby(text, (0.0, 0.0), 0.0, 1).into_iter().next()
    }

    fn geocode_multi(&self, text: &str, limit: usize, bias: Option<(f64, f64)>) -> Vec<GeocodeHit> {
        let center = bias.unwrap_or((0.0, 0.0));
        let mut hits = self.search_nearby(text, center, self.config.max_miles, limit);
        sort_multi_hits(&mut hits, bias);
        hits
    }

    fn search_nearby(&self, query: &str, center: (f64, f64), _radius_km: f64, limit: usize) -> Vec<GeocodeHit> {
        let mut hits: Vec<GeocodeHit> = self
            .call(query, center, limit)
            .into_iter()
            .map(|p| p.into_hit(center))
            .filter(|hit| km_to_miles(haversine_km(center, (hit.lat, hit.lon))) <= self.config.max_miles)
            .collect();
        hits.sort_by(|a, b| {
            let da = haversine_km(center, (a.lat, a.lon));
            let db = haversine_km(center, (b.lat, b.lon));
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);
        hits
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct PlacesResponse {
    #[serde(default)]
    results: Vec<PlaceHit>,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct PlaceHit {
    name: String,
    #[serde(default)]
    vicinity: Option<String>,
    geometry: PlaceGeometry,
    #[serde(default)]
    place_id: Option<String>,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    rating: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct PlaceGeometry {
    location: PlaceLocation,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct PlaceLocation {
    lat: f64,
    lng: f64,
}

impl PlaceHit {
    fn into_hit(self, _center: (f64, f64)) -> GeocodeHit {
        let place_type = self.types.first().cloned().unwrap_or_default();
        GeocodeHit {
            name: self.name,
            address: self.vicinity.unwrap_or_default(),
            lat: self.geometry.location.lat,
            lon: self.geometry.location.lng,
            source: PlaceSource::SecondaryGeocoder,
            external_id: self.place_id,
            place_type: Some(place_type.clone()),
            precision: precision_from_type(&place_type),
            importance: self.rating.unwrap_or(0.0),
        }
    }
}
