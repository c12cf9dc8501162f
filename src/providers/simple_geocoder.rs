//! Primary geocoder adapter: a free, rate-limited geocoding service
//! (Nominatim-shaped), viewport-bounded on nearby search (§4.3 adapter 1).

use std::sync::Arc;

use serde::Deserialize;

use crate::cache::{stable_key, CacheStore};
use crate::geo::BoundingBox;
use crate::model::PlaceSource;

use super::{precision_from_type, sort_multi_hits, GeocodeHit, ProviderAdapter, RateGate};

#[derive(Debug, Clone)]
pub struct PrimaryGeocoderConfig {
    pub base_url: String,
    pub user_agent: String,
    pub rate_limit_s: f64,
    pub timeout_secs: u64,
    pub cache_ttl_days: u32,
}

impl Default for PrimaryGeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: "errand-planner/0.1".to_string(),
            rate_limit_s: 1.0,
            timeout_secs: 10,
            cache_ttl_days: 7,
        }
    }
}

pub struct PrimaryGeocoder {
    config: PrimaryGeocoderConfig,
    client: reqwest::blocking::Client,
    gate: RateGate,
    cache: Arc<dyn CacheStore>,
}

impl PrimaryGeocoder {
    pub fn new(config: PrimaryGeocoderConfig, cache: Arc<dyn CacheStore>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        let gate = RateGate::new(config.rate_limit_s);
        Self { config, client, gate, cache }
    }

    fn get_cached(&self, key: &str) -> Option<Vec<NominatimPlace>> {
        let raw = self.cache.get(key)?;
        serde_json::from_str(&raw).ok()
    }

    fn put_cached(&self, key: &str, places: &[NominatimPlace]) {
        if let Ok(raw) = serde_json::to_string(places) {
            self.cache.put(key, raw, self.config.cache_ttl_days);
        }
    }

    fn fetch(&self, key: String, url: String) -> Vec<NominatimPlace> {
        if let Some(cached) = self.get_cached(&key) {
            return cached;
        }

        self.gate.acquire();
        let result = self
            .client
            .get(&url)
            .header("User-Agent", &self.config.user_agent)
            .send()
            .ok()
            .filter(|r| r.status().is_success())
            .and_then(|r| r.json::<Vec<NominatimPlace>>().ok());

        match result {
            Some(places) => {
                self.put_cached(&key, &places);
                places
            }
            None => {
                tracing::info!(url, "primary geocoder request failed, returning no results");
                Vec::new()
            }
        }
    }

    fn search_url(&self, text: &str, limit: usize, viewbox: Option<BoundingBox>) -> String {
        let mut url = format!(
            "{}/search?q={}&format=json&limit={}&addressdetails=1",
            self.config.base_url,
            urlencoding_lite(text),
            limit,
        );
        if let Some(bb) = viewbox {
            url.push_str(&format!(
                "&viewbox={:.6},{:.6},{:.6},{:.6}&bounded=1",
                bb.min_lon, bb.max_lat, bb.max_lon, bb.min_lat
            ));
        }
        url
    }
}

impl ProviderAdapter for PrimaryGeocoder {
    fn geocode(&self, text: &str) -> Option<GeocodeHit> {
        let key = stable_key("primary_geocode", &[text.to_string()]);
        let url = self.search_url(text, 1, None);
        self.fetch(key, url).into_iter().next().map(NominatimPlace::into_hit)
    }

    fn geocode_multi(&self, text: &str, limit: usize, bias: Option<(f64, f64)>) -> Vec<GeocodeHit> {
        let key = stable_key("primary_geocode_multi", &[text.to_string(), limit.to_string()]);
        let url = self.search_url(text, limit, None);
        let mut hits: Vec<GeocodeHit> = self
            .fetch(key, url)
            .into_iter()
            .take(limit)
            .map(NominatimPlace::into_hit)
            .collect();
        sort_multi_hits(&mut hits, bias);
        hits
    }

    fn search_nearby(&self, query: &str, center: (f64, f64), radius_km: f64, limit: usize) -> Vec<GeocodeHit> {
        let bb = BoundingBox::around(center.0, center.1, radius_km);
        let key = stable_key(
            "primary_nearby",
            &[
                query.to_string(),
                format!("{:.4}", center.0),
                format!("{:.4}", center.1),
                format!("{:.1}", radius_km),
                limit.to_string(),
            ],
        );
        let url = self.search_url(query, limit, Some(bb));
        self.fetch(key, url)
            .into_iter()
            .take(limit)
            .map(NominatimPlace::into_hit)
            .collect()
    }
}

/// Minimal escaping sufficient for free-text query parameters; this
/// adapter has no `url`/`percent-encoding` dependency, mirroring the
/// teacher's habit of hand-formatting OSRM query strings.
fn urlencoding_lite(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            ' ' => "%20".to_string(),
            '&' => "%26".to_string(),
            '#' => "%23".to_string(),
            '?' => "%3F".to_string(),
            c if c.is_ascii_alphanumeric() || "-_.~,".contains(c) => c.to_string(),
            c => format!("%{:02X}", c as u32),
        })
        .collect()
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct NominatimPlace {
    display_name: String,
    lat: String,
    lon: String,
    #[serde(default)]
    place_id: Option<i64>,
    #[serde(rename = "type", default)]
    place_type: Option<String>,
    #[serde(default)]
    importance: Option<f64>,
}

impl NominatimPlace {
    fn into_hit(self) -> GeocodeHit {
        let lat: f64 = self.lat.parse().unwrap_or(0.0);
        let lon: f64 = self.lon.parse().unwrap_or(0.0);
        let place_type = self.place_type.unwrap_or_default();
        GeocodeHit {
            name: self.display_name.split(',').next().unwrap_or("").trim().to_string(),
            address: self.display_name,
            lat,
            lon,
            source: PlaceSource::PrimaryGeocoder,
            external_id: self.place_id.map(|id| id.to_string()),
            place_type: Some(place_type.clone()),
            precision: precision_from_type(&place_type),
            importance: self.importance.unwrap_or(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCacheStore;

    #[test]
    fn geocode_against_unreachable_host_returns_none() {
        let cache: Arc<dyn CacheStore> = Arc::new(InMemoryCacheStore::new());
        let config = PrimaryGeocoderConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 1,
            rate_limit_s: 0.0,
            ..Default::default()
        };
        let geocoder = PrimaryGeocoder::new(config, cache);
        assert!(geocoder.geocode("1600 Congress Ave, Austin, TX").is_none());
    }

    #[test]
    fn search_nearby_against_unreachable_host_is_empty() {
        let cache: Arc<dyn CacheStore> = Arc::new(InMemoryCacheStore::new());
        let config = PrimaryGeocoderConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 1,
            rate_limit_s: 0.0,
            ..Default::default()
        };
        let geocoder = PrimaryGeocoder::new(config, cache);
        let hits = geocoder.search_nearby("DMV", (30.5, -97.5), 16.0, 5);
        assert!(hits.is_empty());
    }

    #[test]
    fn url_encoding_handles_spaces_and_reserved_chars() {
        assert_eq!(urlencoding_lite("DMV office"), "DMV%20office");
        assert_eq!(urlencoding_lite("a&b"), "a%26b");
    }
}
