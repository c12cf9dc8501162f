//! Web-search fallback adapter: a text search API, mined for US-style
//! street addresses which are then re-geocoded by the primary geocoder
//! (§4.3 adapter 3, §6).

use std::sync::Arc;

use regex::Regex;
use serde::Deserialize;

use crate::cache::{stable_key, CacheStore};

use super::{GeocodeHit, PrimaryGeocoder, ProviderAdapter};

/// US-style street address pattern, case-insensitive, per §6.
const ADDRESS_PATTERN: &str = r"(?i)\d+\s+[A-Za-z\s]+(?:Street|St|Avenue|Ave|Road|Rd|Drive|Dr|Lane|Ln|Boulevard|Blvd|Way|Court|Ct|Parkway|Pkwy)\.?\s*,\s*[A-Za-z\s]+,\s*[A-Z]{2}(\s+\d{5})?";

#[derive(Debug, Clone)]
pub struct WebSearchConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
    pub cache_ttl_days: u32,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.tavily.com".to_string(),
            api_key: String::new(),
            timeout_secs: 10,
            cache_ttl_days: 7,
        }
    }
}

pub struct WebSearchFallback {
    config: WebSearchConfig,
    client: reqwest::blocking::Client,
    cache: Arc<dyn CacheStore>,
    address_re: Regex,
    geocoder: Arc<PrimaryGeocoder>,
}

impl WebSearchFallback {
    pub fn new(config: WebSearchConfig, cache: Arc<dyn CacheStore>, geocoder: Arc<PrimaryGeocoder>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        let address_re = Regex::new(ADDRESS_PATTERN).expect("static address pattern is valid");
        Self { config, client, cache, address_re, geocoder }
    }

    fn search(&self, query: &str) -> Vec<SearchResult> {
        let key = stable_key("web_search", &[query.to_string()]);
        if let Some(cached) = self.cache.get(&key).and_then(|raw| serde_json::from_str(&raw).ok()) {
            return cached;
        }

        let url = format!("{}/search", self.config.base_url);
        let results = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "api_key": self.config.api_key, "query": query }))
            .send()
            .ok()
            .filter(|r| r.status().is_success())
            .and_then(|r| r.json::<SearchResponse>().ok())
            .map(|body| body.results)
            .unwrap_or_else(|| {
                tracing::info!(query, "web search request failed, returning no results");
                Vec::new()
            });

        if let Ok(raw) = serde_json::to_string(&results) {
            self.cache.put(&key, raw, self.config.cache_ttl_days);
        }
        results
    }

    /// Extract every candidate address from `text`, in order of first
    /// appearance, deduplicated.
    pub fn extract_addresses(&self, text: &str) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.address_re
            .find_iter(text)
            .map(|m| m.as_str().trim().to_string())
            .filter(|addr| seen.insert(addr.clone()))
            .collect()
    }
}

impl ProviderAdapter for WebSearchFallback {
    fn geocode(&self, text: &str) -> Option<GeocodeHit> {
        self.geocode_multi(text, 1, None).into_iter().next()
    }

    fn geocode_multi(&self, text: &str, limit: usize, _bias: Option<(f64, f64)>) -> Vec<GeocodeHit> {
        let results = self.search(text);
        let mut hits = Vec::new();
        for result in results {
            let haystack = format!("{} {}", result.title, result.content);
            for address in self.extract_addresses(&haystack) {
                if let Some(hit) = self.geocoder.geocode(&address) {
                    hits.push(hit);
                    if hits.len() >= limit {
                        return hits;
                    }
                }
            }
        }
        hits
    }

    fn search_nearby(&self, query: &str, _center: (f64, f64), _radius_km: f64, limit: usize) -> Vec<GeocodeHit> {
        self.geocode_multi(query, limit, None)
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct SearchResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCacheStore;
    use crate::providers::simple_geocoder::PrimaryGeocoderConfig;

    fn fallback() -> WebSearchFallback {
        let cache: Arc<dyn CacheStore> = Arc::new(InMemoryCacheStore::new());
        let geocoder = Arc::new(PrimaryGeocoder::new(
            PrimaryGeocoderConfig {
                base_url: "http://127.0.0.1:1".to_string(),
                timeout_secs: 1,
                rate_limit_s: 0.0,
                ..Default::default()
            },
            cache.clone(),
        ));
        WebSearchFallback::new(
            WebSearchConfig {
                base_url: "http://127.0.0.1:1".to_string(),
                timeout_secs: 1,
                ..Default::default()
            },
            cache,
            geocoder,
        )
    }

    #[test]
    fn extracts_a_well_formed_address() {
        let fb = fallback();
        let text = "Visit us at 1600 Congress Avenue, Austin, TX 78701 for more info.";
        let found = fb.extract_addresses(text);
        assert_eq!(found, vec!["1600 Congress Avenue, Austin, TX 78701"]);
    }

    #[test]
    fn extracts_multiple_distinct_addresses() {
        let fb = fallback();
        let text = "Locations: 100 Main St, Austin, TX and 200 Oak Dr, Round Rock, TX 78664.";
        let found = fb.extract_addresses(text);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn no_address_in_text_yields_empty() {
        let fb = fallback();
        assert!(fb.extract_addresses("just some unrelated text").is_empty());
    }

    #[test]
    fn unreachable_search_backend_yields_no_hits() {
        let fb = fallback();
        assert!(fb.geocode_multi("DMV Austin", 3, None).is_empty());
    }
}
