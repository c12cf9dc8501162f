//! Enumerated runtime configuration (§6).
//!
//! One flat struct with the defaults named in §6's table. Callers build a
//! `Config` however they like (env vars, a file, hardcoded in tests) and
//! pass it into the adapters/resolver/routing constructors; this crate
//! does not read environment variables itself.

use crate::providers::PrimaryGeocoderConfig;
use crate::resolver::ResolverConfig;
use crate::routing::RoutingConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub primary_geocoder_base_url: String,
    pub primary_geocoder_user_agent: String,
    pub primary_geocoder_rate_limit_s: f64,

    pub routing_base_url: String,
    pub routing_timeout_s: u64,
    pub routing_fallback_speed_kmh: f64,

    pub cache_ttl_days: u32,

    pub default_search_radius_km: f64,
    pub osm_search_radius_mi: f64,
    pub osm_expanded_radius_mi: f64,

    pub llm_enabled: bool,
    pub places_enabled: bool,
    pub web_search_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            primary_geocoder_base_url: "https://nominatim.openstreetmap.org".to_string(),
            primary_geocoder_user_agent: "errand-planner/0.1".to_string(),
            primary_geocoder_rate_limit_s: 1.0,

            routing_base_url: "https://router.project-osrm.org".to_string(),
            routing_timeout_s: 10,
            routing_fallback_speed_kmh: 40.0,

            cache_ttl_days: 7,

            default_search_radius_km: 16.0,
            osm_search_radius_mi: 10.0,
            osm_expanded_radius_mi: 25.0,

            llm_enabled: false,
            places_enabled: false,
            web_search_enabled: false,
        }
    }
}

impl Config {
    /// Slice out the primary geocoder adapter's own config shape.
    pub fn primary_geocoder_config(&self) -> PrimaryGeocoderConfig {
        PrimaryGeocoderConfig {
            base_url: self.primary_geocoder_base_url.clone(),
            user_agent: self.primary_geocoder_user_agent.clone(),
            rate_limit_s: self.primary_geocoder_rate_limit_s,
            timeout_secs: 10,
            cache_ttl_days: self.cache_ttl_days,
        }
    }

    /// Slice out the routing port's own config shape.
    pub fn routing_config(&self) -> RoutingConfig {
        RoutingConfig {
            base_url: self.routing_base_url.clone(),
            timeout_secs: self.routing_timeout_s,
            cache_ttl_days: self.cache_ttl_days,
        }
    }

    /// Slice out the resolver's tier-toggle/radius config shape.
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            osm_search_radius_mi: self.osm_search_radius_mi,
            osm_expanded_radius_mi: self.osm_expanded_radius_mi,
            limit: 10,
            places_enabled: self.places_enabled,
            llm_enabled: self.llm_enabled,
            web_search_enabled: self.web_search_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_table() {
        let c = Config::default();
        assert_eq!(c.primary_geocoder_rate_limit_s, 1.0);
        assert_eq!(c.routing_timeout_s, 10);
        assert_eq!(c.routing_fallback_speed_kmh, 40.0);
        assert_eq!(c.cache_ttl_days, 7);
        assert_eq!(c.osm_search_radius_mi, 10.0);
        assert_eq!(c.osm_expanded_radius_mi, 25.0);
        assert!(!c.llm_enabled);
    }

    #[test]
    fn component_configs_slice_out_the_relevant_fields() {
        let c = Config::default();
        let resolver = c.resolver_config();
        assert_eq!(resolver.osm_search_radius_mi, c.osm_search_radius_mi);
        assert_eq!(resolver.places_enabled, c.places_enabled);

        let geocoder = c.primary_geocoder_config();
        assert_eq!(geocoder.base_url, c.primary_geocoder_base_url);
        assert_eq!(geocoder.rate_limit_s, c.primary_geocoder_rate_limit_s);

        let routing = c.routing_config();
        assert_eq!(routing.base_url, c.routing_base_url);
        assert_eq!(routing.timeout_secs, c.routing_timeout_s);
    }
}
