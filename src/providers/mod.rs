//! Geocoding and place-search adapters (§4.3).
//!
//! Three concrete adapters behind one trait. Every adapter absorbs its own
//! failures — a timed-out request, a non-OK status, an unparsable body —
//! and returns empty results rather than propagating an error; only a
//! `tracing::info!` marks the event. The resolver composes these as a
//! strict tiered cascade (`resolver` module), never inheriting from them.

mod rate_limit;
mod secondary_places;
mod simple_geocoder;
mod web_search;

pub use rate_limit::RateGate;
pub use secondary_places::{SecondaryPlaces, SecondaryPlacesConfig};
pub use simple_geocoder::{PrimaryGeocoder, PrimaryGeocoderConfig};
pub use web_search::{WebSearchConfig, WebSearchFallback};

use crate::model::{PlaceSource, Precision};

/// A geocode/search result with its precision tag, before scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeHit {
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lon: f64,
    pub source: PlaceSource,
    pub external_id: Option<String>,
    pub place_type: Option<String>,
    pub precision: Precision,
    /// Provider-reported importance/relevance, used only to order
    /// `geocode_multi` results; not part of the resolver's own scoring.
    pub importance: f64,
}

/// The shared contract all three geocoding/search adapters implement.
pub trait ProviderAdapter: Send + Sync {
    /// At most one best-effort match for `text`.
    fn geocode(&self, text: &str) -> Option<GeocodeHit>;

    /// Up to `limit` matches for `text`, sorted by (precision ascending,
    /// importance descending, distance-to-bias ascending if `bias` given).
    fn geocode_multi(&self, text: &str, limit: usize, bias: Option<(f64, f64)>) -> Vec<GeocodeHit>;

    /// Places near `center` within `radius_km`, ordered by the provider
    /// (typically proximity), capped at `limit`.
    fn search_nearby(&self, query: &str, center: (f64, f64), radius_km: f64, limit: usize) -> Vec<GeocodeHit>;
}

/// Derive a `Precision` tag from a provider's free-text place/address type,
/// following the original's `_get_precision_from_type` keyword buckets.
pub fn precision_from_type(place_type: &str) -> Precision {
    let t = place_type.to_ascii_lowercase();
    if t.contains("house") || t.contains("building") || t.contains("apartments") {
        Precision::Exact
    } else if t.contains("road") || t.contains("street") || t.contains("way") {
        Precision::Street
    } else if t.contains("city") || t.contains("town") || t.contains("village") {
        Precision::City
    } else {
        Precision::Region
    }
}

/// Sort `geocode_multi` hits in place per the documented ordering key.
pub fn sort_multi_hits(hits: &mut [GeocodeHit], bias: Option<(f64, f64)>) {
    hits.sort_by(|a, b| {
        a.precision_rank()
            .cmp(&b.precision_rank())
            .then(b.importance.partial_cmp(&a.importance).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| {
                let Some(center) = bias else {
                    return std::cmp::Ordering::Equal;
                };
                let da = crate::geo::haversine_km(center, (a.lat, a.lon));
                let db = crate::geo::haversine_km(center, (b.lat, b.lon));
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
    });
}

impl GeocodeHit {
    fn precision_rank(&self) -> u8 {
        match self.precision {
            Precision::Exact => 0,
            Precision::Street => 1,
            Precision::City => 2,
            Precision::Region => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(name: &str, precision: Precision, importance: f64, lat: f64, lon: f64) -> GeocodeHit {
        GeocodeHit {
            name: name.to_string(),
            address: String::new(),
            lat,
            lon,
            source: PlaceSource::PrimaryGeocoder,
            external_id: None,
            place_type: None,
            precision,
            importance,
        }
    }

    #[test]
    fn precision_from_type_buckets() {
        assert_eq!(precision_from_type("house"), Precision::Exact);
        assert_eq!(precision_from_type("Apartments"), Precision::Exact);
        assert_eq!(precision_from_type("residential road"), Precision::Street);
        assert_eq!(precision_from_type("city"), Precision::City);
        assert_eq!(precision_from_type("state"), Precision::Region);
    }

    #[test]
    fn sort_multi_hits_orders_by_precision_then_importance() {
        let mut hits = vec![
            hit("B", Precision::City, 0.9, 0.0, 0.0),
            hit("A", Precision::Exact, 0.1, 0.0, 0.0),
            hit("C", Precision::Exact, 0.5, 0.0, 0.0),
        ];
        sort_multi_hits(&mut hits, None);
        assert_eq!(hits.iter().map(|h| h.name.as_str()).collect::<Vec<_>>(), vec!["C", "A", "B"]);
    }

    #[test]
    fn sort_multi_hits_breaks_ties_by_distance_to_bias() {
        let mut hits = vec![
            hit("Far", Precision::Exact, 0.5, 1.0, 1.0),
            hit("Near", Precision::Exact, 0.5, 0.01, 0.01),
        ];
        sort_multi_hits(&mut hits, Some((0.0, 0.0)));
        assert_eq!(hits[0].name, "Near");
    }
}
