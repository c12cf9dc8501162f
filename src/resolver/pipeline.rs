//! The tiered resolution cascade (§4.4 "Pipeline").

use rayon::prelude::*;

use crate::error::PlannerError;
use crate::geo::miles_to_km;
use crate::model::{PlaceSearchResult, Query, Settings};
use crate::providers::ProviderAdapter;

use super::{
    decide, route_aware_tie_break, same_brand_tie_break, score_candidates, ResolvedPlace,
    ResolutionDecision, ScoredCandidate, SelectionReason,
};

/// Confidence tag an `LlmReranker` reports alongside its pick (§4.4 Tier C).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Tier C's output: at most one preferred candidate index, a confidence
/// tag, and free-text reasoning appended to the final decision reason.
#[derive(Debug, Clone, PartialEq)]
pub struct RerankResult {
    pub best_index: Option<usize>,
    pub confidence: Confidence,
    pub reasoning: String,
}

/// Optional LLM re-ranker (§4.4 Tier C). No concrete implementation ships
/// in this crate — a real deployment supplies its own client behind this
/// trait; on any failure to produce a result the caller treats it as "no
/// re-rank" per the propagation policy (§7).
pub trait LlmReranker: Send + Sync {
    fn rerank(&self, candidates: &[ScoredCandidate], city: &str, state: &str) -> Option<RerankResult>;
}

/// Retail-chain name fragments that favor routing to the secondary places
/// service even when the primary geocoder returned a few results,
/// verbatim from the original's `should_use_google_places` list.
const RETAIL_CHAIN_PATTERNS: &[&str] = &[
    "target", "walmart", "costco", "cvs", "walgreens", "safeway", "kroger", "whole foods", "trader joe",
    "carter", "gap", "old navy", "kohls", "macy", "nordstrom", "best buy", "home depot", "lowes",
    "bed bath", "starbucks", "mcdonalds", "burger king", "taco bell", "chipotle", "panera", "babies",
    "kids", "clothing", "store", "shop", "market", "pharmacy",
];

/// Street-type words; a Tier A top hit that contains one while the query
/// doesn't looks like a street name mistaken for a business.
const STREET_INDICATORS: &[&str] = &["drive", "street", "road", "avenue", "lane", "boulevard", "way", "court"];

/// Countries whose mention in an address disqualifies a candidate, unless
/// the home address also mentions that country.
const OTHER_COUNTRIES: &[&str] = &["ireland", "united kingdom", "canada", "mexico", "australia"];

fn should_use_secondary(query: &str, tier_a_results: &[PlaceSearchResult]) -> bool {
    if tier_a_results.is_empty() {
        return true;
    }
    if tier_a_results.len() <= 2 {
        return true;
    }
    let query_lower = query.to_ascii_lowercase();
    if RETAIL_CHAIN_PATTERNS.iter().any(|chain| query_lower.contains(chain)) {
        return true;
    }
    let top_name_lower = tier_a_results[0].name.to_ascii_lowercase();
    let top_looks_like_street = STREET_INDICATORS.iter().any(|w| top_name_lower.contains(w));
    let query_mentions_street = STREET_INDICATORS.iter().any(|w| query_lower.contains(w));
    top_looks_like_street && !query_mentions_street
}

fn should_use_web_search(tier_so_far: &[PlaceSearchResult], llm_result: Option<&RerankResult>) -> bool {
    if tier_so_far.is_empty() {
        return true;
    }
    if let Some(llm) = llm_result {
        if llm.best_index.is_none() && llm.confidence == Confidence::Low {
            return true;
        }
    }
    tier_so_far.len() < 2
}

fn filter_results(results: Vec<PlaceSearchResult>, home: (f64, f64), home_address: &str, max_miles: f64) -> Vec<PlaceSearchResult> {
    let home_address_lower = home_address.to_ascii_lowercase();
    results
        .into_iter()
        .filter(|candidate| {
            let distance_miles = crate::geo::km_to_miles(crate::geo::haversine_km(home, candidate.coord()));
            if distance_miles > max_miles {
                return false;
            }
            let address_lower = candidate.address.to_ascii_lowercase();
            let mentions_other_country = OTHER_COUNTRIES.iter().any(|c| address_lower.contains(c));
            if mentions_other_country {
                let home_mentions_same_country = OTHER_COUNTRIES.iter().any(|c| address_lower.contains(c) && home_address_lower.contains(c));
                if !home_mentions_same_country {
                    return false;
                }
            }
            true
        })
        .collect()
}

/// Feature toggles and radii the pipeline consults (mirrors the
/// `llm_enabled`/`places_enabled`/`web_search_enabled`/radius keys of §6's
/// configuration table).
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub osm_search_radius_mi: f64,
    pub osm_expanded_radius_mi: f64,
    pub limit: usize,
    pub places_enabled: bool,
    pub llm_enabled: bool,
    pub web_search_enabled: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            osm_search_radius_mi: 10.0,
            osm_expanded_radius_mi: 25.0,
            limit: 10,
            places_enabled: false,
            llm_enabled: false,
            web_search_enabled: false,
        }
    }
}

/// The collaborators one `resolve_place` call may reach. Each is `Option`
/// so the pipeline degrades gracefully when a tier isn't wired up; a
/// missing adapter just means that tier never runs.
pub struct ResolverContext<'a> {
    pub primary: &'a dyn ProviderAdapter,
    pub secondary: Option<&'a dyn ProviderAdapter>,
    pub web_search: Option<&'a dyn ProviderAdapter>,
    pub llm: Option<&'a dyn LlmReranker>,
}

/// Optional route-awareness, supplied by the Scheduler when resolving the
/// last stop before a return-home leg (§4.4 "Route-aware tie-break").
#[derive(Debug, Clone, Copy)]
pub struct RouteContext {
    pub prev_stop: (f64, f64),
    pub is_last_stop: bool,
    pub return_home: bool,
}

/// Resolve one `Query` to one `ResolvedPlace`.
///
/// Raises only for the precondition violation of a missing home
/// coordinate; every other failure mode (no results, provider outage)
/// comes back as a `no-match`/`pending` `ResolvedPlace`, never an `Err`.
pub fn resolve_place(
    query: &Query,
    settings: &Settings,
    ctx: &ResolverContext,
    config: &ResolverConfig,
    route: Option<RouteContext>,
) -> Result<ResolvedPlace, PlannerError> {
    let Some(home) = settings.home_coord() else {
        return Err(PlannerError::HomeNotSet);
    };

    // Tier 0: literal address short-circuits everything else (§4.4a).
    if let Some(address) = query.address.as_deref().filter(|a| !a.trim().is_empty()) {
        if let Some(hit) = ctx.primary.geocode(address) {
            let place = PlaceSearchResult {
                name: hit.name,
                address: hit.address,
                lat: hit.lat,
                lon: hit.lon,
                source: hit.source,
                external_id: hit.external_id,
                place_type: hit.place_type,
            };
            let mut scored = score_candidates(&query.name, home, std::slice::from_ref(&place));
            scored[0].selection_reason = Some(SelectionReason::OnlyMatch);
            return Ok(ResolvedPlace {
                query: query.name.clone(),
                decision_reason: format!("{} mi (geocoded address)", scored[0].distance_miles),
                selected: Some(scored[0].clone()),
                candidates: scored,
                decision: ResolutionDecision::AutoBest,
            });
        }
    }

    let (home_city, home_state) = settings.home_city_state();

    // Tier A: primary-geocoder nearby search with radius expansion.
    let mut candidates = search_nearby_hits(ctx.primary, &query.name, home, config.osm_search_radius_mi);
    if candidates.is_empty() {
        candidates = search_nearby_hits(ctx.primary, &query.name, home, config.osm_expanded_radius_mi);
    }
    if candidates.is_empty() {
        candidates = ctx.primary.geocode(&query.name).map(PlaceSearchResult::from).into_iter().collect();
    }

    candidates = filter_results(candidates, home, settings.home_address.as_deref().unwrap_or(""), config.osm_expanded_radius_mi);

    // Tier B: secondary places service.
    if config.places_enabled {
        if let Some(secondary) = ctx.secondary {
            if should_use_secondary(&query.name, &candidates) {
                if let Some(hit) = secondary.geocode(&query.name) {
                    candidates.insert(0, PlaceSearchResult::from(hit));
                }
            }
        }
    }

    // Tier C: optional LLM re-ranker.
    let mut llm_result: Option<RerankResult> = None;
    if config.llm_enabled && !candidates.is_empty() && !home_city.is_empty() && !home_state.is_empty() {
        if let Some(llm) = ctx.llm {
            let scored_preview = score_candidates(&query.name, home, &candidates);
            if let Some(result) = llm.rerank(&scored_preview, &home_city, &home_state) {
                if let Some(best_idx) = result.best_index {
                    if best_idx < candidates.len() {
                        let best = candidates.remove(best_idx);
                        candidates.insert(0, best);
                    }
                }
                llm_result = Some(result);
            }
        }
    }

    // Tier D: web-search fallback.
    if config.web_search_enabled && should_use_web_search(&candidates, llm_result.as_ref()) {
        if let Some(web) = ctx.web_search {
            if !home_city.is_empty() && !home_state.is_empty() {
                let search_text = format!("{} {}, {}", query.name, home_city, home_state);
                if let Some(hit) = web.geocode(&search_text) {
                    candidates.insert(0, PlaceSearchResult::from(hit));
                }
            }
        }
    }

    if candidates.is_empty() {
        return Ok(ResolvedPlace::no_match(&query.name, format!("No places found for '{}'", query.name)));
    }

    let mut scored = score_candidates(&query.name, home, &candidates);
    same_brand_tie_break(&mut scored);

    if let Some(route) = route {
        if route.is_last_stop && route.return_home {
            route_aware_tie_break(&mut scored, route.prev_stop, home);
        }
    }

    scored.truncate(config.limit);

    let llm_high_confidence = matches!(&llm_result, Some(r) if r.confidence == Confidence::High);
    let (decision, reason) = decide(&scored, llm_high_confidence);

    match decision {
        ResolutionDecision::AutoBest => {
            let mut top = scored[0].clone();
            // `decide()` re-derives the winning row of the §4.4 decision table from
            // scratch, so its reason is authoritative even when a tie-break pass
            // (same-brand, route-aware) already annotated this candidate with its
            // own, lower-priority reason.
            top.selection_reason = reason;
            let mut reason_text = top.selection_reason.map(SelectionReason::reason_text).unwrap_or("Auto-selected").to_string();
            if let Some(llm) = &llm_result {
                if !llm.reasoning.is_empty() {
                    reason_text.push_str(" - ");
                    reason_text.push_str(&llm.reasoning);
                }
            }
            scored[0] = top.clone();
            Ok(ResolvedPlace {
                query: query.name.clone(),
                decision_reason: format!("{} mi ({})", top.distance_miles, reason_text),
                selected: Some(top),
                candidates: scored,
                decision,
            })
        }
        _ => Ok(ResolvedPlace {
            query: query.name.clone(),
            selected: None,
            candidates: scored,
            decision: ResolutionDecision::Pending,
            decision_reason: "Multiple matches found - please select".to_string(),
        }),
    }
}

fn search_nearby_hits(adapter: &dyn ProviderAdapter, query: &str, home: (f64, f64), radius_mi: f64) -> Vec<PlaceSearchResult> {
    adapter
        .search_nearby(query, home, miles_to_km(radius_mi), 10)
        .into_iter()
        .map(PlaceSearchResult::from)
        .collect()
}

impl From<crate::providers::GeocodeHit> for PlaceSearchResult {
    fn from(hit: crate::providers::GeocodeHit) -> Self {
        PlaceSearchResult {
            name: hit.name,
            address: hit.address,
            lat: hit.lat,
            lon: hit.lon,
            source: hit.source,
            external_id: hit.external_id,
            place_type: hit.place_type,
        }
    }
}

/// Resolve a batch of queries. Independent resolutions run on `rayon`'s
/// thread pool; the returned order mirrors `queries`' order regardless of
/// completion order (§5).
pub fn resolve_multiple(
    queries: &[Query],
    settings: &Settings,
    ctx: &ResolverContext,
    config: &ResolverConfig,
) -> Result<Vec<ResolvedPlace>, PlannerError> {
    if settings.home_coord().is_none() {
        return Err(PlannerError::HomeNotSet);
    }
    let results: Vec<ResolvedPlace> = queries
        .par_iter()
        .map(|q| resolve_place(q, settings, ctx, config, None).unwrap_or_else(|_| ResolvedPlace::no_match(&q.name, "home location not set")))
        .collect();
    Ok(results)
}
