//! Place resolver (§4.4): turns one free-text `Query` into one
//! `ResolvedPlace`, the most intricate piece of the core.
//!
//! The cascade is composition, not inheritance: each tier is invoked as a
//! plain function over a `&dyn ProviderAdapter`, never a subclass. Order
//! A → B → C → D is strict; later tiers only ever prepend candidates.

mod fuzzy;
mod pipeline;

pub use fuzzy::{full_ratio, name_similarity, normalize_text, partial_ratio, token_set_ratio, token_sort_ratio};
pub use pipeline::{
    resolve_multiple, resolve_place, Confidence, LlmReranker, RerankResult, ResolverConfig, ResolverContext,
    RouteContext,
};

use serde::{Deserialize, Serialize};

use crate::geo::{haversine_km, km_to_miles};
use crate::model::PlaceSearchResult;

/// Why a candidate was promoted to the top of its list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionReason {
    ClosestToHome,
    BestOverall,
    ClearWinner,
    OnlyMatch,
    UserSelected,
    BestForRoute,
}

impl SelectionReason {
    pub fn reason_text(self) -> &'static str {
        match self {
            SelectionReason::ClosestToHome => "Closest to home",
            SelectionReason::BestOverall => "Best overall match",
            SelectionReason::ClearWinner => "Clear best match",
            SelectionReason::OnlyMatch => "Only match found",
            SelectionReason::UserSelected => "User selected",
            SelectionReason::BestForRoute => "Best for route (min total distance)",
        }
    }
}

/// How a query was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionDecision {
    AutoBest,
    UserSelected,
    NoMatch,
    Pending,
}

/// A `PlaceSearchResult` wrapped with distance/similarity scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub place: PlaceSearchResult,
    pub distance_miles: f64,
    pub name_similarity: f64,
    pub combined_score: f64,
    pub selection_reason: Option<SelectionReason>,
}

/// The outcome of resolving one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPlace {
    pub query: String,
    pub selected: Option<ScoredCandidate>,
    pub candidates: Vec<ScoredCandidate>,
    pub decision: ResolutionDecision,
    pub decision_reason: String,
}

impl ResolvedPlace {
    pub fn is_resolved(&self) -> bool {
        matches!(self.decision, ResolutionDecision::AutoBest | ResolutionDecision::UserSelected)
    }

    pub fn needs_disambiguation(&self) -> bool {
        self.decision == ResolutionDecision::Pending
    }

    fn no_match(query: &str, reason: impl Into<String>) -> Self {
        Self {
            query: query.to_string(),
            selected: None,
            candidates: Vec::new(),
            decision: ResolutionDecision::NoMatch,
            decision_reason: reason.into(),
        }
    }
}

/// Maximum miles before a candidate's distance component hits zero.
const MAX_DISTANCE_MILES: f64 = 25.0;

/// Candidates whose name similarity is at or above this, *and* whose names
/// are mutually this similar to each other, are "same brand" (§4.4,
/// glossary).
const SAME_BRAND_THRESHOLD: f64 = 70.0;

/// Score one candidate against the query string and starting coordinate.
pub fn score_candidate(query_name: &str, start: (f64, f64), place: &PlaceSearchResult) -> ScoredCandidate {
    let distance_km = haversine_km(start, place.coord());
    let distance_miles = round1(km_to_miles(distance_km));
    let similarity = round1(fuzzy::name_similarity(query_name, &place.name));
    let distance_component = (50.0 * (1.0 - distance_miles / MAX_DISTANCE_MILES)).max(0.0);
    let name_component = similarity / 2.0;
    let combined_score = round1((distance_component + name_component).clamp(0.0, 100.0));

    ScoredCandidate {
        place: place.clone(),
        distance_miles,
        name_similarity: similarity,
        combined_score,
        selection_reason: None,
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Score and sort a batch of raw candidates, descending by `combined_score`.
pub fn score_candidates(query_name: &str, start: (f64, f64), places: &[PlaceSearchResult]) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = places.iter().map(|p| score_candidate(query_name, start, p)).collect();
    scored.sort_by(|a, b| b.combined_score.partial_cmp(&a.combined_score).unwrap_or(std::cmp::Ordering::Equal));
    scored
}

/// Two candidates are "same brand" iff each independently has
/// `name_similarity >= 70` and the fuzzy similarity between *their own*
/// names is also `>= 70`.
pub fn same_brand(a: &ScoredCandidate, b: &ScoredCandidate) -> bool {
    a.name_similarity >= SAME_BRAND_THRESHOLD
        && b.name_similarity >= SAME_BRAND_THRESHOLD
        && fuzzy::name_similarity(&a.place.name, &b.place.name) >= SAME_BRAND_THRESHOLD
}

/// Within the leading same-brand run, resort ascending by `distance_miles`
/// and annotate the new leader `closest-to-home`.
pub fn same_brand_tie_break(candidates: &mut Vec<ScoredCandidate>) {
    if candidates.len() < 2 {
        return;
    }
    let mut run_end = 1;
    while run_end < candidates.len() && same_brand(&candidates[0], &candidates[run_end]) {
        run_end += 1;
    }
    if run_end < 2 {
        return;
    }

    let mut run: Vec<ScoredCandidate> = candidates[0..run_end].to_vec();
    run.sort_by(|a, b| a.distance_miles.partial_cmp(&b.distance_miles).unwrap_or(std::cmp::Ordering::Equal));
    run[0].selection_reason = Some(SelectionReason::ClosestToHome);
    candidates.splice(0..run_end, run);
}

/// For the last stop when returning home: within the leading same-brand
/// run, promote the candidate minimizing `dist(prev, c) + dist(c, home)`
/// to position 0 with reason `best-for-route`, iff it differs from the
/// distance-only winner already at position 0.
pub fn route_aware_tie_break(candidates: &mut Vec<ScoredCandidate>, prev: (f64, f64), home: (f64, f64)) {
    if candidates.len() < 2 {
        return;
    }
    let mut run_end = 1;
    while run_end < candidates.len() && same_brand(&candidates[0], &candidates[run_end]) {
        run_end += 1;
    }
    if run_end < 2 {
        return;
    }

    let mut best_idx = 0;
    let mut best_added = f64::MAX;
    for (i, candidate) in candidates[0..run_end].iter().enumerate() {
        let added = haversine_km(prev, candidate.place.coord()) + haversine_km(candidate.place.coord(), home);
        if added < best_added {
            best_added = added;
            best_idx = i;
        }
    }

    if best_idx == 0 {
        return;
    }
    let mut winner = candidates.remove(best_idx);
    winner.selection_reason = Some(SelectionReason::BestForRoute);
    candidates.insert(0, winner);
}

/// The §4.4 decision rule, applied to the final ordered candidate list.
/// Returns the decision, the reason to annotate the top candidate with
/// (when auto-selecting), and a human-readable explanation.
pub fn decide(candidates: &[ScoredCandidate], llm_high_confidence: bool) -> (ResolutionDecision, Option<SelectionReason>) {
    match candidates.len() {
        0 => return (ResolutionDecision::NoMatch, None),
        1 => {
            return if candidates[0].name_similarity >= 50.0 {
                (ResolutionDecision::AutoBest, Some(SelectionReason::OnlyMatch))
            } else {
                (ResolutionDecision::Pending, None)
            };
        }
        _ => {}
    }

    let top = &candidates[0];
    let second = &candidates[1];

    if top.combined_score - second.combined_score >= 15.0 {
        return (ResolutionDecision::AutoBest, Some(SelectionReason::ClearWinner));
    }
    if top.name_similarity >= 80.0 && top.distance_miles <= 10.0 {
        return (ResolutionDecision::AutoBest, Some(SelectionReason::BestOverall));
    }
    if top.name_similarity >= SAME_BRAND_THRESHOLD
        && second.name_similarity >= SAME_BRAND_THRESHOLD
        && same_brand(top, second)
        && top.distance_miles < second.distance_miles
    {
        return (ResolutionDecision::AutoBest, Some(SelectionReason::ClosestToHome));
    }
    if llm_high_confidence {
        return (ResolutionDecision::AutoBest, Some(SelectionReason::BestOverall));
    }
    (ResolutionDecision::Pending, None)
}

/// Move the Nth candidate to `selected`, rewrite the decision to
/// `user-selected`. Out-of-range indices return `resolved` unchanged.
pub fn select_candidate(mut resolved: ResolvedPlace, index: usize) -> ResolvedPlace {
    if index >= resolved.candidates.len() {
        return resolved;
    }
    let mut chosen = resolved.candidates[index].clone();
    chosen.selection_reason = Some(SelectionReason::UserSelected);
    resolved.selected = Some(chosen);
    resolved.decision = ResolutionDecision::UserSelected;
    resolved.decision_reason = "User selected".to_string();
    resolved
}
