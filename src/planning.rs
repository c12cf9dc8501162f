//! Top-level composition: queries + a day's constraints in, one `PlanResult`
//! out (§2 "Data flow"). Mirrors the teacher's free-function `solve()` entry
//! point (`solver::solve`) — a plain function over the lower-level pieces
//! rather than a builder or a stateful planner object.
//!
//! This is the only place preconditions are validated and raised as
//! `PlannerError`: a missing home coordinate, an inverted leave/return-by
//! window, or an unparsable wall-clock time string (§7, taxonomy entries
//! 1). Everything downstream of validation — resolution failures,
//! scheduling non-feasibility, window overruns — is absorbed into
//! `PlanOutcome` rather than raised, per the propagation policy.

use chrono::{NaiveDate, NaiveTime};

use crate::error::PlannerError;
use crate::model::{FixedBlock, PlanResult, Priority, Query, Settings, Task, TaskCategory, TaskLocation};
use crate::optimizer;
use crate::resolver::{self, ResolvedPlace, ResolverConfig, ResolverContext};
use crate::routing::RoutingPort;
use crate::scheduler;

/// One query plus the task attributes the UI collected for it — everything
/// the Scheduler needs from a `Task` except the location, which resolution
/// fills in.
#[derive(Debug, Clone)]
pub struct ErrandRequest {
    pub query: Query,
    pub duration_minutes: i64,
    pub priority: Priority,
    pub category: TaskCategory,
    pub due_date: Option<NaiveDate>,
    pub open_time_local: Option<NaiveTime>,
    pub close_time_local: Option<NaiveTime>,
    pub earliest_start: Option<chrono::NaiveDateTime>,
    pub latest_end: Option<chrono::NaiveDateTime>,
    pub days_open: Option<String>,
    pub purpose: Option<String>,
}

impl ErrandRequest {
    pub fn new(query: Query, duration_minutes: i64) -> Self {
        Self {
            query,
            duration_minutes,
            priority: 2,
            category: TaskCategory::Errand,
            due_date: None,
            open_time_local: None,
            close_time_local: None,
            earliest_start: None,
            latest_end: None,
            days_open: None,
            purpose: None,
        }
    }
}

/// One day's full planning request: the leave/return window, the errands to
/// resolve and place, any home-only tasks, and the day's fixed commitments.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub plan_date: NaiveDate,
    pub leave_at: NaiveTime,
    pub return_by: NaiveTime,
    pub errands: Vec<ErrandRequest>,
    pub home_tasks: Vec<Task>,
    pub fixed_blocks: Vec<FixedBlock>,
    pub return_to_start: bool,
}

/// The full outcome of one planning request: the scheduled plan, plus any
/// queries the resolver could not auto-resolve and left pending the user's
/// explicit selection (never silently dropped from the output).
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub plan: PlanResult,
    pub needs_disambiguation: Vec<ResolvedPlace>,
    pub unresolved: Vec<ResolvedPlace>,
}

/// Parse a `"HH:MM"` 24-hour wall-clock time string (§7 "invalid time
/// string"). The only recognized format — this core never guesses at
/// locale-specific time formats.
pub fn parse_wall_clock_time(s: &str) -> Result<NaiveTime, PlannerError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|_| PlannerError::InvalidTimeString(s.to_string()))
}

fn task_from_errand(errand: &ErrandRequest, candidate: &resolver::ScoredCandidate) -> Task {
    Task {
        id: errand.query.id,
        title: errand.query.name.clone(),
        duration_minutes: errand.duration_minutes,
        location: Some(TaskLocation {
            lat: candidate.place.lat,
            lon: candidate.place.lon,
            display_name: candidate.place.name.clone(),
            address: Some(candidate.place.address.clone()),
        }),
        open_time_local: errand.open_time_local,
        close_time_local: errand.close_time_local,
        earliest_start: errand.earliest_start,
        latest_end: errand.latest_end,
        due_date: errand.due_date,
        priority: errand.priority,
        category: errand.category,
        days_open: errand.days_open.clone(),
        purpose: errand.purpose.clone(),
    }
}

/// Run the full core pipeline: resolve every errand's query, order the
/// resolved stops, re-check the last stop's same-brand candidates against
/// the return-home leg, then schedule the day.
///
/// Raises only for the precondition violations named in §7 — a missing home
/// coordinate or `return_by <= leave_at`. Unresolved/pending queries are
/// never dropped; they come back in `PlanOutcome::needs_disambiguation` for
/// the caller (the UI collaborator) to resolve with `resolver::select_candidate`
/// and retry.
pub fn plan_day(
    request: &PlanRequest,
    settings: &Settings,
    ctx: &ResolverContext,
    resolver_config: &ResolverConfig,
    router: &dyn RoutingPort,
) -> Result<PlanOutcome, PlannerError> {
    if settings.home_coord().is_none() {
        return Err(PlannerError::HomeNotSet);
    }
    if request.return_by <= request.leave_at {
        return Err(PlannerError::InvalidTimeWindow { leave: request.leave_at, return_by: request.return_by });
    }

    let day_settings = Settings { work_start: request.leave_at, work_end: request.return_by, ..settings.clone() };
    let home = day_settings.home_coord().expect("checked above");

    let queries: Vec<Query> = request.errands.iter().map(|e| e.query.clone()).collect();
    let resolved = resolver::resolve_multiple(&queries, &day_settings, ctx, resolver_config)?;

    let mut resolved_tasks: Vec<(ResolvedPlace, Task)> = Vec::new();
    let mut unresolved: Vec<ResolvedPlace> = Vec::new();
    let mut needs_disambiguation: Vec<ResolvedPlace> = Vec::new();

    for (errand, place) in request.errands.iter().zip(resolved.into_iter()) {
        if place.is_resolved() {
            let candidate = place.selected.clone().expect("is_resolved implies selected is present");
            let task = task_from_errand(errand, &candidate);
            resolved_tasks.push((place, task));
        } else if place.needs_disambiguation() {
            needs_disambiguation.push(place);
        } else {
            unresolved.push(place);
        }
    }

    let coords: Vec<(f64, f64)> = resolved_tasks
        .iter()
        .map(|(_, t)| {
            let loc = t.location.as_ref().expect("just set");
            (loc.lat, loc.lon)
        })
        .collect();
    let route = optimizer::optimize(home, &coords, request.return_to_start);
    let mut ordered: Vec<(ResolvedPlace, Task)> = route.stop_order.iter().map(|&i| resolved_tasks[i].clone()).collect();

    if request.return_to_start {
        if let Some(last_idx) = ordered.len().checked_sub(1) {
            let prev = if last_idx == 0 {
                home
            } else {
                let loc = ordered[last_idx - 1].1.location.as_ref().expect("just set");
                (loc.lat, loc.lon)
            };
            let (resolved_place, task) = &mut ordered[last_idx];
            let mut candidates = resolved_place.candidates.clone();
            resolver::route_aware_tie_break(&mut candidates, prev, home);
            if let Some(winner) = candidates.first() {
                if winner.selection_reason == Some(resolver::SelectionReason::BestForRoute) {
                    task.location = Some(TaskLocation {
                        lat: winner.place.lat,
                        lon: winner.place.lon,
                        display_name: winner.place.name.clone(),
                        address: Some(winner.place.address.clone()),
                    });
                    resolved_place.selected = Some(winner.clone());
                    resolved_place.candidates = candidates;
                }
            }
        }
    }

    let final_tasks: Vec<Task> = ordered.into_iter().map(|(_, t)| t).collect();

    let plan = scheduler::schedule_day(
        request.plan_date,
        &day_settings,
        &final_tasks,
        &request.home_tasks,
        &request.fixed_blocks,
        router,
        request.return_to_start,
    )?;

    Ok(PlanOutcome { plan, needs_disambiguation, unresolved })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlaceSource;
    use crate::providers::{GeocodeHit, ProviderAdapter};
    use crate::routing::FallbackRouter;

    struct FixedAdapter(Vec<GeocodeHit>);

    impl ProviderAdapter for FixedAdapter {
        fn geocode(&self, _text: &str) -> Option<GeocodeHit> {
            self.0.first().cloned()
        }

        fn geocode_multi(&self, _text: &str, limit: usize, _bias: Option<(f64, f64)>) -> Vec<GeocodeHit> {
            self.0.iter().take(limit).cloned().collect()
        }

        fn search_nearby(&self, _query: &str, _center: (f64, f64), _radius_km: f64, limit: usize) -> Vec<GeocodeHit> {
            self.0.iter().take(limit).cloned().collect()
        }
    }

    fn hit(name: &str, lat: f64, lon: f64) -> GeocodeHit {
        GeocodeHit {
            name: name.to_string(),
            address: format!("{name}, Austin, TX"),
            lat,
            lon,
            source: PlaceSource::PrimaryGeocoder,
            external_id: None,
            place_type: None,
            precision: crate::model::Precision::Exact,
            importance: 0.5,
        }
    }

    fn settings() -> Settings {
        Settings {
            home_name: "Home".to_string(),
            home_address: Some("1500 Congress Ave, Austin, TX".to_string()),
            home_lat: Some(30.5427),
            home_lon: Some(-97.5467),
            timezone: "America/Chicago".to_string(),
            work_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            work_end: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, 28).unwrap()
    }

    fn base_request(errands: Vec<ErrandRequest>) -> PlanRequest {
        PlanRequest {
            plan_date: date(),
            leave_at: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            return_by: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            errands,
            home_tasks: Vec::new(),
            fixed_blocks: Vec::new(),
            return_to_start: true,
        }
    }

    #[test]
    fn parse_wall_clock_time_accepts_hh_mm() {
        let t = parse_wall_clock_time("09:30").unwrap();
        assert_eq!(t, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
    }

    #[test]
    fn parse_wall_clock_time_rejects_garbage() {
        let err = parse_wall_clock_time("9am").unwrap_err();
        assert_eq!(err, PlannerError::InvalidTimeString("9am".to_string()));
    }

    #[test]
    fn missing_home_is_a_precondition_error() {
        let mut s = settings();
        s.home_lat = None;
        let primary = FixedAdapter(Vec::new());
        let ctx = ResolverContext { primary: &primary, secondary: None, web_search: None, llm: None };
        let router = FallbackRouter::default();
        let request = base_request(Vec::new());
        let result = plan_day(&request, &s, &ctx, &ResolverConfig::default(), &router);
        assert_eq!(result.unwrap_err(), PlannerError::HomeNotSet);
    }

    #[test]
    fn inverted_time_window_is_a_precondition_error() {
        let s = settings();
        let primary = FixedAdapter(Vec::new());
        let ctx = ResolverContext { primary: &primary, secondary: None, web_search: None, llm: None };
        let router = FallbackRouter::default();
        let mut request = base_request(Vec::new());
        request.leave_at = NaiveTime::from_hms_opt(17, 0, 0).unwrap();
        request.return_by = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let result = plan_day(&request, &s, &ctx, &ResolverConfig::default(), &router);
        assert!(matches!(result.unwrap_err(), PlannerError::InvalidTimeWindow { .. }));
    }

    #[test]
    fn resolves_orders_and_schedules_one_errand() {
        let s = settings();
        let primary = FixedAdapter(vec![hit("DMV", 30.55, -97.55)]);
        let ctx = ResolverContext { primary: &primary, secondary: None, web_search: None, llm: None };
        let router = FallbackRouter::default();
        let request = base_request(vec![ErrandRequest::new(Query::new("DMV"), 30)]);

        let outcome = plan_day(&request, &s, &ctx, &ResolverConfig::default(), &router).unwrap();
        assert!(outcome.needs_disambiguation.is_empty());
        assert!(outcome.unresolved.is_empty());
        assert!(outcome.plan.items.iter().any(|i| i.title == "DMV"));
    }

    #[test]
    fn unresolvable_query_is_surfaced_not_dropped() {
        let s = settings();
        let primary = FixedAdapter(Vec::new());
        let ctx = ResolverContext { primary: &primary, secondary: None, web_search: None, llm: None };
        let router = FallbackRouter::default();
        let request = base_request(vec![ErrandRequest::new(Query::new("zzqzzq nonexistent 123"), 30)]);

        let outcome = plan_day(&request, &s, &ctx, &ResolverConfig::default(), &router).unwrap();
        assert_eq!(outcome.unresolved.len(), 1);
        assert!(outcome.plan.items.is_empty());
    }
}
