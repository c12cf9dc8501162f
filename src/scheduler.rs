//! Day scheduler: greedy insertion of resolved errands into one plan date,
//! followed by home-task backfill and window-fit diagnostics.
//!
//! The scheduler consumes a `RoutingPort` for travel times but otherwise
//! does no I/O; every decision is a pure function of its inputs plus the
//! routing segment it asked for.

use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::error::PlannerError;
use crate::model::{
    FixedBlock, OverflowEntry, PlanResult, ScheduledItem, ScheduledItemKind, Settings, Task, WindowFit,
};
use crate::routing::RoutingPort;

/// Due-date urgency bonus added to `10 * priority` when ranking tasks.
fn due_date_bonus(task: &Task, plan_date: NaiveDate) -> i64 {
    let Some(due) = task.due_date else {
        return 0;
    };
    if due <= plan_date {
        100
    } else if due == plan_date + ChronoDuration::days(1) {
        50
    } else if due <= plan_date + ChronoDuration::days(3) {
        20
    } else {
        0
    }
}

fn priority_score(task: &Task, plan_date: NaiveDate) -> i64 {
    10 * i64::from(task.priority) + due_date_bonus(task, plan_date)
}

/// The day window plus any open/close and earliest/latest constraints for
/// one task on `plan_date`, intersected down. `None` if the intersection is
/// empty or inverted.
fn feasible_window(
    task: &Task,
    plan_date: NaiveDate,
    day_start: NaiveDateTime,
    day_end: NaiveDateTime,
) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let mut start = day_start;
    let mut end = day_end;

    if let (Some(open), Some(close)) = (task.open_time_local, task.close_time_local) {
        start = start.max(plan_date.and_time(open));
        end = end.min(plan_date.and_time(close));
    }
    if let Some(earliest) = task.earliest_start {
        start = start.max(earliest);
    }
    if let Some(latest) = task.latest_end {
        end = end.min(latest);
    }

    if start >= end {
        return None;
    }
    Some((start, end))
}

fn intervals_overlap(a_start: NaiveDateTime, a_end: NaiveDateTime, b_start: NaiveDateTime, b_end: NaiveDateTime) -> bool {
    a_start < b_end && b_start < a_end
}

fn overlaps_any(items: &[ScheduledItem], start: NaiveDateTime, end: NaiveDateTime) -> bool {
    items.iter().any(|item| intervals_overlap(item.start, item.end, start, end))
}

/// Free gaps within `[day_start, day_end)`, complementing the union of
/// `items`' intervals. `items` need not be sorted.
fn free_gaps(day_start: NaiveDateTime, day_end: NaiveDateTime, items: &[ScheduledItem]) -> Vec<(NaiveDateTime, NaiveDateTime)> {
    let mut bounds: Vec<(NaiveDateTime, NaiveDateTime)> = items.iter().map(|i| (i.start, i.end)).collect();
    bounds.sort_by_key(|&(s, _)| s);

    let mut merged: Vec<(NaiveDateTime, NaiveDateTime)> = Vec::new();
    for (s, e) in bounds {
        if let Some(last) = merged.last_mut() {
            if s <= last.1 {
                last.1 = last.1.max(e);
                continue;
            }
        }
        merged.push((s, e));
    }

    let mut gaps = Vec::new();
    let mut cursor = day_start;
    for (s, e) in merged {
        if cursor < s {
            gaps.push((cursor, s));
        }
        cursor = cursor.max(e);
    }
    if cursor < day_end {
        gaps.push((cursor, day_end));
    }
    gaps
}

struct Candidate {
    index: usize,
    start: NaiveDateTime,
    end: NaiveDateTime,
    arrival: NaiveDateTime,
    route_distance_km: f64,
    route_duration_min: f64,
    score: i64,
}

/// Schedule `errands` (already in optimizer order) plus `home_tasks` (no
/// location) onto `plan_date`, around `fixed_blocks`, using `router` for
/// travel estimates. `return_home` appends a final travel leg back to
/// `settings.home_coord()` when the day does not already end there.
pub fn schedule_day(
    plan_date: NaiveDate,
    settings: &Settings,
    errands: &[Task],
    home_tasks: &[Task],
    fixed_blocks: &[FixedBlock],
    router: &dyn RoutingPort,
    return_home: bool,
) -> Result<PlanResult, PlannerError> {
    let home = settings.home_coord().ok_or(PlannerError::HomeNotSet)?;
    let day_start = plan_date.and_time(settings.work_start);
    let day_end = plan_date.and_time(settings.work_end);

    let mut items: Vec<ScheduledItem> = fixed_blocks
        .iter()
        .map(|block| ScheduledItem {
            kind: ScheduledItemKind::Fixed,
            start: block.start,
            end: block.end,
            title: block.title.clone(),
            task_id: None,
            from_place: None,
            to_place: None,
            distance_km: None,
            travel_minutes: None,
        })
        .collect();

    let mut overflow: Vec<OverflowEntry> = Vec::new();
    let mut windows: Vec<Option<(NaiveDateTime, NaiveDateTime)>> = Vec::with_capacity(errands.len());

    for task in errands {
        if task.location.is_none() {
            overflow.push(OverflowEntry { task_id: task.id, title: task.title.clone(), reason: "missing location".to_string() });
            windows.push(None);
            continue;
        }
        if task.closed_on(plan_date) {
            overflow.push(OverflowEntry { task_id: task.id, title: task.title.clone(), reason: "closed on this day of week".to_string() });
            windows.push(None);
            continue;
        }
        match feasible_window(task, plan_date, day_start, day_end) {
            Some((start, end)) if (end - start).num_minutes() >= task.duration_minutes => windows.push(Some((start, end))),
            _ => {
                overflow.push(OverflowEntry { task_id: task.id, title: task.title.clone(), reason: "no feasible time window".to_string() });
                windows.push(None);
            }
        }
    }

    let mut scheduled = vec![false; errands.len()];
    let mut current_time = day_start;
    let mut current_pos = home;

    loop {
        let mut best: Option<Candidate> = None;

        for (index, task) in errands.iter().enumerate() {
            if scheduled[index] {
                continue;
            }
            let Some((window_start, window_end)) = windows[index] else {
                continue;
            };
            let task_pos = task.location.as_ref().expect("feasible window implies a location").coord();

            let route = router.segment(current_pos, task_pos);
            let arrival = current_time + minutes(route.duration_min);
            if arrival > window_end {
                continue;
            }
            let start = arrival.max(window_start);
            let end = start + minutes(task.duration_minutes as f64);
            if end > window_end || end > day_end {
                continue;
            }
            if overlaps_any(&items, start, end) {
                continue;
            }

            let score = priority_score(task, plan_date) - (2.0 * route.duration_min).round() as i64;
            let is_better = match &best {
                None => true,
                Some(current_best) => score > current_best.score,
            };
            if is_better {
                best = Some(Candidate {
                    index,
                    start,
                    end,
                    arrival,
                    route_distance_km: route.distance_km,
                    route_duration_min: route.duration_min,
                    score,
                });
            }
        }

        let Some(chosen) = best else { break };
        let task = &errands[chosen.index];
        let task_pos = task.location.as_ref().expect("feasible window implies a location").coord();
        let task_label = task.location.as_ref().map(|l| l.display_name.clone()).unwrap_or_default();

        if current_pos != task_pos {
            items.push(ScheduledItem {
                kind: ScheduledItemKind::Travel,
                start: current_time,
                end: chosen.arrival,
                title: format!("Travel to {task_label}"),
                task_id: None,
                from_place: None,
                to_place: Some(task_label.clone()),
                distance_km: Some(chosen.route_distance_km),
                travel_minutes: Some(chosen.route_duration_min.round() as i64),
            });
        }
        if chosen.start > chosen.arrival {
            items.push(ScheduledItem {
                kind: ScheduledItemKind::Wait,
                start: chosen.arrival,
                end: chosen.start,
                title: "Wait".to_string(),
                task_id: None,
                from_place: None,
                to_place: None,
                distance_km: None,
                travel_minutes: None,
            });
        }
        items.push(ScheduledItem {
            kind: ScheduledItemKind::Task,
            start: chosen.start,
            end: chosen.end,
            title: task.title.clone(),
            task_id: Some(task.id),
            from_place: None,
            to_place: None,
            distance_km: None,
            travel_minutes: None,
        });

        scheduled[chosen.index] = true;
        current_time = chosen.end;
        current_pos = task_pos;
    }

    for (index, task) in errands.iter().enumerate() {
        if !scheduled[index] && windows[index].is_some() {
            overflow.push(OverflowEntry { task_id: task.id, title: task.title.clone(), reason: "no remaining capacity in the day".to_string() });
        }
    }

    if return_home && current_pos != home && current_time < day_end {
        let route = router.segment(current_pos, home);
        let arrival = current_time + minutes(route.duration_min);
        items.push(ScheduledItem {
            kind: ScheduledItemKind::Travel,
            start: current_time,
            end: arrival,
            title: format!("Travel to {}", settings.home_name),
            task_id: None,
            from_place: None,
            to_place: Some(settings.home_name.clone()),
            distance_km: Some(route.distance_km),
            travel_minutes: Some(route.duration_min.round() as i64),
        });
        current_time = arrival;
    }

    backfill_home_tasks(home_tasks, plan_date, day_start, day_end, &mut items, &mut overflow);

    items.sort_by_key(|item| item.start);

    let schedule_end = items.iter().map(|i| i.end).max().unwrap_or(day_start);
    let window = if schedule_end > day_end {
        WindowFit { fits: false, overtime_minutes: (schedule_end - day_end).num_minutes(), buffer_minutes: 0 }
    } else {
        WindowFit { fits: true, overtime_minutes: 0, buffer_minutes: (day_end - schedule_end).num_minutes() }
    };

    let total_travel_km: f64 = items.iter().filter_map(|i| i.distance_km).sum();
    let total_travel_minutes: f64 = items.iter().filter_map(|i| i.travel_minutes).map(|m| m as f64).sum();

    let all_tasks: Vec<&Task> = errands.iter().chain(home_tasks.iter()).collect();
    let suggestions = build_suggestions(&window, &items, &all_tasks);

    Ok(PlanResult { items, overflow, total_travel_km, total_travel_minutes, window, suggestions })
}

fn minutes(m: f64) -> ChronoDuration {
    ChronoDuration::milliseconds((m * 60_000.0).round() as i64)
}

/// Sort location-less tasks by `(due_date asc, priority desc)` and drop each
/// into the earliest gap of the day wide enough to hold it.
fn backfill_home_tasks(
    home_tasks: &[Task],
    plan_date: NaiveDate,
    day_start: NaiveDateTime,
    day_end: NaiveDateTime,
    items: &mut Vec<ScheduledItem>,
    overflow: &mut Vec<OverflowEntry>,
) {
    let mut ordered: Vec<&Task> = home_tasks.iter().collect();
    ordered.sort_by(|a, b| {
        a.due_date
            .cmp(&b.due_date)
            .then_with(|| b.priority.cmp(&a.priority))
    });

    for task in ordered {
        if task.closed_on(plan_date) {
            overflow.push(OverflowEntry { task_id: task.id, title: task.title.clone(), reason: "closed on this day of week".to_string() });
            continue;
        }
        let Some((window_start, window_end)) = feasible_window(task, plan_date, day_start, day_end) else {
            overflow.push(OverflowEntry { task_id: task.id, title: task.title.clone(), reason: "no feasible time window".to_string() });
            continue;
        };

        let needed = ChronoDuration::minutes(task.duration_minutes);
        let gap = free_gaps(day_start, day_end, items)
            .into_iter()
            .filter(|&(gap_start, gap_end)| gap_start.max(window_start) + needed <= gap_end.min(window_end))
            .map(|(gap_start, _)| gap_start.max(window_start))
            .next();

        match gap {
            Some(start) => items.push(ScheduledItem {
                kind: ScheduledItemKind::Task,
                start,
                end: start + needed,
                title: task.title.clone(),
                task_id: Some(task.id),
                from_place: None,
                to_place: None,
                distance_km: None,
                travel_minutes: None,
            }),
            None => overflow.push(OverflowEntry { task_id: task.id, title: task.title.clone(), reason: "no free gap in the day".to_string() }),
        }
    }
}

fn round_up_to_15(minutes: i64) -> i64 {
    ((minutes + 14) / 15) * 15
}

/// At most 5 ranked suggestions, per the window-overrun recovery rules.
fn build_suggestions(window: &WindowFit, items: &[ScheduledItem], tasks: &[&Task]) -> Vec<String> {
    let mut suggestions = Vec::new();
    if !window.fits {
        let overtime = window.overtime_minutes;
        if overtime <= 60 {
            let rounded = round_up_to_15(overtime);
            suggestions.push(format!("Leave {rounded} min earlier"));
            suggestions.push(format!("Extend return-by time by {rounded} min"));
        }

        let mut drop_candidates: Vec<(u8, i64, String)> = Vec::new();
        for (index, item) in items.iter().enumerate() {
            let Some(task_id) = item.task_id else { continue };
            if item.kind != ScheduledItemKind::Task {
                continue;
            }
            let priority = tasks.iter().find(|t| t.id == task_id).map(|t| t.priority).unwrap_or(0);
            let mut time_saved = item.duration_minutes();
            if let Some(prev) = items.get(index.wrapping_sub(1)) {
                if prev.kind == ScheduledItemKind::Travel {
                    time_saved += prev.duration_minutes();
                }
            }
            if let Some(next) = items.get(index + 1) {
                if next.kind == ScheduledItemKind::Travel {
                    time_saved += next.duration_minutes();
                }
            }
            drop_candidates.push((priority, time_saved, item.title.clone()));
        }
        drop_candidates.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
        for (_, time_saved, title) in &drop_candidates {
            if *time_saved as f64 >= 0.7 * overtime as f64 {
                suggestions.push(format!("Drop '{title}'"));
            }
            if suggestions.len() >= 5 {
                return suggestions;
            }
        }
    }

    if items.iter().any(|i| i.kind == ScheduledItemKind::Task && i.duration_minutes() > 30) {
        suggestions.push("Reduce duration of long tasks".to_string());
        if suggestions.len() >= 5 {
            return suggestions;
        }
    }

    let mut long_travel: Vec<(i64, String)> = items
        .windows(2)
        .filter_map(|pair| {
            let (travel, next) = (&pair[0], &pair[1]);
            if travel.kind == ScheduledItemKind::Travel && travel.duration_minutes() > 15 {
                Some((travel.duration_minutes(), next.title.clone()))
            } else {
                None
            }
        })
        .collect();
    long_travel.sort_by(|a, b| b.0.cmp(&a.0));
    for (_, next_title) in long_travel.into_iter().take(2) {
        suggestions.push(format!("Choose closer location for '{next_title}'"));
        if suggestions.len() >= 5 {
            break;
        }
    }

    suggestions.truncate(5);
    suggestions
}
