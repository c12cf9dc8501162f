//! Shared data model (§3 of the spec).
//!
//! Types that flow between the resolver, optimizer, and scheduler. Plans
//! reference tasks by id, never by pointer — there are no cycles.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Process-scoped user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub home_name: String,
    pub home_address: Option<String>,
    pub home_lat: Option<f64>,
    pub home_lon: Option<f64>,
    pub timezone: String,
    pub work_start: NaiveTime,
    pub work_end: NaiveTime,
}

impl Settings {
    pub fn has_home_location(&self) -> bool {
        self.home_lat.is_some() && self.home_lon.is_some()
    }

    pub fn home_coord(&self) -> Option<(f64, f64)> {
        Some((self.home_lat?, self.home_lon?))
    }

    /// Extract "City, STATE" from `home_address`, best-effort, for the
    /// resolver's LLM-tier location context. Returns empty strings if it
    /// cannot find a plausible "City, ST" pattern.
    pub fn home_city_state(&self) -> (String, String) {
        let Some(address) = &self.home_address else {
            return (String::new(), String::new());
        };
        let parts: Vec<&str> = address.split(',').map(|p| p.trim()).collect();
        for (i, part) in parts.iter().enumerate() {
            let words: Vec<&str> = part.split_whitespace().collect();
            if let Some(first) = words.first() {
                if words.len() <= 2 && first.len() == 2 && first.chars().all(|c| c.is_ascii_uppercase()) {
                    let city = if i >= 1 { parts[i - 1].to_string() } else { String::new() };
                    return (city, (*first).to_string());
                }
            }
        }
        (String::new(), String::new())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            home_name: "Home".to_string(),
            home_address: None,
            home_lat: None,
            home_lon: None,
            timezone: "America/Chicago".to_string(),
            work_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            work_end: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        }
    }
}

/// An unresolved user input describing an intended stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
}

impl Query {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            address: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

/// Where a `PlaceSearchResult` came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaceSource {
    PrimaryGeocoder,
    SecondaryGeocoder,
    WebSearch,
    Manual,
}

/// How precisely a geocode result pins down a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Precision {
    Exact,
    Street,
    City,
    Region,
}

/// An output of a provider adapter. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceSearchResult {
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lon: f64,
    pub source: PlaceSource,
    pub external_id: Option<String>,
    pub place_type: Option<String>,
}

impl PlaceSearchResult {
    pub fn coord(&self) -> (f64, f64) {
        (self.lat, self.lon)
    }
}

/// A preexisting, immovable commitment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedBlock {
    pub id: Uuid,
    pub date: NaiveDate,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub title: String,
}

impl FixedBlock {
    /// `start < end` and both share `date` in local time.
    pub fn is_valid(&self) -> bool {
        self.start < self.end && self.start.date() == self.date && self.end.date() == self.date
    }
}

/// Classification that determines whether a task requires travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    Errand,
    Appointment,
    DeepWork,
    Personal,
    Health,
    Financial,
    Shopping,
    Other,
}

impl TaskCategory {
    /// Whether this category denotes an out-of-home activity.
    pub fn is_out_of_home(self) -> bool {
        matches!(
            self,
            TaskCategory::Errand
                | TaskCategory::Appointment
                | TaskCategory::Shopping
                | TaskCategory::Health
                | TaskCategory::Financial
        )
    }
}

/// A place location attached to a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskLocation {
    pub lat: f64,
    pub lon: f64,
    pub display_name: String,
    pub address: Option<String>,
}

/// Priority in 1..4 (Low to Urgent). Invalid values are clamped by
/// `Task::new` to keep the invariant load-bearing at construction time.
pub type Priority = u8;

/// A task or errand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub duration_minutes: i64,
    pub location: Option<TaskLocation>,
    pub open_time_local: Option<NaiveTime>,
    pub close_time_local: Option<NaiveTime>,
    pub earliest_start: Option<NaiveDateTime>,
    pub latest_end: Option<NaiveDateTime>,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub category: TaskCategory,
    /// Comma-separated weekday abbreviations this place is open, e.g.
    /// `"Mon,Tue,Wed,Thu,Fri"`. Optional metadata consulted only by the
    /// scheduler's day-of-week filter.
    pub days_open: Option<String>,
    /// Free-text purpose, consulted only by the packing collaborator.
    pub purpose: Option<String>,
}

impl Task {
    pub fn new(title: impl Into<String>, duration_minutes: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            duration_minutes,
            location: None,
            open_time_local: None,
            close_time_local: None,
            earliest_start: None,
            latest_end: None,
            due_date: None,
            priority: 2,
            category: TaskCategory::Errand,
            days_open: None,
            purpose: None,
        }
    }

    pub fn with_location(mut self, lat: f64, lon: f64, display_name: impl Into<String>) -> Self {
        self.location = Some(TaskLocation {
            lat,
            lon,
            display_name: display_name.into(),
            address: None,
        });
        self
    }

    /// A task is location-based iff it has coordinates AND its category
    /// denotes an out-of-home activity.
    pub fn is_location_based(&self) -> bool {
        self.location.is_some() && self.category.is_out_of_home()
    }

    /// Whether `days_open` excludes the given plan date's weekday.
    pub fn closed_on(&self, date: NaiveDate) -> bool {
        let Some(days) = &self.days_open else {
            return false;
        };
        let today = weekday_abbrev(date);
        !days.split(',').map(str::trim).any(|d| d.eq_ignore_ascii_case(today))
    }
}

fn weekday_abbrev(date: NaiveDate) -> &'static str {
    match date.weekday() {
        chrono::Weekday::Mon => "Mon",
        chrono::Weekday::Tue => "Tue",
        chrono::Weekday::Wed => "Wed",
        chrono::Weekday::Thu => "Thu",
        chrono::Weekday::Fri => "Fri",
        chrono::Weekday::Sat => "Sat",
        chrono::Weekday::Sun => "Sun",
    }
}

/// What kind of placement a `ScheduledItem` represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduledItemKind {
    Task,
    Travel,
    Fixed,
    Wait,
}

/// A placement on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledItem {
    pub kind: ScheduledItemKind,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub title: String,
    pub task_id: Option<Uuid>,
    pub from_place: Option<String>,
    pub to_place: Option<String>,
    pub distance_km: Option<f64>,
    pub travel_minutes: Option<i64>,
}

impl ScheduledItem {
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn overlaps(&self, other: &ScheduledItem) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A task the scheduler could not place, with a reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverflowEntry {
    pub task_id: Uuid,
    pub title: String,
    pub reason: String,
}

/// Window-fit diagnostics for a `PlanResult`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowFit {
    pub fits: bool,
    pub overtime_minutes: i64,
    pub buffer_minutes: i64,
}

/// The full scheduler output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    pub items: Vec<ScheduledItem>,
    pub overflow: Vec<OverflowEntry>,
    pub total_travel_km: f64,
    pub total_travel_minutes: f64,
    pub window: WindowFit,
    pub suggestions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_is_location_based_requires_both_coords_and_category() {
        let home_task = Task::new("Laundry", 30);
        assert!(!home_task.is_location_based());

        let errand = Task::new("DMV", 45).with_location(30.5, -97.5, "DMV");
        assert!(errand.is_location_based());

        let mut deep_work = Task::new("Write report", 60).with_location(30.5, -97.5, "Office");
        deep_work.category = TaskCategory::DeepWork;
        assert!(!deep_work.is_location_based());
    }

    #[test]
    fn closed_on_respects_days_open() {
        let mut t = Task::new("Bank", 20);
        t.days_open = Some("Mon,Tue,Wed,Thu,Fri".to_string());
        // 2026-07-27 is a Monday? check: Use a Sunday date deliberately.
        let sunday = NaiveDate::from_ymd_opt(2026, 8, 2).unwrap();
        assert_eq!(sunday.weekday().to_string(), "Sun");
        assert!(t.closed_on(sunday));

        let monday = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
        assert!(!t.closed_on(monday));
    }

    #[test]
    fn closed_on_with_no_days_open_never_filters() {
        let t = Task::new("Anything", 20);
        let date = NaiveDate::from_ymd_opt(2026, 8, 2).unwrap();
        assert!(!t.closed_on(date));
    }

    #[test]
    fn fixed_block_validity() {
        let date = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        let start = date.and_hms_opt(9, 0, 0).unwrap();
        let end = date.and_hms_opt(10, 0, 0).unwrap();
        let block = FixedBlock { id: Uuid::new_v4(), date, start, end, title: "Meeting".into() };
        assert!(block.is_valid());

        let bad = FixedBlock { id: Uuid::new_v4(), date, start: end, end: start, title: "Bad".into() };
        assert!(!bad.is_valid());
    }

    #[test]
    fn scheduled_items_overlap_detection() {
        let date = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        let a = ScheduledItem {
            kind: ScheduledItemKind::Task,
            start: date.and_hms_opt(9, 0, 0).unwrap(),
            end: date.and_hms_opt(10, 0, 0).unwrap(),
            title: "A".into(),
            task_id: None,
            from_place: None,
            to_place: None,
            distance_km: None,
            travel_minutes: None,
        };
        let mut b = a.clone();
        b.start = date.and_hms_opt(9, 30, 0).unwrap();
        b.end = date.and_hms_opt(11, 0, 0).unwrap();
        assert!(a.overlaps(&b));

        let mut c = a.clone();
        c.start = date.and_hms_opt(10, 0, 0).unwrap();
        c.end = date.and_hms_opt(11, 0, 0).unwrap();
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn home_city_state_extraction() {
        let mut s = Settings::default();
        s.home_address = Some("1500 Congress Ave, Austin, TX 78701".to_string());
        let (city, state) = s.home_city_state();
        assert_eq!(city, "Austin");
        assert_eq!(state, "TX");
    }
}
