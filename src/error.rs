//! Precondition error type.
//!
//! Everything else the core produces (resolution failures, scheduling
//! non-feasibility, window overruns) is absorbed into its own result type
//! rather than raised — see the module docs on `resolver` and `scheduler`.

use std::fmt;

use chrono::NaiveTime;

/// The only error type any public planning entry point returns.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannerError {
    /// Settings has no home coordinate set.
    HomeNotSet,
    /// `return_by <= leave_at` for a planning request.
    InvalidTimeWindow { leave: NaiveTime, return_by: NaiveTime },
    /// A wall-clock time string failed to parse (expected `HH:MM`).
    InvalidTimeString(String),
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannerError::HomeNotSet => write!(f, "home location not set"),
            PlannerError::InvalidTimeWindow { leave, return_by } => {
                write!(f, "return-by time {return_by} must be after leave time {leave}")
            }
            PlannerError::InvalidTimeString(s) => write!(f, "invalid time string: '{}'", s),
        }
    }
}

impl std::error::Error for PlannerError {}
