//! Test fixtures for errand-planner.
//!
//! Provides realistic Austin, TX test data, analogous to the teacher's
//! Las Vegas coordinate fixtures.

pub mod austin_locations;

pub use austin_locations::*;
