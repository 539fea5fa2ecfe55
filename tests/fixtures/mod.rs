//! Test fixtures for territory-planner.
//!
//! Provides realistic test data including:
//! - Real Miami-Dade locations grouped by the band they fall in
//! - Boundary lines shaped like the traced Miami territory breakout

pub mod miami_locations;

pub use miami_locations::*;
