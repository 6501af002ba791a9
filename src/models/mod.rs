//! Data models for the SmartRoute planner
//!
//! This module contains the request-scoped domain models organized by concern:
//! - Segment: one `from -> to` leg as produced by a route source
//! - Traffic: navigation steps returned by a directions provider
//! - Weather: per-city weather snapshots
//! - Itinerary: enriched segments and the aggregated total

pub mod itinerary;
pub mod segment;
pub mod traffic;
pub mod weather;

pub use itinerary::{EnrichedSegment, Itinerary};
pub use segment::Segment;
pub use traffic::{Coordinate, TrafficStep};
pub use weather::WeatherReading;

/// Round a presentation value to two decimal places
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
