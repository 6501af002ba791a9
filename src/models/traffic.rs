//! Navigation step model returned by directions providers

use serde::{Deserialize, Serialize};

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

/// A single navigation step with its live-traffic duration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TrafficStep {
    pub from: Coordinate,
    pub to: Coordinate,
    /// Provider-formatted distance, e.g. "12.4 km"
    pub distance_text: String,
    pub duration_text: String,
    /// Duration adjusted for current traffic
    pub traffic_duration_text: String,
    pub instruction: String,
}
