//! `SmartRoute` - highway route planning with live weather, traffic and safety tips
//!
//! This library resolves a city-to-city route into highway segments,
//! enriches each segment with weather, traffic, distance and advisory text,
//! and exposes the pipeline over HTTP and a CLI.

pub mod api;
pub mod assembler;
pub mod cache;
pub mod config;
pub mod dataset;
pub mod directions;
pub mod distance;
pub mod distance_estimate;
pub mod error;
pub mod fuel;
pub mod http;
pub mod json_extract;
pub mod llm;
pub mod models;
pub mod route_source;
pub mod telemetry;
pub mod weather;
pub mod weather_check;
pub mod web;

// Re-export core types for public API
pub use api::AppState;
pub use assembler::RouteAssembler;
pub use config::PlannerConfig;
pub use dataset::HighwayDataset;
pub use directions::{DirectionsClient, DirectionsProvider, GoogleDirectionsClient};
pub use error::PlannerError;
pub use llm::{GeminiClient, LanguageModel};
pub use models::{EnrichedSegment, Itinerary, Segment, TrafficStep, WeatherReading};
pub use route_source::RouteSource;
pub use weather::{WeatherClient, WeatherProvider, WttrClient};
pub use weather_check::WeatherCheck;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, PlannerError>;
