//! Maps/directions collaborator
//!
//! [`DirectionsProvider`] is the fallible provider seam; [`DirectionsClient`]
//! degrades failures to an empty step list or a zero distance.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{instrument, warn};

use crate::Result;
use crate::models::TrafficStep;

pub mod google;

pub use google::GoogleDirectionsClient;

#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    /// Ordered navigation steps between two places
    async fn steps(&self, origin: &str, destination: &str) -> Result<Vec<TrafficStep>>;

    /// Total route length in meters, summed across all legs
    async fn route_distance_m(&self, origin: &str, destination: &str) -> Result<f64>;
}

/// Soft-failing directions lookup used by the pipeline
#[derive(Clone)]
pub struct DirectionsClient {
    provider: Arc<dyn DirectionsProvider>,
}

impl DirectionsClient {
    pub fn new(provider: Arc<dyn DirectionsProvider>) -> Self {
        Self { provider }
    }

    /// Steps between `origin` and `destination`, empty on any failure
    #[instrument(skip(self))]
    pub async fn get_directions(&self, origin: &str, destination: &str) -> Vec<TrafficStep> {
        match self.provider.steps(origin, destination).await {
            Ok(steps) => steps,
            Err(e) => {
                warn!("Directions {} -> {} failed: {}", origin, destination, e);
                Vec::new()
            }
        }
    }

    /// Point-to-point road distance in kilometres, `0.0` on any failure
    #[instrument(skip(self))]
    pub async fn route_distance_km(&self, origin: &str, destination: &str) -> f64 {
        match self.provider.route_distance_m(origin, destination).await {
            Ok(meters) if meters.is_finite() && meters > 0.0 => meters / 1000.0,
            Ok(_) => 0.0,
            Err(e) => {
                warn!("Route distance {} -> {} failed: {}", origin, destination, e);
                0.0
            }
        }
    }
}
