//! Weather lookup collaborator
//!
//! [`WeatherProvider`] is the raw, fallible provider seam. [`WeatherClient`]
//! wraps a provider and never fails: any error degrades to the
//! `("Unknown", "N/A")` reading.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{instrument, warn};

use crate::Result;
use crate::models::WeatherReading;

pub mod wttr;

pub use wttr::WttrClient;

/// Descriptions containing any of these are treated as unsafe driving weather
pub const BAD_WEATHER_KEYWORDS: [&str; 5] = ["storm", "rain", "mist", "snow", "hail"];

/// Fallible weather source
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, city: &str) -> Result<WeatherReading>;
}

/// Soft-failing weather lookup used by the pipeline
#[derive(Clone)]
pub struct WeatherClient {
    provider: Arc<dyn WeatherProvider>,
}

impl WeatherClient {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    /// Current weather for `city`, or the unknown reading on any failure
    #[instrument(skip(self))]
    pub async fn get_weather(&self, city: &str) -> WeatherReading {
        match self.provider.current(city).await {
            Ok(reading) => reading,
            Err(e) => {
                warn!("Weather lookup for {} failed: {}", city, e);
                WeatherReading::unknown()
            }
        }
    }
}

/// Case-insensitive keyword match against a weather description
#[must_use]
pub fn is_bad_weather(description: &str) -> bool {
    let lowered = description.to_lowercase();
    BAD_WEATHER_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}
