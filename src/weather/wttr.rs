//! wttr.in JSON (`format=j1`) client

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::time::Instant;
use tracing::{debug, instrument, warn};

use super::WeatherProvider;
use crate::config::WeatherConfig;
use crate::http::{build_client, check_status};
use crate::models::WeatherReading;
use crate::{PlannerError, Result};

pub struct WttrClient {
    client: ClientWithMiddleware,
    base_url: String,
}

/// Subset of the wttr.in j1 payload
#[derive(Debug, Deserialize)]
struct WttrResponse {
    #[serde(default)]
    current_condition: Vec<CurrentCondition>,
}

#[derive(Debug, Deserialize)]
struct CurrentCondition {
    #[serde(rename = "temp_C")]
    temp_c: String,
    #[serde(rename = "weatherDesc", default)]
    weather_desc: Vec<ValueWrapper>,
}

#[derive(Debug, Deserialize)]
struct ValueWrapper {
    value: String,
}

impl WttrClient {
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_seconds, config.max_retries)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl WeatherProvider for WttrClient {
    #[instrument(name = "wttr_current", skip(self))]
    async fn current(&self, city: &str) -> Result<WeatherReading> {
        let start_time = Instant::now();
        let url = format!("{}/{}?format=j1", self.base_url, urlencoding::encode(city));

        let response = self.client.get(url).send().await?;
        let response = check_status(response, "wttr.in").await?;
        let payload: WttrResponse = response.json().await?;

        let current = payload
            .current_condition
            .into_iter()
            .next()
            .ok_or_else(|| PlannerError::parse(format!("No current condition for {city}")))?;
        let description = current
            .weather_desc
            .into_iter()
            .next()
            .map(|d| d.value.trim().to_string())
            .ok_or_else(|| PlannerError::parse(format!("No weather description for {city}")))?;

        let elapsed = start_time.elapsed();
        debug!("Weather for {} in {:.3}s: {}", city, elapsed.as_secs_f64(), description);
        if elapsed.as_secs() > 5 {
            warn!("Slow weather response: {:.3}s", elapsed.as_secs_f64());
        }

        Ok(WeatherReading::new(description, current.temp_c))
    }
}
