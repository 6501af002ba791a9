use std::sync::LazyLock;
use std::time::Instant;

use async_trait::async_trait;
use regex::Regex;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::DirectionsProvider;
use crate::config::MapsConfig;
use crate::http::{build_client, check_status};
use crate::models::{Coordinate, TrafficStep};
use crate::{PlannerError, Result};

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

/// Google Maps Directions API client
pub struct GoogleDirectionsClient {
    client: ClientWithMiddleware,
    api_key: Option<String>,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<RouteResponse>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    #[serde(default)]
    legs: Vec<LegResponse>,
}

#[derive(Debug, Deserialize)]
struct LegResponse {
    distance: Option<TextValue>,
    duration_in_traffic: Option<TextValue>,
    #[serde(default)]
    steps: Vec<StepResponse>,
}

#[derive(Debug, Deserialize)]
struct StepResponse {
    start_location: Coordinate,
    end_location: Coordinate,
    distance: Option<TextValue>,
    duration: Option<TextValue>,
    duration_in_traffic: Option<TextValue>,
    #[serde(default)]
    html_instructions: String,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    #[serde(default)]
    text: String,
    #[serde(default)]
    value: f64,
}

impl GoogleDirectionsClient {
    pub fn new(config: &MapsConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_seconds, config.max_retries)?,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_route(&self, origin: &str, destination: &str) -> Result<RouteResponse> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| PlannerError::config("GOOGLE_MAPS_API_KEY is not configured"))?;

        let url = format!(
            "{}/maps/api/directions/json?origin={}&destination={}&departure_time=now&key={}",
            self.base_url,
            urlencoding::encode(origin),
            urlencoding::encode(destination),
            urlencoding::encode(api_key)
        );

        let start_time = Instant::now();
        let response = self.client.get(url).send().await?;
        let response = check_status(response, "Directions API").await?;
        let payload: DirectionsResponse = response.json().await?;
        debug!(
            "Directions {} -> {} answered {} in {:.3}s",
            origin,
            destination,
            payload.status,
            start_time.elapsed().as_secs_f64()
        );

        if payload.status != "OK" {
            return Err(PlannerError::api(format!(
                "Directions status {}{}",
                payload.status,
                payload
                    .error_message
                    .map(|m| format!(": {m}"))
                    .unwrap_or_default()
            )));
        }

        payload
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| PlannerError::api("No routes in directions response"))
    }
}

fn strip_html(text: &str) -> String {
    HTML_TAG.replace_all(text, "").trim().to_string()
}

fn leg_steps(leg: LegResponse) -> Vec<TrafficStep> {
    let leg_traffic = leg.duration_in_traffic.map(|d| d.text);
    leg.steps
        .into_iter()
        .map(|step| {
            let duration_text = step.duration.map(|d| d.text).unwrap_or_default();
            let traffic_duration_text = step
                .duration_in_traffic
                .map(|d| d.text)
                .or_else(|| leg_traffic.clone())
                .unwrap_or_else(|| duration_text.clone());
            TrafficStep {
                from: step.start_location,
                to: step.end_location,
                distance_text: step.distance.map(|d| d.text).unwrap_or_default(),
                duration_text,
                traffic_duration_text,
                instruction: strip_html(&step.html_instructions),
            }
        })
        .collect()
}

#[async_trait]
impl DirectionsProvider for GoogleDirectionsClient {
    #[instrument(name = "directions_steps", skip(self))]
    async fn steps(&self, origin: &str, destination: &str) -> Result<Vec<TrafficStep>> {
        let route = self.fetch_route(origin, destination).await?;
        Ok(route.legs.into_iter().flat_map(leg_steps).collect())
    }

    #[instrument(name = "directions_distance", skip(self))]
    async fn route_distance_m(&self, origin: &str, destination: &str) -> Result<f64> {
        let route = self.fetch_route(origin, destination).await?;
        Ok(route
            .legs
            .iter()
            .filter_map(|leg| leg.distance.as_ref())
            .map(|d| d.value)
            .sum())
    }
}
