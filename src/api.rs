//! HTTP API
//!
//! All routes share one [`AppState`] holding the injected collaborators.
//! Per-request caches live inside [`RouteAssembler::assemble`] and
//! [`WeatherCheck::scan`], so nothing here is mutated across requests.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::assembler::RouteAssembler;
use crate::config::RoutingConfig;
use crate::dataset::HighwayDataset;
use crate::directions::DirectionsClient;
use crate::distance_estimate::DistanceEstimator;
use crate::fuel;
use crate::http::bounded;
use crate::llm::{LanguageModel, answer_with_weather};
use crate::models::Itinerary;
use crate::route_source::RouteSource;
use crate::weather::WeatherClient;
use crate::weather_check::WeatherCheck;
use crate::{PlannerError, Result, VERSION};

#[derive(Clone)]
pub struct AppState {
    llm: Arc<dyn LanguageModel>,
    weather: WeatherClient,
    route_source: Arc<RouteSource>,
    assembler: Arc<RouteAssembler>,
    weather_check: Arc<WeatherCheck>,
    distance: Arc<DistanceEstimator>,
    call_timeout: Duration,
}

impl AppState {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        weather: WeatherClient,
        directions: DirectionsClient,
        dataset: Option<HighwayDataset>,
        routing: &RoutingConfig,
    ) -> Self {
        let call_timeout = routing.call_timeout();
        Self {
            route_source: Arc::new(RouteSource::new(
                llm.clone(),
                dataset.map(Arc::new),
                call_timeout,
            )),
            assembler: Arc::new(RouteAssembler::new(
                llm.clone(),
                weather.clone(),
                directions.clone(),
                routing.max_concurrency,
                call_timeout,
            )),
            weather_check: Arc::new(WeatherCheck::new(llm.clone(), weather.clone(), call_timeout)),
            distance: Arc::new(DistanceEstimator::new(llm.clone(), directions, call_timeout)),
            llm,
            weather,
            call_timeout,
        }
    }

    /// Resolve and enrich a route, failing with [`PlannerError::NoRoute`] on a hard miss
    pub async fn plan_route(&self, start: &str, end: &str) -> Result<Itinerary> {
        let segments = self.route_source.get_route(start, end).await;
        if segments.is_empty() {
            return Err(PlannerError::no_route(start, end));
        }
        Ok(self.assembler.assemble(segments).await)
    }

    pub fn weather_check(&self) -> &WeatherCheck {
        &self.weather_check
    }

    pub fn distance(&self) -> &DistanceEstimator {
        &self.distance
    }
}

/// Trim both endpoints and reject blank or identical cities
pub fn validate_endpoints(start: &str, end: &str) -> Result<(String, String)> {
    let (start, end) = (start.trim(), end.trim());
    if start.is_empty() || end.is_empty() {
        return Err(PlannerError::validation("start and end cities are required"));
    }
    if start.eq_ignore_ascii_case(end) {
        return Err(PlannerError::validation(
            "start and end cities must be different",
        ));
    }
    Ok((start.to_string(), end.to_string()))
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TripRequest {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct FuelRequest {
    pub vehicle: String,
    #[serde(default)]
    pub fuel_type: Option<String>,
    pub distance_km: f64,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub cities: Vec<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/route", post(route))
        .route("/distance", post(distance))
        .route("/fuel-estimate", post(fuel_estimate))
        .route("/chat", post(chat))
        .route("/weather-check", post(weather_check))
        .with_state(state)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn route_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "error": message.into(),
            "route_segments": [],
            "total_distance_km": 0,
        })),
    )
        .into_response()
}

/// Extracted JSON body, with rejections handled by the route itself
type JsonBody<T> = std::result::Result<Json<T>, JsonRejection>;

/// Request body that failed to deserialize, as a status and readable message
fn rejection_parts(rejection: &JsonRejection) -> (StatusCode, String) {
    warn!("Rejected request body: {}", rejection.body_text());
    (
        rejection.status(),
        format!("Invalid request body: {}", rejection.body_text()),
    )
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": VERSION }))
}

#[instrument(skip(state))]
async fn route(
    State(state): State<AppState>,
    request: JsonBody<TripRequest>,
) -> Response {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => {
            let (status, message) = rejection_parts(&rejection);
            return route_error(status, message);
        }
    };
    let (start, end) = match validate_endpoints(&request.start, &request.end) {
        Ok(pair) => pair,
        Err(e) => return route_error(StatusCode::BAD_REQUEST, e.user_message()),
    };

    match state.plan_route(&start, &end).await {
        Ok(itinerary) => {
            info!(
                "Route {} -> {}: {} segments, {} km",
                start,
                end,
                itinerary.segments.len(),
                itinerary.total_distance_km
            );
            Json(itinerary).into_response()
        }
        Err(e @ PlannerError::NoRoute { .. }) => route_error(StatusCode::OK, e.user_message()),
        Err(e) => {
            warn!("Route planning failed: {}", e);
            route_error(StatusCode::BAD_GATEWAY, e.user_message())
        }
    }
}

#[instrument(skip(state))]
async fn distance(
    State(state): State<AppState>,
    request: JsonBody<TripRequest>,
) -> Response {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => {
            let (status, message) = rejection_parts(&rejection);
            return error_response(status, message);
        }
    };
    let (start, end) = match validate_endpoints(&request.start, &request.end) {
        Ok(pair) => pair,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.user_message()),
    };

    match state.distance.estimate(&start, &end).await {
        Ok(estimate) => Json(estimate).into_response(),
        Err(e) => {
            warn!("Distance estimate failed: {}", e);
            error_response(
                StatusCode::BAD_GATEWAY,
                format!("Could not estimate the distance from {start} to {end}."),
            )
        }
    }
}

async fn fuel_estimate(request: JsonBody<FuelRequest>) -> Response {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => {
            let (status, message) = rejection_parts(&rejection);
            return error_response(status, message);
        }
    };
    match fuel::estimate(
        &request.vehicle,
        request.fuel_type.as_deref(),
        request.distance_km,
    ) {
        Ok(estimate) => Json(estimate).into_response(),
        Err(e) => error_response(StatusCode::BAD_REQUEST, e.user_message()),
    }
}

#[instrument(skip_all)]
async fn chat(
    State(state): State<AppState>,
    request: JsonBody<ChatRequest>,
) -> Response {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => {
            let (status, message) = rejection_parts(&rejection);
            return error_response(status, message);
        }
    };
    if request.message.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "message is required");
    }

    let answer = bounded(
        "chat request",
        state.call_timeout,
        answer_with_weather(
            state.llm.as_ref(),
            &state.weather,
            &request.message,
            &request.cities,
        ),
    )
    .await;

    match answer {
        Ok(reply) => Json(json!({ "reply": reply.trim() })).into_response(),
        Err(e) => {
            warn!("Chat request failed: {}", e);
            error_response(StatusCode::BAD_GATEWAY, e.user_message())
        }
    }
}

#[instrument(skip(state))]
async fn weather_check(
    State(state): State<AppState>,
    request: JsonBody<TripRequest>,
) -> Response {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => {
            let (status, message) = rejection_parts(&rejection);
            return error_response(status, message);
        }
    };
    let (start, end) = match validate_endpoints(&request.start, &request.end) {
        Ok(pair) => pair,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.user_message()),
    };
    Json(state.weather_check.plan_safe_route(&start, &end).await).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Delhi", "Kanpur", true)]
    #[case("  Delhi ", "Kanpur", true)]
    #[case("", "Kanpur", false)]
    #[case("Delhi", "   ", false)]
    #[case("Delhi", "delhi", false)]
    fn test_validate_endpoints(#[case] start: &str, #[case] end: &str, #[case] ok: bool) {
        assert_eq!(validate_endpoints(start, end).is_ok(), ok);
    }

    #[test]
    fn test_validate_trims() {
        let (start, end) = validate_endpoints(" Delhi ", "Kanpur\n").unwrap();
        assert_eq!((start.as_str(), end.as_str()), ("Delhi", "Kanpur"));
    }

    #[test]
    fn test_chat_request_cities_default_to_empty() {
        let request: ChatRequest = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert!(request.cities.is_empty());
    }
}
