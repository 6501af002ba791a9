//! City-to-city distance estimate
//!
//! The language model is asked first; if its answer carries no number the
//! maps route distance is used. When neither produces a value the caller
//! gets an error instead of a made-up figure.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::directions::DirectionsClient;
use crate::distance::extract_first_number;
use crate::http::bounded;
use crate::llm::LanguageModel;
use crate::models::round2;
use crate::{PlannerError, Result};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DistanceSource {
    Llm,
    Maps,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DistanceEstimate {
    pub start: String,
    pub end: String,
    pub distance_km: f64,
    pub source: DistanceSource,
}

pub struct DistanceEstimator {
    llm: Arc<dyn LanguageModel>,
    directions: DirectionsClient,
    call_timeout: Duration,
}

impl DistanceEstimator {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        directions: DirectionsClient,
        call_timeout: Duration,
    ) -> Self {
        Self {
            llm,
            directions,
            call_timeout,
        }
    }

    #[instrument(skip(self))]
    pub async fn estimate(&self, start: &str, end: &str) -> Result<DistanceEstimate> {
        let (distance_km, source) = match self.ask_model(start, end).await {
            Some(km) => (km, DistanceSource::Llm),
            None => {
                let km = bounded("route distance lookup", self.call_timeout, async {
                    Ok(self.directions.route_distance_km(start, end).await)
                })
                .await
                .unwrap_or(0.0);
                if km <= 0.0 {
                    return Err(PlannerError::api(format!(
                        "Distance between {start} and {end} is unavailable"
                    )));
                }
                (km, DistanceSource::Maps)
            }
        };

        info!("{} -> {}: {:.2} km ({:?})", start, end, distance_km, source);
        Ok(DistanceEstimate {
            start: start.to_string(),
            end: end.to_string(),
            distance_km: round2(distance_km),
            source,
        })
    }

    async fn ask_model(&self, start: &str, end: &str) -> Option<f64> {
        let prompt = format!(
            "What is the approximate road distance in kilometres from {start} to {end}? \
             Reply with a single number only."
        );
        let answer = bounded(
            "distance request",
            self.call_timeout,
            self.llm.answer_query(&prompt),
        )
        .await;

        match answer {
            Ok(text) => {
                let km = extract_first_number(&text).filter(|km| *km > 0.0);
                if km.is_none() {
                    warn!("No distance found in model answer: {}", text.trim());
                }
                km
            }
            Err(e) => {
                warn!("Distance request failed: {}", e);
                None
            }
        }
    }
}
