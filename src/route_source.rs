//! Candidate route production
//!
//! Tries a dataset-constrained prompt first (only when both endpoints
//! appear in the highway dataset), then an unconstrained prompt. Every
//! failure is soft: the caller receives an empty list and decides how to
//! report the missing route.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::dataset::HighwayDataset;
use crate::http::bounded;
use crate::json_extract::parse_json_array_leniently;
use crate::llm::LanguageModel;
use crate::models::Segment;

const RESPONSE_FORMAT: &str = "Respond with only a JSON array of objects with the keys \
\"from\", \"to\" and \"highway\", one object per consecutive leg in travel order, and no other text.";

/// Which attempt produced a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAttempt {
    Dataset,
    Fallback,
}

pub struct RouteSource {
    llm: Arc<dyn LanguageModel>,
    dataset: Option<Arc<HighwayDataset>>,
    call_timeout: Duration,
}

impl RouteSource {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        dataset: Option<Arc<HighwayDataset>>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            llm,
            dataset,
            call_timeout,
        }
    }

    /// Ordered segments from `start` to `end`; empty when no attempt succeeds
    #[instrument(skip(self))]
    pub async fn get_route(&self, start: &str, end: &str) -> Vec<Segment> {
        if let Some(prompt) = self.dataset_prompt(start, end) {
            let segments = self.attempt(RouteAttempt::Dataset, &prompt).await;
            if !segments.is_empty() {
                info!("Dataset-constrained route with {} segments", segments.len());
                return segments;
            }
        } else {
            debug!("Dataset does not cover {} and {}, skipping constrained attempt", start, end);
        }

        let segments = self
            .attempt(RouteAttempt::Fallback, &fallback_prompt(start, end))
            .await;
        if segments.is_empty() {
            warn!("No route could be produced from {} to {}", start, end);
        } else {
            info!("Fallback route with {} segments", segments.len());
        }
        segments
    }

    fn dataset_prompt(&self, start: &str, end: &str) -> Option<String> {
        let dataset = self.dataset.as_ref()?;
        if !(dataset.contains_city(start) && dataset.contains_city(end)) {
            return None;
        }
        Some(format!(
            "You are a route planner for national highways.\n\
             Using ONLY the highway connections listed below, give the driving route from {start} to {end}.\n\
             Connections:\n{}\n\n{RESPONSE_FORMAT}",
            dataset.describe_connections()
        ))
    }

    async fn attempt(&self, attempt: RouteAttempt, prompt: &str) -> Vec<Segment> {
        let answer = match bounded(
            "route formatting request",
            self.call_timeout,
            self.llm.answer_query(prompt),
        )
        .await
        {
            Ok(answer) => answer,
            Err(e) => {
                warn!("{:?} route request failed: {}", attempt, e);
                return Vec::new();
            }
        };

        match parse_json_array_leniently(&answer) {
            Ok(segments) => {
                if segments.is_empty() {
                    info!("{:?} route request returned no usable segments", attempt);
                }
                segments
            }
            Err(failure) => {
                warn!("{:?} route response was malformed: {}", attempt, failure);
                debug!("Malformed response: {}", answer);
                Vec::new()
            }
        }
    }
}

fn fallback_prompt(start: &str, end: &str) -> String {
    format!(
        "Suggest a realistic driving route from {start} to {end} using national highways, \
         split into consecutive legs between major cities.\n{RESPONSE_FORMAT}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::HighwayRow;
    use crate::{PlannerError, Result};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Replays scripted answers and records every prompt
    struct ScriptedModel {
        answers: Mutex<VecDeque<Result<String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(answers: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().clone()
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn answer_query(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().push(prompt.to_string());
            self.answers
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }

    fn dataset() -> Option<Arc<HighwayDataset>> {
        let row = |a: &str, b: &str, h: &str| HighwayRow {
            start_city: a.to_string(),
            end_city: b.to_string(),
            highway: Some(h.to_string()),
        };
        Some(Arc::new(HighwayDataset::from_rows(vec![
            row("Delhi", "Kanpur", "NH2"),
            row("Kanpur", "Patna", "NH19"),
        ])))
    }

    const DELHI_KANPUR: &str = r#"[{"from":"Delhi","to":"Kanpur","highway":"NH2"}]"#;

    fn source(model: &Arc<ScriptedModel>, dataset: Option<Arc<HighwayDataset>>) -> RouteSource {
        RouteSource::new(model.clone(), dataset, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_dataset_attempt_wins_without_fallback() {
        let model = ScriptedModel::new(vec![Ok(DELHI_KANPUR.to_string())]);
        let segments = source(&model, dataset()).get_route("Delhi", "Kanpur").await;

        assert_eq!(segments, vec![Segment::new("Delhi", "Kanpur", "NH2")]);
        let prompts = model.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Delhi -> Kanpur (NH2)"));
    }

    #[tokio::test]
    async fn test_fallback_after_unparseable_dataset_answer() {
        let model = ScriptedModel::new(vec![
            Ok("Sorry, I can't do that".to_string()),
            Ok(format!("```json\n{DELHI_KANPUR}\n```")),
        ]);
        let segments = source(&model, dataset()).get_route("Delhi", "Kanpur").await;

        assert_eq!(segments.len(), 1);
        let prompts = model.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("Connections:"));
        assert!(prompts[1].starts_with("Suggest a realistic driving route"));
    }

    #[tokio::test]
    async fn test_dataset_miss_goes_straight_to_fallback() {
        let model = ScriptedModel::new(vec![Ok(DELHI_KANPUR.to_string())]);
        let segments = source(&model, dataset()).get_route("Delhi", "Guwahati").await;

        assert_eq!(segments.len(), 1);
        let prompts = model.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(!prompts[0].contains("Connections:"));
    }

    #[tokio::test]
    async fn test_errors_and_empty_arrays_yield_empty_route() {
        let model = ScriptedModel::new(vec![
            Err(PlannerError::api("quota exceeded")),
            Ok("[]".to_string()),
        ]);
        let segments = source(&model, dataset()).get_route("Delhi", "Patna").await;

        assert!(segments.is_empty());
        assert_eq!(model.prompts().len(), 2);
    }

    #[tokio::test]
    async fn test_no_dataset_uses_single_fallback_attempt() {
        let model = ScriptedModel::new(vec![Ok("not json".to_string())]);
        let segments = source(&model, None).get_route("Delhi", "Kanpur").await;

        assert!(segments.is_empty());
        assert_eq!(model.prompts().len(), 1);
    }

    struct SilentModel;

    #[async_trait]
    impl LanguageModel for SilentModel {
        async fn answer_query(&self, _prompt: &str) -> Result<String> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unresponsive_model_yields_empty_route() {
        let source = RouteSource::new(Arc::new(SilentModel), dataset(), Duration::from_secs(5));

        let started = tokio::time::Instant::now();
        let segments = source.get_route("Delhi", "Kanpur").await;

        assert!(segments.is_empty());
        // dataset attempt and fallback attempt each time out once
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(10) && elapsed < Duration::from_secs(11));
    }
}
