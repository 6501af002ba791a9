//! Google Gemini `generateContent` client

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde_json::json;
use std::time::Instant;
use tracing::{debug, info, instrument};

use super::LanguageModel;
use crate::config::LlmConfig;
use crate::http::{build_client, check_status};
use crate::{PlannerError, Result};

pub struct GeminiClient {
    client: ClientWithMiddleware,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_seconds, config.max_retries)?,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    fn generate_url(&self, api_key: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url,
            self.model,
            urlencoding::encode(api_key)
        )
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    #[instrument(name = "gemini_generate", skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn answer_query(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| PlannerError::config("GEMINI_API_KEY is not configured"))?;

        let start_time = Instant::now();
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .client
            .post(self.generate_url(api_key))
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&body)?)
            .send()
            .await?;
        let response = check_status(response, "Gemini").await?;
        let parsed: GenerateResponse = response.json().await?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .ok_or_else(|| PlannerError::api("Gemini returned no candidates"))?;

        info!(
            "Gemini answered in {:.3}s ({} chars)",
            start_time.elapsed().as_secs_f64(),
            text.len()
        );
        debug!("Gemini answer: {}", text);
        Ok(text)
    }
}
