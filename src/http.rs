//! Shared plumbing for external HTTP services
//!
//! Every collaborator client is built on a `reqwest` client wrapped in
//! retry middleware, and every external call made by the pipeline runs
//! under a finite timeout via [`bounded`].

use std::future::Future;
use std::time::Duration;

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use tracing::warn;

use crate::{PlannerError, Result};

const USER_AGENT: &str = concat!("SmartRoute/", env!("CARGO_PKG_VERSION"));

/// Build a client with a request timeout and transient-failure retries
pub fn build_client(timeout_seconds: u32, max_retries: u32) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds.into()))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| PlannerError::config(format!("Failed to create HTTP client: {e}")))?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Run an external call, failing with [`PlannerError::Timeout`] once `limit` elapses
pub async fn bounded<T, F>(operation: &str, limit: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!("{} exceeded {:.1}s", operation, limit.as_secs_f64());
            Err(PlannerError::timeout(format!(
                "{operation} exceeded {}s",
                limit.as_secs()
            )))
        }
    }
}

/// Turn a non-success status into an API error carrying the body text
pub async fn check_status(response: reqwest::Response, service: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PlannerError::api(format!(
        "{service} returned {status}: {}",
        body.chars().take(200).collect::<String>()
    )))
}
