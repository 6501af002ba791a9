//! Language model collaborator
//!
//! The pipeline only needs an opaque `answer_query(prompt) -> text`
//! capability. [`GeminiClient`] is the production implementation; tests
//! substitute their own [`LanguageModel`] implementations.

use async_trait::async_trait;
use tracing::debug;

use crate::Result;
use crate::weather::WeatherClient;

pub mod gemini;

pub use gemini::GeminiClient;

/// Opaque text-completion capability
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send a prompt and return the model's text answer
    async fn answer_query(&self, prompt: &str) -> Result<String>;
}

/// Answer a query, appending live weather for `cities` to the prompt
pub async fn answer_with_weather(
    llm: &dyn LanguageModel,
    weather: &WeatherClient,
    query: &str,
    cities: &[String],
) -> Result<String> {
    let prompt = if cities.is_empty() {
        query.to_string()
    } else {
        let mut lines = Vec::with_capacity(cities.len());
        for city in cities {
            let reading = weather.get_weather(city).await;
            lines.push(format!("{city}: {}", reading.format_summary()));
        }
        debug!("Added weather context for {} cities", lines.len());
        format!(
            "{query}\n\nLive weather along the route:\n{}",
            lines.join("\n")
        )
    };

    llm.answer_query(&prompt).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeatherReading;
    use crate::weather::WeatherProvider;
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct RecordingModel {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LanguageModel for RecordingModel {
        async fn answer_query(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().push(prompt.to_string());
            Ok("ok".to_string())
        }
    }

    struct SunnyEverywhere;

    #[async_trait]
    impl WeatherProvider for SunnyEverywhere {
        async fn current(&self, _city: &str) -> Result<WeatherReading> {
            Ok(WeatherReading::new("Sunny", "31"))
        }
    }

    #[tokio::test]
    async fn test_weather_context_appended() {
        let model = RecordingModel {
            prompts: Mutex::new(Vec::new()),
        };
        let weather = WeatherClient::new(Arc::new(SunnyEverywhere));
        let cities = vec!["Delhi".to_string(), "Patna".to_string()];

        let reply = answer_with_weather(&model, &weather, "Is it safe?", &cities)
            .await
            .unwrap();

        assert_eq!(reply, "ok");
        let prompts = model.prompts.lock();
        assert_eq!(
            prompts[0],
            "Is it safe?\n\nLive weather along the route:\nDelhi: Sunny, 31°C\nPatna: Sunny, 31°C"
        );
    }

    #[tokio::test]
    async fn test_no_cities_sends_query_verbatim() {
        let model = RecordingModel {
            prompts: Mutex::new(Vec::new()),
        };
        let weather = WeatherClient::new(Arc::new(SunnyEverywhere));

        answer_with_weather(&model, &weather, "Hello", &[]).await.unwrap();
        assert_eq!(model.prompts.lock()[0], "Hello");
    }
}
