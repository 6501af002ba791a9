//! Bad-weather scan along a route and alternate-route suggestion
//!
//! The route's intermediate cities are checked against the bad-weather
//! keywords. Start and end cities are never flagged since the trip cannot
//! avoid them.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::cache::RequestCache;
use crate::http::bounded;
use crate::llm::LanguageModel;
use crate::models::WeatherReading;
use crate::weather::{WeatherClient, is_bad_weather};

/// Weather at one city on the route
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CityWeather {
    pub city: String,
    pub description: String,
    pub temperature_c: String,
    pub bad_weather: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct WeatherScan {
    pub readings: Vec<CityWeather>,
    pub bad_weather_cities: Vec<String>,
}

/// Result of [`WeatherCheck::plan_safe_route`]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SafeRoutePlan {
    pub route: Vec<String>,
    #[serde(flatten)]
    pub scan: WeatherScan,
    pub alternate_route: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl SafeRoutePlan {
    #[must_use]
    pub fn needs_detour(&self) -> bool {
        !self.scan.bad_weather_cities.is_empty()
    }
}

pub struct WeatherCheck {
    llm: Arc<dyn LanguageModel>,
    weather: WeatherClient,
    call_timeout: Duration,
}

fn same_city(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

impl WeatherCheck {
    pub fn new(llm: Arc<dyn LanguageModel>, weather: WeatherClient, call_timeout: Duration) -> Self {
        Self {
            llm,
            weather,
            call_timeout,
        }
    }

    /// Look up every city and flag bad weather at the non-endpoint ones
    #[instrument(skip(self))]
    pub async fn scan(&self, cities: &[String], start: &str, end: &str) -> WeatherScan {
        let cache: RequestCache<String, WeatherReading> = RequestCache::new();
        let lookups = cities.iter().map(|city| {
            let cache = &cache;
            async move {
                let reading = cache
                    .get_or_fetch(city.to_lowercase(), || async {
                        bounded("weather lookup", self.call_timeout, async {
                            Ok(self.weather.get_weather(city).await)
                        })
                        .await
                        .unwrap_or_else(|_| WeatherReading::unknown())
                    })
                    .await;
                let endpoint = same_city(city, start) || same_city(city, end);
                CityWeather {
                    city: city.clone(),
                    bad_weather: !endpoint && is_bad_weather(&reading.description),
                    description: reading.description,
                    temperature_c: reading.temperature_c,
                }
            }
        });
        let readings = join_all(lookups).await;

        let mut bad_weather_cities: Vec<String> = Vec::new();
        for reading in readings.iter().filter(|r| r.bad_weather) {
            if !bad_weather_cities.iter().any(|c| same_city(c, &reading.city)) {
                bad_weather_cities.push(reading.city.clone());
            }
        }

        WeatherScan {
            readings,
            bad_weather_cities,
        }
    }

    /// Ask for a route, scan it, and request a detour if any city is flagged
    #[instrument(skip(self))]
    pub async fn plan_safe_route(&self, start: &str, end: &str) -> SafeRoutePlan {
        let route = self.suggest_cities(start, end).await;
        let scan = self.scan(&route, start, end).await;

        let alternate_route = if scan.bad_weather_cities.is_empty() {
            None
        } else {
            info!(
                "Bad weather at {}, requesting alternate route",
                scan.bad_weather_cities.join(", ")
            );
            self.suggest_detour(start, end, &scan.bad_weather_cities)
                .await
        };

        SafeRoutePlan {
            route,
            scan,
            alternate_route,
            checked_at: Utc::now(),
        }
    }

    async fn suggest_cities(&self, start: &str, end: &str) -> Vec<String> {
        let prompt = format!(
            "What is the best national highway route from {start} to {end}? \
             Reply with only the city names along the route, in order, separated by commas."
        );
        let answer = match bounded(
            "route city request",
            self.call_timeout,
            self.llm.answer_query(&prompt),
        )
        .await
        {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Route city request failed: {}", e);
                String::new()
            }
        };

        let cities = parse_city_list(&answer);
        if cities.is_empty() {
            return vec![start.to_string(), end.to_string()];
        }
        cities
    }

    async fn suggest_detour(&self, start: &str, end: &str, avoid: &[String]) -> Option<String> {
        let prompt = format!(
            "Suggest an alternate national highway route from {start} to {end} that avoids {} \
             because of bad weather. Reply with the city names along the route, in order, separated by commas.",
            avoid.join(", ")
        );
        match bounded(
            "alternate route request",
            self.call_timeout,
            self.llm.answer_query(&prompt),
        )
        .await
        {
            Ok(text) => {
                let text = text.trim();
                (!text.is_empty()).then(|| text.to_string())
            }
            Err(e) => {
                warn!("Alternate route request failed: {}", e);
                None
            }
        }
    }
}

/// Split a comma or newline separated reply into trimmed city names
fn parse_city_list(text: &str) -> Vec<String> {
    text.split([',', '\n'])
        .map(|part| part.trim().trim_end_matches('.').trim())
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
