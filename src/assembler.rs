//! Itinerary assembly
//!
//! Enriches each segment with traffic, weather, a distance estimate and
//! advisory text, then totals the distances. Segments are processed
//! concurrently (up to `max_concurrency` at a time) but results keep the
//! input order. Weather and traffic lookups go through request-scoped
//! single-flight caches created per [`RouteAssembler::assemble`] call.

use std::sync::Arc;
use std::time::Duration;

use futures::{StreamExt, stream};
use tracing::{debug, info, instrument, warn};

use crate::cache::RequestCache;
use crate::directions::DirectionsClient;
use crate::distance::sum_step_distances_km;
use crate::http::bounded;
use crate::llm::LanguageModel;
use crate::models::{EnrichedSegment, Itinerary, Segment, TrafficStep, WeatherReading};
use crate::weather::WeatherClient;

type WeatherCache = RequestCache<String, WeatherReading>;
type TrafficCache = RequestCache<(String, String), Vec<TrafficStep>>;

pub struct RouteAssembler {
    llm: Arc<dyn LanguageModel>,
    weather: WeatherClient,
    directions: DirectionsClient,
    max_concurrency: usize,
    call_timeout: Duration,
}

impl RouteAssembler {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        weather: WeatherClient,
        directions: DirectionsClient,
        max_concurrency: usize,
        call_timeout: Duration,
    ) -> Self {
        Self {
            llm,
            weather,
            directions,
            max_concurrency: max_concurrency.max(1),
            call_timeout,
        }
    }

    /// Enrich `segments` in order and total their distances
    #[instrument(skip_all, fields(segments = segments.len()))]
    pub async fn assemble(&self, segments: Vec<Segment>) -> Itinerary {
        let weather_cache = WeatherCache::new();
        let traffic_cache = TrafficCache::new();

        let enriched: Vec<(EnrichedSegment, f64)> = stream::iter(segments)
            .map(|segment| self.enrich(segment, &weather_cache, &traffic_cache))
            .buffered(self.max_concurrency)
            .collect()
            .await;

        // Accumulate unrounded values; rounding happens in Itinerary::new
        let total_km: f64 = enriched.iter().map(|(_, km)| km).sum();
        let segments: Vec<EnrichedSegment> =
            enriched.into_iter().map(|(segment, _)| segment).collect();

        info!(
            "Assembled {} segments, {:.2} km ({} cities, {} pairs looked up)",
            segments.len(),
            total_km,
            weather_cache.key_count(),
            traffic_cache.key_count()
        );
        Itinerary::new(segments, total_km)
    }

    /// Returns the enriched segment together with its unrounded distance
    async fn enrich(
        &self,
        segment: Segment,
        weather_cache: &WeatherCache,
        traffic_cache: &TrafficCache,
    ) -> (EnrichedSegment, f64) {
        let (traffic, from_weather, to_weather) = tokio::join!(
            self.traffic(&segment, traffic_cache),
            self.city_weather(&segment.from, weather_cache),
            self.city_weather(&segment.to, weather_cache),
        );

        let distance_km = self.distance_km(&segment, &traffic).await;
        let advisory = self.advisory(&segment, &to_weather, &traffic).await;

        let enriched = EnrichedSegment::new(
            segment,
            from_weather,
            to_weather,
            traffic,
            distance_km,
            advisory,
        );
        (enriched, distance_km)
    }

    async fn traffic(&self, segment: &Segment, cache: &TrafficCache) -> Vec<TrafficStep> {
        cache
            .get_or_fetch(segment.city_pair(), || async {
                bounded(
                    "directions lookup",
                    self.call_timeout,
                    async { Ok(self.directions.get_directions(&segment.from, &segment.to).await) },
                )
                .await
                .unwrap_or_default()
            })
            .await
    }

    async fn city_weather(&self, city: &str, cache: &WeatherCache) -> WeatherReading {
        cache
            .get_or_fetch(city.to_string(), || async {
                bounded("weather lookup", self.call_timeout, async {
                    Ok(self.weather.get_weather(city).await)
                })
                .await
                .unwrap_or_else(|_| WeatherReading::unknown())
            })
            .await
    }

    /// Step sum first, then the point-to-point route distance, else zero
    async fn distance_km(&self, segment: &Segment, traffic: &[TrafficStep]) -> f64 {
        let from_steps = sum_step_distances_km(traffic);
        if from_steps > 0.0 {
            return from_steps;
        }

        debug!(
            "No step distances for {} -> {}, asking for route distance",
            segment.from, segment.to
        );
        let fallback = bounded("route distance lookup", self.call_timeout, async {
            Ok(self
                .directions
                .route_distance_km(&segment.from, &segment.to)
                .await)
        })
        .await
        .unwrap_or(0.0);

        if fallback <= 0.0 {
            warn!("No distance available for {} -> {}", segment.from, segment.to);
            return 0.0;
        }
        fallback
    }

    async fn advisory(
        &self,
        segment: &Segment,
        destination_weather: &WeatherReading,
        traffic: &[TrafficStep],
    ) -> String {
        let prompt = advisory_prompt(segment, destination_weather, traffic);
        match bounded(
            "advisory request",
            self.call_timeout,
            self.llm.answer_query(&prompt),
        )
        .await
        {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(
                    "Advisory for {} -> {} unavailable: {}",
                    segment.from, segment.to, e
                );
                String::new()
            }
        }
    }
}

fn advisory_prompt(
    segment: &Segment,
    destination_weather: &WeatherReading,
    traffic: &[TrafficStep],
) -> String {
    let traffic_time = traffic
        .first()
        .map(|step| step.traffic_duration_text.as_str())
        .filter(|text| !text.is_empty())
        .unwrap_or("N/A");
    format!(
        "Give 3-4 short, practical driving tips for the highway leg from {} to {} on {}.\n\
         Weather at {}: {}.\n\
         Traffic-adjusted travel time: {}.\n\
         Answer with the tips only.",
        segment.from,
        segment.to,
        segment.highway,
        segment.to,
        destination_weather.format_summary(),
        traffic_time
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directions::DirectionsProvider;
    use crate::models::Coordinate;
    use crate::weather::WeatherProvider;
    use crate::{PlannerError, Result};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    fn step(distance: &str, traffic: &str) -> TrafficStep {
        TrafficStep {
            from: Coordinate::default(),
            to: Coordinate::default(),
            distance_text: distance.to_string(),
            duration_text: "1 hour".to_string(),
            traffic_duration_text: traffic.to_string(),
            instruction: "Head east".to_string(),
        }
    }

    /// Canned steps and route distances per city pair, with optional delays
    #[derive(Default)]
    struct FakeDirections {
        steps: HashMap<(String, String), Vec<TrafficStep>>,
        meters: HashMap<(String, String), f64>,
        delays_ms: HashMap<(String, String), u64>,
        step_calls: Mutex<Vec<(String, String)>>,
    }

    impl FakeDirections {
        fn key(origin: &str, destination: &str) -> (String, String) {
            (origin.to_string(), destination.to_string())
        }

        fn with_steps(mut self, o: &str, d: &str, steps: Vec<TrafficStep>) -> Self {
            self.steps.insert(Self::key(o, d), steps);
            self
        }

        fn with_meters(mut self, o: &str, d: &str, meters: f64) -> Self {
            self.meters.insert(Self::key(o, d), meters);
            self
        }

        fn with_delay(mut self, o: &str, d: &str, ms: u64) -> Self {
            self.delays_ms.insert(Self::key(o, d), ms);
            self
        }
    }

    #[async_trait]
    impl DirectionsProvider for FakeDirections {
        async fn steps(&self, origin: &str, destination: &str) -> Result<Vec<TrafficStep>> {
            let key = Self::key(origin, destination);
            self.step_calls.lock().push(key.clone());
            if let Some(ms) = self.delays_ms.get(&key) {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            }
            self.steps
                .get(&key)
                .cloned()
                .ok_or_else(|| PlannerError::api("ZERO_RESULTS"))
        }

        async fn route_distance_m(&self, origin: &str, destination: &str) -> Result<f64> {
            self.meters
                .get(&Self::key(origin, destination))
                .copied()
                .ok_or_else(|| PlannerError::api("NOT_FOUND"))
        }
    }

    #[derive(Default)]
    struct CountingWeather {
        calls: Mutex<HashMap<String, usize>>,
    }

    #[async_trait]
    impl WeatherProvider for CountingWeather {
        async fn current(&self, city: &str) -> Result<WeatherReading> {
            *self.calls.lock().entry(city.to_string()).or_default() += 1;
            if city == "Patna" {
                return Err(PlannerError::api("offline"));
            }
            Ok(WeatherReading::new("Sunny", "30"))
        }
    }

    struct TipsModel;

    #[async_trait]
    impl LanguageModel for TipsModel {
        async fn answer_query(&self, prompt: &str) -> Result<String> {
            if prompt.contains("to Patna") {
                return Err(PlannerError::api("quota exceeded"));
            }
            Ok("  Keep left. Take breaks.  \n".to_string())
        }
    }

    fn assembler(
        directions: FakeDirections,
        weather: Arc<CountingWeather>,
    ) -> (RouteAssembler, Arc<FakeDirections>) {
        let directions = Arc::new(directions);
        let assembler = RouteAssembler::new(
            Arc::new(TipsModel),
            WeatherClient::new(weather),
            DirectionsClient::new(directions.clone()),
            4,
            Duration::from_secs(5),
        );
        (assembler, directions)
    }

    fn delhi_kanpur_patna() -> Vec<Segment> {
        vec![
            Segment::new("Delhi", "Kanpur", "NH2"),
            Segment::new("Kanpur", "Patna", "NH19"),
        ]
    }

    #[tokio::test]
    async fn test_step_sum_plus_route_distance_fallback() {
        let directions = FakeDirections::default()
            .with_steps(
                "Delhi",
                "Kanpur",
                vec![step("300 km", "4 hours 10 mins"), step("200 km", "3 hours")],
            )
            .with_meters("Kanpur", "Patna", 600_000.0);
        let (assembler, _) = assembler(directions, Arc::new(CountingWeather::default()));

        let itinerary = assembler.assemble(delhi_kanpur_patna()).await;

        assert_eq!(itinerary.segments.len(), 2);
        assert_eq!(itinerary.segments[0].distance_km, 500.0);
        assert_eq!(itinerary.segments[1].distance_km, 600.0);
        assert!(itinerary.segments[1].traffic.is_empty());
        assert_eq!(itinerary.total_distance_km, 1100.0);
    }

    #[tokio::test]
    async fn test_missing_distance_keeps_segment_at_zero() {
        let directions = FakeDirections::default().with_steps(
            "Delhi",
            "Kanpur",
            vec![step("120.256 km", "2 hours")],
        );
        let (assembler, _) = assembler(directions, Arc::new(CountingWeather::default()));

        let itinerary = assembler.assemble(delhi_kanpur_patna()).await;

        assert_eq!(itinerary.segments.len(), 2);
        assert_eq!(itinerary.segments[1].distance_km, 0.0);
        assert_eq!(itinerary.total_distance_km, 120.26);
    }

    #[tokio::test]
    async fn test_total_rounds_only_at_the_end() {
        let directions = FakeDirections::default()
            .with_steps("A", "B", vec![step("0.004 km", "1 min")])
            .with_steps("B", "C", vec![step("0.004 km", "1 min")]);
        let (assembler, _) = assembler(directions, Arc::new(CountingWeather::default()));

        let itinerary = assembler
            .assemble(vec![Segment::new("A", "B", "X"), Segment::new("B", "C", "X")])
            .await;

        assert_eq!(itinerary.segments[0].distance_km, 0.0);
        assert_eq!(itinerary.segments[1].distance_km, 0.0);
        assert_eq!(itinerary.total_distance_km, 0.01);
    }

    #[tokio::test(start_paused = true)]
    async fn test_order_preserved_when_later_segments_finish_first() {
        let directions = FakeDirections::default()
            .with_steps("Delhi", "Kanpur", vec![step("10 km", "15 mins")])
            .with_delay("Delhi", "Kanpur", 500)
            .with_steps("Kanpur", "Patna", vec![step("20 km", "25 mins")])
            .with_steps("Patna", "Kolkata", vec![step("30 km", "35 mins")]);
        let (assembler, _) = assembler(directions, Arc::new(CountingWeather::default()));

        let mut segments = delhi_kanpur_patna();
        segments.push(Segment::new("Patna", "Kolkata", "NH19"));
        let itinerary = assembler.assemble(segments.clone()).await;

        let order: Vec<(&str, &str)> = itinerary
            .segments
            .iter()
            .map(|s| (s.from.as_str(), s.to.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![("Delhi", "Kanpur"), ("Kanpur", "Patna"), ("Patna", "Kolkata")]
        );
        assert_eq!(itinerary.total_distance_km, 60.0);
    }

    #[tokio::test]
    async fn test_shared_city_weather_fetched_once() {
        let weather = Arc::new(CountingWeather::default());
        let (assembler, _) = assembler(FakeDirections::default(), weather.clone());

        let itinerary = assembler.assemble(delhi_kanpur_patna()).await;

        let calls = weather.calls.lock();
        assert_eq!(calls.get("Kanpur"), Some(&1));
        assert_eq!(calls.len(), 3);
        assert!(itinerary.segments[1].to_weather.is_unknown());
        assert_eq!(itinerary.segments[0].to_weather, itinerary.segments[1].from_weather);
    }

    #[tokio::test]
    async fn test_repeated_pair_uses_cached_traffic() {
        let directions =
            FakeDirections::default().with_steps("Delhi", "Kanpur", vec![step("5 km", "9 mins")]);
        let (assembler, directions) = assembler(directions, Arc::new(CountingWeather::default()));

        let segment = Segment::new("Delhi", "Kanpur", "NH2");
        let itinerary = assembler
            .assemble(vec![segment.clone(), segment])
            .await;

        assert_eq!(directions.step_calls.lock().len(), 1);
        assert_eq!(itinerary.total_distance_km, 10.0);
    }

    #[tokio::test]
    async fn test_advisory_trimmed_or_empty_on_failure() {
        let (assembler, _) = assembler(FakeDirections::default(), Arc::new(CountingWeather::default()));

        let itinerary = assembler.assemble(delhi_kanpur_patna()).await;

        assert_eq!(itinerary.segments[0].advisory, "Keep left. Take breaks.");
        assert_eq!(itinerary.segments[1].advisory, "");
    }

    #[tokio::test]
    async fn test_empty_input_gives_empty_itinerary() {
        let (assembler, _) = assembler(FakeDirections::default(), Arc::new(CountingWeather::default()));
        let itinerary = assembler.assemble(Vec::new()).await;
        assert!(itinerary.segments.is_empty());
        assert_eq!(itinerary.total_distance_km, 0.0);
    }

    /// Never answers
    struct SilentUpstream;

    #[async_trait]
    impl DirectionsProvider for SilentUpstream {
        async fn steps(&self, _origin: &str, _destination: &str) -> Result<Vec<TrafficStep>> {
            std::future::pending().await
        }

        async fn route_distance_m(&self, _origin: &str, _destination: &str) -> Result<f64> {
            std::future::pending().await
        }
    }

    #[async_trait]
    impl WeatherProvider for SilentUpstream {
        async fn current(&self, _city: &str) -> Result<WeatherReading> {
            std::future::pending().await
        }
    }

    #[async_trait]
    impl LanguageModel for SilentUpstream {
        async fn answer_query(&self, _prompt: &str) -> Result<String> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unresponsive_collaborators_degrade_within_timeout() {
        let silent = Arc::new(SilentUpstream);
        let assembler = RouteAssembler::new(
            silent.clone(),
            WeatherClient::new(silent.clone()),
            DirectionsClient::new(silent),
            2,
            Duration::from_secs(3),
        );

        let started = tokio::time::Instant::now();
        let itinerary = assembler.assemble(delhi_kanpur_patna()).await;

        assert_eq!(itinerary.segments.len(), 2);
        for segment in &itinerary.segments {
            assert_eq!(segment.distance_km, 0.0);
            assert!(segment.from_weather.is_unknown());
            assert!(segment.to_weather.is_unknown());
            assert!(segment.traffic.is_empty());
            assert_eq!(segment.advisory, "");
        }
        assert_eq!(itinerary.total_distance_km, 0.0);
        // lookups, route distance and advisory each wait one timeout, per segment
        assert!(started.elapsed() <= Duration::from_secs(3 * 3 * 2));
    }

    #[test]
    fn test_advisory_prompt_mentions_weather_and_traffic() {
        let segment = Segment::new("Delhi", "Kanpur", "NH2");
        let weather = WeatherReading::new("Light rain", "24");

        let prompt = advisory_prompt(&segment, &weather, &[step("5 km", "2 hours 5 mins")]);
        assert!(prompt.contains("Light rain, 24°C"));
        assert!(prompt.contains("2 hours 5 mins"));

        let prompt = advisory_prompt(&segment, &weather, &[]);
        assert!(prompt.contains("Traffic-adjusted travel time: N/A"));
    }
}
