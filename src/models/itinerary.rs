//! Enriched segments and the aggregated itinerary

use serde::{Deserialize, Serialize};

use super::{Segment, TrafficStep, WeatherReading, round2};

/// A segment annotated with weather, traffic, distance and advisory text
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EnrichedSegment {
    pub from: String,
    pub to: String,
    pub highway: String,
    pub from_weather: WeatherReading,
    pub to_weather: WeatherReading,
    pub traffic: Vec<TrafficStep>,
    /// Kilometres, rounded to two decimals
    pub distance_km: f64,
    /// Short driving tips for this leg
    #[serde(rename = "guidelines")]
    pub advisory: String,
}

impl EnrichedSegment {
    #[must_use]
    pub fn new(
        segment: Segment,
        from_weather: WeatherReading,
        to_weather: WeatherReading,
        traffic: Vec<TrafficStep>,
        distance_km: f64,
        advisory: String,
    ) -> Self {
        Self {
            from: segment.from,
            to: segment.to,
            highway: segment.highway,
            from_weather,
            to_weather,
            traffic,
            distance_km: round2(distance_km),
            advisory,
        }
    }
}

/// Final route payload
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Itinerary {
    #[serde(rename = "route_segments")]
    pub segments: Vec<EnrichedSegment>,
    pub total_distance_km: f64,
}

impl Itinerary {
    /// Build from enriched segments and the unrounded running total
    #[must_use]
    pub fn new(segments: Vec<EnrichedSegment>, unrounded_total_km: f64) -> Self {
        Self {
            segments,
            total_distance_km: round2(unrounded_total_km),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_rounded_at_construction() {
        let segment = EnrichedSegment::new(
            Segment::new("Delhi", "Kanpur", "NH2"),
            WeatherReading::unknown(),
            WeatherReading::unknown(),
            vec![],
            123.456_7,
            String::new(),
        );
        assert_eq!(segment.distance_km, 123.46);
    }

    #[test]
    fn test_itinerary_json_shape() {
        let itinerary = Itinerary::new(vec![], 10.004);
        let json = serde_json::to_value(&itinerary).unwrap();
        assert_eq!(json["total_distance_km"], 10.0);
        assert!(json["route_segments"].as_array().unwrap().is_empty());
    }
}
