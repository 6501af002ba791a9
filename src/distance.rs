//! Distance text parsing
//!
//! Directions providers format step distances as display text ("1,204 km",
//! "350 m"), and language models answer distance questions in prose. Both
//! are reduced to kilometres here.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::TrafficStep;

static STEP_DISTANCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*(km|m|mi|ft)?\b").expect("valid regex")
});

static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("valid regex"));

const KM_PER_MILE: f64 = 1.609_344;
const KM_PER_FOOT: f64 = 0.000_304_8;

/// Kilometres for a provider distance string, `None` if it has no leading number
#[must_use]
pub fn parse_step_distance_km(text: &str) -> Option<f64> {
    let cleaned = text.replace(',', "").to_lowercase();
    let caps = STEP_DISTANCE.captures(&cleaned)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let km = match caps.get(2).map(|m| m.as_str()) {
        Some("m") => value / 1000.0,
        Some("mi") => value * KM_PER_MILE,
        Some("ft") => value * KM_PER_FOOT,
        _ => value,
    };
    km.is_finite().then_some(km)
}

/// Sum of all parseable step distances, `0.0` when none parse
#[must_use]
pub fn sum_step_distances_km(steps: &[TrafficStep]) -> f64 {
    steps
        .iter()
        .filter_map(|step| parse_step_distance_km(&step.distance_text))
        .sum()
}

/// First integer or decimal in free text, ignoring thousands separators
#[must_use]
pub fn extract_first_number(text: &str) -> Option<f64> {
    let found = FIRST_NUMBER.find(text)?;
    let value: f64 = found.as_str().replace(',', "").parse().ok()?;
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinate;
    use rstest::rstest;

    fn step(distance: &str) -> TrafficStep {
        TrafficStep {
            from: Coordinate::default(),
            to: Coordinate::default(),
            distance_text: distance.to_string(),
            duration_text: String::new(),
            traffic_duration_text: String::new(),
            instruction: String::new(),
        }
    }

    #[rstest]
    #[case("12.4 km", Some(12.4))]
    #[case("1,204 km", Some(1204.0))]
    #[case("350 m", Some(0.35))]
    #[case("2 mi", Some(3.218_688))]
    #[case("500", Some(500.0))]
    #[case("", None)]
    #[case("unknown", None)]
    fn test_parse_step_distance(#[case] text: &str, #[case] expected: Option<f64>) {
        match (parse_step_distance_km(text), expected) {
            (Some(actual), Some(expected)) => assert!((actual - expected).abs() < 1e-9),
            (actual, expected) => assert_eq!(actual, expected),
        }
    }

    #[test]
    fn test_sum_skips_unparseable_steps() {
        let steps = vec![step("300 km"), step("n/a"), step("200 km")];
        assert_eq!(sum_step_distances_km(&steps), 500.0);
    }

    #[test]
    fn test_sum_of_nothing_is_zero() {
        assert_eq!(sum_step_distances_km(&[]), 0.0);
        assert_eq!(sum_step_distances_km(&[step("--")]), 0.0);
    }

    #[rstest]
    #[case("Approximately 1,450 km by road.", Some(1450.0))]
    #[case("1450.5", Some(1450.5))]
    #[case("The distance is about 980 kilometres (610 miles).", Some(980.0))]
    #[case("I don't know.", None)]
    #[case("", None)]
    fn test_extract_first_number(#[case] text: &str, #[case] expected: Option<f64>) {
        assert_eq!(extract_first_number(text), expected);
    }
}
