//! Weather snapshot model

use serde::{Deserialize, Serialize};

/// Description used when a weather lookup fails
pub const UNKNOWN_DESCRIPTION: &str = "Unknown";
/// Temperature used when a weather lookup fails
pub const UNKNOWN_TEMPERATURE: &str = "N/A";

/// Current conditions for a city, treated as a snapshot
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherReading {
    /// Human-readable description of weather conditions
    pub description: String,
    /// Temperature in Celsius as reported, or "N/A"
    pub temperature_c: String,
}

impl WeatherReading {
    #[must_use]
    pub fn new(description: impl Into<String>, temperature_c: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            temperature_c: temperature_c.into(),
        }
    }

    /// Reading substituted for any failed lookup
    #[must_use]
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_DESCRIPTION, UNKNOWN_TEMPERATURE)
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.description == UNKNOWN_DESCRIPTION && self.temperature_c == UNKNOWN_TEMPERATURE
    }

    /// Format as "Light rain, 24°C"
    #[must_use]
    pub fn format_summary(&self) -> String {
        format!("{}, {}°C", self.description, self.temperature_c)
    }
}
