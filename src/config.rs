//! Configuration management for the SmartRoute planner
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::PlannerError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// HTTP server settings
    pub server: ServerConfig,
    /// Language model settings
    pub llm: LlmConfig,
    /// Weather provider settings
    pub weather: WeatherConfig,
    /// Maps/directions provider settings
    pub maps: MapsConfig,
    /// Highway dataset settings
    pub dataset: DatasetConfig,
    /// Route assembly settings
    pub routing: RoutingConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum accepted request body in bytes
    pub max_body_bytes: usize,
    /// PEM certificate chain, enables TLS together with `tls_key`
    pub tls_cert: Option<String>,
    pub tls_key: Option<String>,
}

/// Gemini settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Maximum number of retries for transient failures
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Base URL of the wttr.in compatible service
    pub base_url: String,
    pub timeout_seconds: u32,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapsConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_seconds: u32,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// CSV file with `start_city,end_city[,highway]` rows
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Segments enriched concurrently within one request
    pub max_concurrency: usize,
    /// Upper bound for any single external call, in seconds
    pub call_timeout_seconds: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
    /// OTLP/HTTP collector endpoint; spans are exported when set
    pub otlp_endpoint: Option<String>,
    pub service_name: String,
}

// Default value functions
fn default_llm_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_llm_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_weather_base_url() -> String {
    "https://wttr.in".to_string()
}

fn default_maps_base_url() -> String {
    "https://maps.googleapis.com".to_string()
}

fn default_max_retries() -> u32 {
    2
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_body_bytes: 64 * 1024,
            tls_cert: None,
            tls_key: None,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            timeout_seconds: 60,
            max_retries: default_max_retries(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            timeout_seconds: 10,
            max_retries: default_max_retries(),
        }
    }
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_maps_base_url(),
            timeout_seconds: 15,
            max_retries: default_max_retries(),
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: Some("data/highways.csv".to_string()),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            call_timeout_seconds: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            otlp_endpoint: None,
            service_name: "smartroute".to_string(),
        }
    }
}

impl RoutingConfig {
    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_seconds.into())
    }
}

impl PlannerConfig {
    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // SMARTROUTE__SERVER__PORT=9000 style overrides
        builder = builder.add_source(
            Environment::with_prefix("SMARTROUTE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: PlannerConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_env_secrets(|name| std::env::var(name).ok());
        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("smartroute").join("config.toml"))
    }

    /// Fill API keys from the provider-conventional variables when the
    /// config leaves them unset.
    pub fn apply_env_secrets<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.llm.api_key.is_none() {
            self.llm.api_key = lookup("GEMINI_API_KEY").filter(|k| !k.is_empty());
        }
        if self.maps.api_key.is_none() {
            self.maps.api_key = lookup("GOOGLE_MAPS_API_KEY").filter(|k| !k.is_empty());
        }
    }

    /// Apply default values to blank configuration fields
    pub fn apply_defaults(&mut self) {
        if self.llm.base_url.is_empty() {
            self.llm.base_url = default_llm_base_url();
        }
        if self.llm.model.is_empty() {
            self.llm.model = default_llm_model();
        }
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.maps.base_url.is_empty() {
            self.maps.base_url = default_maps_base_url();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        let timeouts = [
            ("LLM", self.llm.timeout_seconds),
            ("Weather", self.weather.timeout_seconds),
            ("Maps", self.maps.timeout_seconds),
            ("Routing call", self.routing.call_timeout_seconds),
        ];
        for (name, seconds) in timeouts {
            if seconds == 0 || seconds > 300 {
                return Err(PlannerError::config(format!(
                    "{name} timeout must be between 1 and 300 seconds"
                ))
                .into());
            }
        }

        let retries = [
            ("LLM", self.llm.max_retries),
            ("Weather", self.weather.max_retries),
            ("Maps", self.maps.max_retries),
        ];
        for (name, count) in retries {
            if count > 10 {
                return Err(
                    PlannerError::config(format!("{name} max retries cannot exceed 10")).into(),
                );
            }
        }

        if self.routing.max_concurrency == 0 || self.routing.max_concurrency > 64 {
            return Err(
                PlannerError::config("Routing max concurrency must be between 1 and 64").into(),
            );
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(PlannerError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(PlannerError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let urls = [
            ("LLM", &self.llm.base_url),
            ("Weather", &self.weather.base_url),
            ("Maps", &self.maps.base_url),
        ];
        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(PlannerError::config(format!(
                    "{name} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if self.server.tls_cert.is_some() != self.server.tls_key.is_some() {
            return Err(PlannerError::config(
                "TLS requires both server.tls_cert and server.tls_key",
            )
            .into());
        }

        Ok(())
    }
}
