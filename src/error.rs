//! Error types and handling for the SmartRoute planner

use thiserror::Error;

/// Main error type for the planner
#[derive(Error, Debug)]
pub enum PlannerError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// External service communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Upstream payload had an unexpected shape
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// An external call exceeded its time budget
    #[error("Timed out: {message}")]
    Timeout { message: String },

    /// Neither the dataset-constrained nor the fallback attempt produced a route
    #[error("No route found from {start} to {end}")]
    NoRoute { start: String, end: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl PlannerError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    pub fn no_route<S: Into<String>, E: Into<String>>(start: S, end: E) -> Self {
        Self::NoRoute {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            PlannerError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            PlannerError::Api { .. } | PlannerError::Parse { .. } => {
                "Unable to get a usable answer from external services. Please try again later."
                    .to_string()
            }
            PlannerError::Timeout { .. } => {
                "An external service took too long to respond. Please try again.".to_string()
            }
            PlannerError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            PlannerError::NoRoute { start, end } => {
                format!("Could not find a route from {start} to {end}.")
            }
            PlannerError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for PlannerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(err.to_string())
        } else {
            Self::api(err.to_string())
        }
    }
}

impl From<reqwest_middleware::Error> for PlannerError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(e) => e.into(),
            reqwest_middleware::Error::Middleware(e) => Self::api(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for PlannerError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(err.to_string())
    }
}

impl From<csv::Error> for PlannerError {
    fn from(err: csv::Error) -> Self {
        Self::parse(format!("CSV error: {err}"))
    }
}
