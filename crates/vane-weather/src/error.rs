//! Weather pipeline error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("Address must not be blank")]
    InvalidAddress,

    #[error("Weather API key is not configured")]
    MissingApiKey,

    #[error("Provider error: {status} - {message}")]
    Provider { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Cache error: {0}")]
    Cache(String),
}

impl WeatherError {
    /// User-friendly error message for display.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidAddress => "Please enter a location to look up.".to_string(),
            Self::MissingApiKey => {
                "Weather service is not configured. Please try again later.".to_string()
            }
            Self::Provider { .. } => "Weather service error. Please try again.".to_string(),
            Self::Network(_) => "Network error. Check your connection.".to_string(),
            Self::Parse(_) => {
                "Received an unexpected response from the weather service.".to_string()
            }
            Self::Cache(_) => "Weather data may be outdated.".to_string(),
        }
    }

    /// Whether retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider { status, .. } => *status >= 500,
            Self::Network(_) => true,
            _ => false,
        }
    }
}

impl From<rusqlite::Error> for WeatherError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Cache(e.to_string())
    }
}
