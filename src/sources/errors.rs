//! Fetch error differentiation
//!
//! Classifies transport and API failures so callers can tell a timeout
//! from a bad status from an unparseable body.

use serde::Deserialize;
use thiserror::Error;

/// Structured fetch error types
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Request exceeded the configured timeout
    #[error("request timed out")]
    Timeout,
    /// Connection/DNS/TLS error
    #[error("network error: {0}")]
    Network(String),
    /// Non-success HTTP status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    /// Body did not match the expected shape
    #[error("failed to decode response: {0}")]
    Decode(String),
    /// The API answered but the requested entity is absent
    #[error("not found: {0}")]
    NotFound(String),
    /// An API key the source requires is not configured
    #[error("{0} is not set")]
    MissingApiKey(&'static str),
}

/// Error body shapes used by the upstream APIs
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    /// Binance
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error: Option<String>,
    /// SportsData.io, Hashrate Index
    #[serde(default, alias = "Message")]
    message: Option<String>,
}

impl FetchError {
    /// Build an error from a non-success response
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ApiErrorBody>(body)
            .ok()
            .and_then(|parsed| parsed.msg.or(parsed.error).or(parsed.message))
            .unwrap_or_else(|| body.chars().take(200).collect());

        if status == 404 {
            return FetchError::NotFound(message);
        }

        FetchError::Status { status, message }
    }

    /// Classify a reqwest error
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else if err.is_connect() {
            FetchError::Network("connection failed".to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }

    /// Rate limiting shows up as 418/429 on Binance and 429 elsewhere
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::Status { status: 418 | 429, .. })
    }
}
