//! Error types and handling.

use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Request never got a response (connection refused, DNS, timeout)
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("Request failed ({status}): {body}")]
    Status { status: u16, body: String },

    /// Success status but the body could not be decoded
    #[error("Failed to parse response: {0}")]
    Decode(String),

    /// No bearer token available for the request
    #[error("No authentication token found. Please log in again.")]
    MissingToken,

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type alias for AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Create a decode error with message
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a validation error with message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error with message
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Human-readable message from a status error body.
    ///
    /// Backends commonly reply `{"message": "..."}` or `{"message": ["...", "..."]}`;
    /// falls back to the raw body text.
    pub fn server_message(&self) -> Option<String> {
        let Self::Status { body, .. } = self else {
            return None;
        };

        let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
        let message = parsed.as_ref().and_then(|v| v.get("message")).and_then(|m| match m {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Array(items) => {
                let parts: Vec<&str> = items.iter().filter_map(|i| i.as_str()).collect();
                (!parts.is_empty()).then(|| parts.join("; "))
            }
            _ => None,
        });

        match message {
            Some(m) => Some(m),
            None if body.trim().is_empty() => None,
            None => Some(body.trim().to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
