//! Client error types

use panaderia_core::CoreError;
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Status the backend uses for throttled requests
pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Status the backend uses for missing or expired credentials
pub const STATUS_UNAUTHORIZED: u16 = 401;

/// A non-2xx response, with the parsed body
///
/// `data` is whatever the body parsed to: JSON when possible, the raw text
/// otherwise, and `null` for an empty body.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("HTTP {status}")]
pub struct ApiError {
    pub status: u16,
    pub data: JsonValue,
}

impl ApiError {
    pub fn new(status: u16, data: JsonValue) -> Self {
        Self { status, data }
    }

    /// The `detail` string DRF attaches to most errors
    pub fn detail(&self) -> Option<&str> {
        self.data.get("detail").and_then(JsonValue::as_str)
    }

    /// Raw value of a field in the error body
    pub fn field(&self, name: &str) -> Option<&JsonValue> {
        self.data.get(name)
    }
}

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or transport failure; no response was received
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-2xx status
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The caller cancelled the request
    #[error("Request aborted")]
    Aborted,

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl ClientError {
    /// HTTP status, when the server answered
    pub fn status(&self) -> Option<u16> {
        self.api().map(|e| e.status)
    }

    /// The API error, when the server answered
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(STATUS_TOO_MANY_REQUESTS)
    }

    pub fn is_auth_expired(&self) -> bool {
        self.status() == Some(STATUS_UNAUTHORIZED)
    }
}

impl From<CoreError> for ClientError {
    fn from(err: CoreError) -> Self {
        Self::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_helpers() {
        let err = ClientError::from(ApiError::new(429, JsonValue::Null));
        assert!(err.is_rate_limited());
        assert!(!err.is_auth_expired());
        assert_eq!(err.status(), Some(429));

        let err = ClientError::from(ApiError::new(401, json!({"detail": "expired"})));
        assert!(err.is_auth_expired());
        assert_eq!(err.api().and_then(ApiError::detail), Some("expired"));

        assert!(ClientError::Aborted.is_aborted());
        assert_eq!(ClientError::Aborted.status(), None);
    }
}
