//! Generative client error types.
//!
//! Errors are classified once, at the HTTP boundary. Callers branch on
//! [`ErrorKind`] and never inspect message text.

use serde::Deserialize;
use thiserror::Error;

pub type GenAiResult<T> = Result<T, GenAiError>;

/// Closed set of failure kinds callers may branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    RateLimited,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::NotFound => "not_found",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Error)]
pub enum GenAiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Empty result: {0}")]
    EmptyResult(String),

    #[error("Service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Structured error body returned by Google APIs.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl GenAiError {
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn empty_result(msg: impl Into<String>) -> Self {
        Self::EmptyResult(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Classify a non-success HTTP response.
    pub fn from_response(status: u16, body: &str) -> Self {
        let (message, rpc_status) = match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => (envelope.error.message, envelope.error.status),
            Err(_) => (body.trim().to_string(), None),
        };
        let message = if message.is_empty() {
            format!("HTTP {}", status)
        } else {
            message
        };

        match (status, rpc_status.as_deref()) {
            (401 | 403, _) | (_, Some("UNAUTHENTICATED" | "PERMISSION_DENIED")) => {
                Self::Unauthorized(message)
            }
            (404, _) | (_, Some("NOT_FOUND")) => Self::NotFound(message),
            (429, _) | (_, Some("RESOURCE_EXHAUSTED")) => Self::RateLimited(message),
            _ => Self::Api { status, message },
        }
    }

    /// Classify an error embedded in a finished long-running operation.
    ///
    /// Operations report canonical RPC codes rather than HTTP statuses.
    pub fn from_rpc_code(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            5 => Self::NotFound(message),
            7 | 16 => Self::Unauthorized(message),
            8 => Self::RateLimited(message),
            _ => Self::Api {
                status: 500,
                message: format!("operation failed with code {}: {}", code, message),
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GenAiError::Unauthorized(_) => ErrorKind::Unauthorized,
            GenAiError::NotFound(_) => ErrorKind::NotFound,
            GenAiError::RateLimited(_) => ErrorKind::RateLimited,
            GenAiError::Network(e) if e.status().map(|s| s.as_u16()) == Some(401) => {
                ErrorKind::Unauthorized
            }
            _ => ErrorKind::Unknown,
        }
    }

    /// The selected access key was rejected or no longer resolves.
    pub fn is_credential_failure(&self) -> bool {
        matches!(self.kind(), ErrorKind::Unauthorized | ErrorKind::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_structured_not_found() {
        let body = r#"{"error": {"code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND"}}"#;
        let err = GenAiError::from_response(404, body);
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.is_credential_failure());
        assert_eq!(err.to_string(), "Not found: Requested entity was not found.");
    }

    #[test]
    fn test_classifies_by_rpc_status_when_http_code_is_generic() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid", "status": "PERMISSION_DENIED"}}"#;
        assert_eq!(GenAiError::from_response(400, body).kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn test_classifies_rate_limit_and_unknown() {
        assert_eq!(GenAiError::from_response(429, "slow down").kind(), ErrorKind::RateLimited);

        let err = GenAiError::from_response(500, "");
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert!(!err.is_credential_failure());
        assert_eq!(err.to_string(), "Service returned 500: HTTP 500");
    }

    #[test]
    fn test_rpc_codes() {
        assert_eq!(GenAiError::from_rpc_code(5, "gone").kind(), ErrorKind::NotFound);
        assert_eq!(GenAiError::from_rpc_code(16, "bad key").kind(), ErrorKind::Unauthorized);
        assert_eq!(GenAiError::from_rpc_code(8, "quota").kind(), ErrorKind::RateLimited);
        assert_eq!(GenAiError::from_rpc_code(13, "internal").kind(), ErrorKind::Unknown);
    }
}
