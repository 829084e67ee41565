//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reel_genai::ErrorKind;
use reel_pipeline::PipelineError;
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "auth_required",
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Conflict(_) => "precondition_failed",
            ApiError::RateLimited => "rate_limited",
            ApiError::Upstream(_) => "upstream_error",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let message = err.to_string();
        match &err {
            PipelineError::Precondition(_) => ApiError::Conflict(message),
            PipelineError::NotFound(_) => ApiError::NotFound(message),
            PipelineError::InvalidInput(_) => ApiError::BadRequest(message),
            PipelineError::InvalidResponse(_) => ApiError::Upstream(message),
            PipelineError::Generation(_) if err.is_credential_failure() => {
                ApiError::Unauthorized(message)
            }
            PipelineError::Generation(_) => match err.genai_kind() {
                Some(ErrorKind::RateLimited) => ApiError::RateLimited,
                _ => ApiError::Upstream(message),
            },
            PipelineError::Timeout(_) | PipelineError::Cancelled(_) | PipelineError::Io(_) => {
                ApiError::Internal(message)
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let detail = match &self {
            ApiError::Internal(_) => {
                if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
                    "An internal error occurred".to_string()
                } else {
                    self.to_string()
                }
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            detail,
            code: self.code(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_genai::GenAiError;

    #[test]
    fn test_pipeline_error_mapping() {
        let err: ApiError = PipelineError::precondition("image first").into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err: ApiError = PipelineError::not_found("shot").into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err: ApiError = PipelineError::invalid_input("duration").into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err: ApiError = PipelineError::invalid_response("plan").into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_generation_error_mapping() {
        let err: ApiError = PipelineError::from(GenAiError::NotFound("entity".into())).into();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.code(), "auth_required");

        let err: ApiError = PipelineError::from(GenAiError::RateLimited("quota".into())).into();
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);

        let err: ApiError = PipelineError::from(GenAiError::EmptyResult("no image".into())).into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }
}
