//! Pipeline error types.

use reel_genai::{ErrorKind, GenAiError};
use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Generation failed: {0}")]
    Generation(#[from] GenAiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Classification of the underlying generative failure, if any.
    pub fn genai_kind(&self) -> Option<ErrorKind> {
        match self {
            PipelineError::Generation(e) => Some(e.kind()),
            _ => None,
        }
    }

    /// The selected access key was rejected or no longer resolves.
    pub fn is_credential_failure(&self) -> bool {
        matches!(self, PipelineError::Generation(e) if e.is_credential_failure())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_failure_passthrough() {
        let err: PipelineError = GenAiError::NotFound("entity".into()).into();
        assert!(err.is_credential_failure());
        assert_eq!(err.genai_kind(), Some(ErrorKind::NotFound));

        let err = PipelineError::Timeout("video".into());
        assert!(!err.is_credential_failure());
        assert_eq!(err.genai_kind(), None);
    }
}
