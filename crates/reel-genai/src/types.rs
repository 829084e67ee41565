//! Request/response types exchanged with the generative service.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{GenAiError, GenAiResult};

/// Binary payload tagged with a media type (image, audio).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineData {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl InlineData {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Decode from standard base64.
    pub fn from_base64(mime_type: impl Into<String>, encoded: &str) -> GenAiResult<Self> {
        let data = STANDARD
            .decode(encoded.trim())
            .map_err(|e| GenAiError::invalid_response(format!("invalid base64 payload: {}", e)))?;
        Ok(Self::new(mime_type, data))
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }

    /// Render as a `data:<mime>;base64,<payload>` URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// Parse a base64 data URL.
    pub fn from_data_url(url: &str) -> GenAiResult<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| GenAiError::invalid_response("not a data URL"))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| GenAiError::invalid_response("data URL has no payload"))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| GenAiError::invalid_response("data URL is not base64 encoded"))?;
        Self::from_base64(mime_type, payload)
    }
}

/// Request for a JSON response validated against a schema.
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    pub prompt: String,
    pub attachments: Vec<InlineData>,
    pub schema: serde_json::Value,
}

/// Request for a single generated image.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    /// Reference images, in the order they are attached
    pub references: Vec<InlineData>,
    pub aspect_ratio: String,
}

/// Request for a long-running video generation.
#[derive(Debug, Clone)]
pub struct VideoRequest {
    pub prompt: String,
    pub start_frame: InlineData,
    /// Terminal frame the clip should morph toward
    pub end_frame: Option<InlineData>,
    pub aspect_ratio: String,
    pub resolution: String,
}

/// Handle of a long-running operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationHandle(pub String);

impl OperationHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State of a long-running operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    Running,
    Completed { video_uri: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_round_trip() {
        let image = InlineData::new("image/png", vec![0x89, 0x50, 0x4e, 0x47]);
        let url = image.to_data_url();
        assert_eq!(url, "data:image/png;base64,iVBORw==");
        assert_eq!(InlineData::from_data_url(&url).unwrap(), image);
    }

    #[test]
    fn test_rejects_non_data_urls() {
        assert!(InlineData::from_data_url("https://example.com/a.png").is_err());
        assert!(InlineData::from_data_url("data:image/png,raw").is_err());
    }
}
