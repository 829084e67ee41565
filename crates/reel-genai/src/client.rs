//! The generative collaborator seam.

use async_trait::async_trait;

use crate::error::GenAiResult;
use crate::types::{
    ImageRequest, InlineData, OperationHandle, OperationStatus, StructuredRequest, VideoRequest,
};

/// External generative service. Treated as a black box: no retries or
/// backoff happen behind this trait.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// Generate structured JSON matching `request.schema`.
    async fn generate_structured(&self, request: StructuredRequest) -> GenAiResult<serde_json::Value>;

    /// Generate one image.
    async fn generate_image(&self, request: ImageRequest) -> GenAiResult<InlineData>;

    /// Start a video generation and return its operation handle.
    async fn start_video(&self, request: VideoRequest) -> GenAiResult<OperationHandle>;

    /// Query an operation once.
    async fn poll_video(&self, handle: &OperationHandle) -> GenAiResult<OperationStatus>;

    /// Download generated media from the location reported by an operation.
    async fn fetch_media(&self, uri: &str) -> GenAiResult<Vec<u8>>;
}
