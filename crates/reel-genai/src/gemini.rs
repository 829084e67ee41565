//! Gemini / Veo HTTP client.
//!
//! Structured output and images go through `generateContent`; video uses
//! `predictLongRunning` plus operation polling.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::client::GenerativeClient;
use crate::config::GenAiConfig;
use crate::credentials::KeySelector;
use crate::error::{GenAiError, GenAiResult};
use crate::types::{
    ImageRequest, InlineData, OperationHandle, OperationStatus, StructuredRequest, VideoRequest,
};

/// Gemini API client.
pub struct GeminiClient {
    http: Client,
    config: GenAiConfig,
    keys: Arc<dyn KeySelector>,
}

/// Gemini `generateContent` request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<Blob>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn inline(data: &InlineData) -> Self {
        Self {
            text: None,
            inline_data: Some(Blob {
                mime_type: data.mime_type.clone(),
                data: data.to_base64(),
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: String,
}

/// Gemini `generateContent` response.
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<Blob>,
}

/// Veo `predictLongRunning` request.
#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<VideoInstance>,
    parameters: VideoParameters,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoInstance {
    prompt: String,
    image: VeoImage,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_frame: Option<VeoImage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VeoImage {
    bytes_base64_encoded: String,
    mime_type: String,
}

impl From<&InlineData> for VeoImage {
    fn from(data: &InlineData) -> Self {
        Self {
            bytes_base64_encoded: data.to_base64(),
            mime_type: data.mime_type.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoParameters {
    aspect_ratio: String,
    resolution: String,
}

/// Long-running operation resource.
#[derive(Debug, Deserialize)]
struct Operation {
    name: String,
    #[serde(default)]
    done: bool,
    error: Option<OperationError>,
    response: Option<OperationResult>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResult {
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    #[serde(default)]
    generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Deserialize)]
struct GeneratedSample {
    video: Option<VideoRef>,
}

#[derive(Debug, Deserialize)]
struct VideoRef {
    uri: Option<String>,
}

impl GeminiClient {
    /// Create a new Gemini client.
    pub fn new(config: GenAiConfig, keys: Arc<dyn KeySelector>) -> GenAiResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(GenAiError::Network)?;

        Ok(Self { http, config, keys })
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.config.api_base, model, method)
    }

    async fn api_key(&self) -> GenAiResult<String> {
        self.keys
            .current_key()
            .await
            .ok_or_else(|| GenAiError::Unauthorized("no API key selected".to_string()))
    }

    async fn post_json<B, R>(&self, url: &str, body: &B) -> GenAiResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let key = self.api_key().await?;
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", key)
            .json(body)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn get_json<R: DeserializeOwned>(&self, url: &str) -> GenAiResult<R> {
        let key = self.api_key().await?;
        let response = self
            .http
            .get(url)
            .header("x-goog-api-key", key)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn read_json<R: DeserializeOwned>(response: reqwest::Response) -> GenAiResult<R> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GenAiError::from_response(status.as_u16(), &body));
        }
        serde_json::from_str(&body)
            .map_err(|e| GenAiError::invalid_response(format!("failed to parse response: {}", e)))
    }

    async fn generate_content(
        &self,
        model: &str,
        parts: Vec<Part>,
        generation_config: GenerationConfig,
    ) -> GenAiResult<Vec<ResponsePart>> {
        let request = GenerateContentRequest {
            contents: vec![Content { parts }],
            generation_config,
        };
        let response: GenerateContentResponse = self
            .post_json(&self.model_url(model, "generateContent"), &request)
            .await?;

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| GenAiError::empty_result("response had no candidates"))?;

        match candidate.content {
            Some(content) if !content.parts.is_empty() => Ok(content.parts),
            _ => Err(GenAiError::empty_result(format!(
                "candidate had no content (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ))),
        }
    }
}

/// Strip a Markdown code fence around a JSON payload.
fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    async fn generate_structured(&self, request: StructuredRequest) -> GenAiResult<serde_json::Value> {
        debug!(
            model = %self.config.text_model,
            attachments = request.attachments.len(),
            "Requesting structured content"
        );

        let mut parts: Vec<Part> = request.attachments.iter().map(Part::inline).collect();
        parts.push(Part::text(request.prompt));

        let config = GenerationConfig {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(request.schema),
            ..Default::default()
        };

        let response_parts = self
            .generate_content(&self.config.text_model, parts, config)
            .await?;

        let text: String = response_parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            return Err(GenAiError::empty_result("no text in structured response"));
        }

        serde_json::from_str(strip_code_fence(&text))
            .map_err(|e| GenAiError::invalid_response(format!("structured output is not JSON: {}", e)))
    }

    async fn generate_image(&self, request: ImageRequest) -> GenAiResult<InlineData> {
        debug!(
            model = %self.config.image_model,
            references = request.references.len(),
            "Requesting image"
        );

        let mut parts: Vec<Part> = request.references.iter().map(Part::inline).collect();
        parts.push(Part::text(request.prompt));

        let config = GenerationConfig {
            response_modalities: Some(vec!["IMAGE".to_string()]),
            image_config: Some(ImageConfig {
                aspect_ratio: request.aspect_ratio,
            }),
            ..Default::default()
        };

        let response_parts = self
            .generate_content(&self.config.image_model, parts, config)
            .await?;

        let blob = response_parts
            .into_iter()
            .find_map(|p| p.inline_data)
            .ok_or_else(|| GenAiError::empty_result("response contained no image"))?;

        InlineData::from_base64(blob.mime_type, &blob.data)
    }

    async fn start_video(&self, request: VideoRequest) -> GenAiResult<OperationHandle> {
        let body = PredictRequest {
            instances: vec![VideoInstance {
                prompt: request.prompt,
                image: VeoImage::from(&request.start_frame),
                last_frame: request.end_frame.as_ref().map(VeoImage::from),
            }],
            parameters: VideoParameters {
                aspect_ratio: request.aspect_ratio,
                resolution: request.resolution,
            },
        };

        let operation: Operation = self
            .post_json(
                &self.model_url(&self.config.video_model, "predictLongRunning"),
                &body,
            )
            .await?;

        info!(
            operation = %operation.name,
            end_frame = body.instances[0].last_frame.is_some(),
            "Started video operation"
        );
        Ok(OperationHandle(operation.name))
    }

    async fn poll_video(&self, handle: &OperationHandle) -> GenAiResult<OperationStatus> {
        let url = format!("{}/v1beta/{}", self.config.api_base, handle.as_str());
        let operation: Operation = self.get_json(&url).await?;

        if !operation.done {
            return Ok(OperationStatus::Running);
        }
        if let Some(error) = operation.error {
            return Err(GenAiError::from_rpc_code(error.code, error.message));
        }

        operation
            .response
            .and_then(|r| r.generate_video_response)
            .and_then(|r| r.generated_samples.into_iter().next())
            .and_then(|s| s.video)
            .and_then(|v| v.uri)
            .map(|video_uri| OperationStatus::Completed { video_uri })
            .ok_or_else(|| GenAiError::empty_result("operation finished without a video"))
    }

    async fn fetch_media(&self, uri: &str) -> GenAiResult<Vec<u8>> {
        let base = Url::parse(&self.config.api_base)
            .map_err(|e| GenAiError::config(format!("invalid API base URL: {}", e)))?;
        let url = base
            .join(uri)
            .map_err(|e| GenAiError::invalid_response(format!("invalid media URI {}: {}", uri, e)))?;
        // The API key is only ever sent to the configured service host
        if url.origin() != base.origin() {
            return Err(GenAiError::invalid_response(format!(
                "media URI {} is not served by {}",
                uri, self.config.api_base
            )));
        }

        let key = self.api_key().await?;
        let response = self
            .http
            .get(url)
            .header("x-goog-api-key", key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenAiError::from_response(status.as_u16(), &body));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(GenAiError::empty_result("downloaded media is empty"));
        }
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("  {\"b\":2} "), "{\"b\":2}");
    }

    #[test]
    fn test_inline_part_serialization() {
        let part = Part::inline(&InlineData::new("audio/mpeg", vec![1, 2, 3]));
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["inlineData"]["mimeType"], "audio/mpeg");
        assert_eq!(json["inlineData"]["data"], "AQID");
        assert!(json.get("text").is_none());
    }
}
