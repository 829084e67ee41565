//! Scripted in-process implementations for tests.
//!
//! Responses are queued per operation and consumed in order. When a queue
//! runs dry the mock falls back to a deterministic success, except for
//! structured output which has no sensible default.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::client::GenerativeClient;
use crate::credentials::KeySelector;
use crate::error::{GenAiError, GenAiResult};
use crate::types::{
    ImageRequest, InlineData, OperationHandle, OperationStatus, StructuredRequest, VideoRequest,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
pub struct MockGenerativeClient {
    structured: Mutex<VecDeque<GenAiResult<serde_json::Value>>>,
    images: Mutex<VecDeque<GenAiResult<InlineData>>>,
    image_delays: Mutex<VecDeque<Duration>>,
    starts: Mutex<VecDeque<GenAiResult<OperationHandle>>>,
    polls: Mutex<VecDeque<GenAiResult<OperationStatus>>>,
    fetches: Mutex<VecDeque<GenAiResult<Vec<u8>>>>,

    structured_requests: Mutex<Vec<StructuredRequest>>,
    image_requests: Mutex<Vec<ImageRequest>>,
    video_requests: Mutex<Vec<VideoRequest>>,
    image_calls: AtomicUsize,
    poll_calls: AtomicUsize,
}

impl MockGenerativeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_structured(&self, result: GenAiResult<serde_json::Value>) {
        lock(&self.structured).push_back(result);
    }

    pub fn push_image(&self, result: GenAiResult<InlineData>) {
        lock(&self.images).push_back(result);
    }

    /// Delay the next image call before it answers.
    pub fn push_image_delay(&self, delay: Duration) {
        lock(&self.image_delays).push_back(delay);
    }

    pub fn push_start_video(&self, result: GenAiResult<OperationHandle>) {
        lock(&self.starts).push_back(result);
    }

    pub fn push_poll(&self, result: GenAiResult<OperationStatus>) {
        lock(&self.polls).push_back(result);
    }

    /// Queue `count` polls that report the operation as still running.
    pub fn push_running_polls(&self, count: usize) {
        let mut polls = lock(&self.polls);
        for _ in 0..count {
            polls.push_back(Ok(OperationStatus::Running));
        }
    }

    pub fn push_fetch(&self, result: GenAiResult<Vec<u8>>) {
        lock(&self.fetches).push_back(result);
    }

    pub fn structured_requests(&self) -> Vec<StructuredRequest> {
        lock(&self.structured_requests).clone()
    }

    pub fn image_requests(&self) -> Vec<ImageRequest> {
        lock(&self.image_requests).clone()
    }

    pub fn video_requests(&self) -> Vec<VideoRequest> {
        lock(&self.video_requests).clone()
    }

    pub fn poll_count(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerativeClient for MockGenerativeClient {
    async fn generate_structured(&self, request: StructuredRequest) -> GenAiResult<serde_json::Value> {
        lock(&self.structured_requests).push(request);
        lock(&self.structured)
            .pop_front()
            .unwrap_or_else(|| Err(GenAiError::empty_result("no scripted structured response")))
    }

    async fn generate_image(&self, request: ImageRequest) -> GenAiResult<InlineData> {
        let n = self.image_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.image_requests).push(request);

        let delay = lock(&self.image_delays).pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        lock(&self.images).pop_front().unwrap_or_else(|| {
            Ok(InlineData::new(
                "image/png",
                format!("image-{}", n).into_bytes(),
            ))
        })
    }

    async fn start_video(&self, request: VideoRequest) -> GenAiResult<OperationHandle> {
        let n = {
            let mut requests = lock(&self.video_requests);
            requests.push(request);
            requests.len()
        };
        lock(&self.starts)
            .pop_front()
            .unwrap_or_else(|| Ok(OperationHandle(format!("operations/mock-{}", n))))
    }

    async fn poll_video(&self, handle: &OperationHandle) -> GenAiResult<OperationStatus> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.polls).pop_front().unwrap_or_else(|| {
            Ok(OperationStatus::Completed {
                video_uri: format!("https://media.invalid/{}.mp4", handle),
            })
        })
    }

    async fn fetch_media(&self, _uri: &str) -> GenAiResult<Vec<u8>> {
        lock(&self.fetches)
            .pop_front()
            .unwrap_or_else(|| Ok(b"mock-video".to_vec()))
    }
}

/// Key selector with a fixed key and a counter of selection requests.
pub struct StaticKeySelector {
    key: Mutex<Option<String>>,
    /// Key installed by the next `open_select_key` call
    replacement: Mutex<Option<String>>,
    open_calls: AtomicUsize,
}

impl StaticKeySelector {
    pub fn with_key(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            key: Mutex::new(Some(key.clone())),
            replacement: Mutex::new(Some(key)),
            open_calls: AtomicUsize::new(0),
        }
    }

    /// No key selected; opening selection installs `"selected-key"`.
    pub fn without_key() -> Self {
        Self {
            key: Mutex::new(None),
            replacement: Mutex::new(Some("selected-key".to_string())),
            open_calls: AtomicUsize::new(0),
        }
    }

    /// No key selected, and the host never supplies one.
    pub fn never_selected() -> Self {
        Self {
            key: Mutex::new(None),
            replacement: Mutex::new(None),
            open_calls: AtomicUsize::new(0),
        }
    }

    pub fn open_calls(&self) -> usize {
        self.open_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeySelector for StaticKeySelector {
    async fn has_selected_key(&self) -> bool {
        lock(&self.key).is_some()
    }

    async fn current_key(&self) -> Option<String> {
        lock(&self.key).clone()
    }

    async fn open_select_key(&self) -> GenAiResult<()> {
        self.open_calls.fetch_add(1, Ordering::SeqCst);
        let replacement = lock(&self.replacement).clone();
        *lock(&self.key) = replacement;
        Ok(())
    }
}
