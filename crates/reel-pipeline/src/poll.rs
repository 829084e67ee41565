//! Bounded, cancellable polling of long-running operations.
//!
//! Polls with exponential backoff up to a ceiling and gives up once the
//! configured wait has elapsed.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};

/// Configuration for polling behavior.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay after the first pending poll.
    pub initial_interval: Duration,
    /// Maximum delay between polls.
    pub max_interval: Duration,
    /// Growth factor applied per attempt.
    pub multiplier: u32,
    /// Total time before the operation is abandoned.
    pub max_wait: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(10),
            max_interval: Duration::from_secs(60),
            multiplier: 2,
            max_wait: Duration::from_secs(15 * 60),
        }
    }
}

impl PollConfig {
    /// Calculate delay for a given attempt number.
    pub fn interval_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt);
        self.initial_interval
            .saturating_mul(factor)
            .min(self.max_interval)
    }
}

/// Result of a single poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState<T> {
    Pending,
    Ready(T),
}

/// Cooperative cancellation token.
///
/// Clones share state; cancelling any clone cancels all of them.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Signal cancellation.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the token is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// Poll `operation` until it reports ready.
///
/// Poll errors propagate immediately; nothing is retried.
pub async fn poll_until_complete<F, Fut, T>(
    config: &PollConfig,
    cancel: &CancelToken,
    operation_name: &str,
    mut operation: F,
) -> PipelineResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PipelineResult<PollState<T>>>,
{
    let deadline = Instant::now() + config.max_wait;
    let mut attempt = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled(operation_name.to_string()));
        }

        let state = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(PipelineError::Cancelled(operation_name.to_string()));
            }
            state = operation() => state?,
        };

        if let PollState::Ready(value) = state {
            debug!("{} completed after {} polls", operation_name, attempt + 1);
            return Ok(value);
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(PipelineError::Timeout(format!(
                "{} did not complete within {:?}",
                operation_name, config.max_wait
            )));
        }

        let delay = config.interval_for_attempt(attempt).min(deadline - now);
        attempt += 1;
        debug!(
            "{} pending after poll {}, next poll in {:?}",
            operation_name, attempt, delay
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(PipelineError::Cancelled(operation_name.to_string()));
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config() -> PollConfig {
        PollConfig {
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(4),
            multiplier: 2,
            max_wait: Duration::from_secs(30),
        }
    }

    #[test]
    fn test_interval_calculation() {
        let config = PollConfig::default();

        assert_eq!(config.interval_for_attempt(0), Duration::from_secs(10));
        assert_eq!(config.interval_for_attempt(1), Duration::from_secs(20));
        assert_eq!(config.interval_for_attempt(2), Duration::from_secs(40));
        assert_eq!(config.interval_for_attempt(3), Duration::from_secs(60));
        assert_eq!(config.interval_for_attempt(40), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_after_pending_polls() {
        let calls = AtomicU32::new(0);
        let result = poll_until_complete(&fast_config(), &CancelToken::new(), "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Ok(PollState::Pending)
                } else {
                    Ok(PollState::Ready(n))
                }
            }
        })
        .await;

        tokio_test::assert_ok!(&result);
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_after_max_wait() {
        let started = Instant::now();
        let result: PipelineResult<()> =
            poll_until_complete(&fast_config(), &CancelToken::new(), "video", || async {
                Ok(PollState::Pending)
            })
            .await;

        assert!(matches!(result, Err(PipelineError::Timeout(_))));
        assert!(started.elapsed() >= Duration::from_secs(30));
        assert!(started.elapsed() < Duration::from_secs(35));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_wait() {
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            trigger.cancel();
        });

        let result: PipelineResult<()> =
            poll_until_complete(&fast_config(), &cancel, "video", || async {
                Ok(PollState::Pending)
            })
            .await;

        assert!(matches!(result, Err(PipelineError::Cancelled(_))));
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_already_cancelled_never_polls() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let calls = AtomicU32::new(0);

        let result: PipelineResult<()> = poll_until_complete(&fast_config(), &cancel, "video", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(PollState::Pending) }
        })
        .await;

        assert!(matches!(result, Err(PipelineError::Cancelled(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_poll_error_propagates() {
        let result: PipelineResult<()> =
            poll_until_complete(&fast_config(), &CancelToken::new(), "video", || async {
                Err(PipelineError::invalid_response("broken"))
            })
            .await;

        assert!(matches!(result, Err(PipelineError::InvalidResponse(_))));
    }
}
