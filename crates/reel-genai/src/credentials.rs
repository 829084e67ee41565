//! Access-key selection boundary.
//!
//! The host environment owns key selection. This crate can only ask whether
//! a key is selected and request that the selection flow be opened again.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::GenAiResult;

#[async_trait]
pub trait KeySelector: Send + Sync {
    /// Whether a key is currently selected.
    async fn has_selected_key(&self) -> bool;

    /// The currently selected key, if any.
    async fn current_key(&self) -> Option<String>;

    /// Open the key-selection flow. Returns once the host has responded.
    async fn open_select_key(&self) -> GenAiResult<()>;
}

/// Key selection backed by an environment variable.
///
/// Re-selection re-reads the variable so the operator can rotate the key
/// without restarting the process.
pub struct EnvKeySelector {
    var: String,
    key: RwLock<Option<String>>,
}

impl EnvKeySelector {
    pub fn new(var: impl Into<String>) -> Self {
        let var = var.into();
        let key = read_key(&var);
        Self {
            var,
            key: RwLock::new(key),
        }
    }

    pub fn from_env() -> Self {
        Self::new("GEMINI_API_KEY")
    }
}

fn read_key(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}

#[async_trait]
impl KeySelector for EnvKeySelector {
    async fn has_selected_key(&self) -> bool {
        self.key.read().await.is_some()
    }

    async fn current_key(&self) -> Option<String> {
        self.key.read().await.clone()
    }

    async fn open_select_key(&self) -> GenAiResult<()> {
        let fresh = read_key(&self.var);
        let mut key = self.key.write().await;
        match (&fresh, key.as_ref()) {
            (None, _) => warn!("Key selection requested but {} is not set", self.var),
            (Some(new), Some(old)) if new == old => {
                warn!("Key selection requested; {} still holds the same key", self.var)
            }
            (Some(_), _) => info!("Selected a new key from {}", self.var),
        }
        *key = fresh;
        Ok(())
    }
}
