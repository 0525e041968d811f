//! Shared handle to the device registry
//!
//! Every registry operation runs under one lock so a sweep round's
//! snapshot-and-reset can never interleave with a resolve.

use router_shared::DeviceRegistry;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Cloneable handle to the single device registry
#[derive(Debug, Clone, Default)]
pub struct SharedRegistry {
    inner: Arc<Mutex<DeviceRegistry>>,
}

impl SharedRegistry {
    /// Create a handle to a new, empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a token to its current index, registering it if unseen
    pub async fn resolve(&self, token: &str) -> usize {
        self.inner.lock().await.resolve(token)
    }

    /// Resolve and mark alive in one step (a ping answer)
    pub async fn heartbeat(&self, token: &str) -> usize {
        let mut registry = self.inner.lock().await;
        let index = registry.resolve(token);
        registry.mark_alive(index);
        index
    }

    /// Snapshot devices for ping fan-out and clear liveness flags
    pub async fn begin_sweep_round(&self) -> Vec<(usize, String)> {
        self.inner.lock().await.begin_sweep_round()
    }

    /// Evict silent devices and compact; returns evicted tokens
    pub async fn end_sweep_round(&self) -> Vec<String> {
        self.inner.lock().await.end_sweep_round()
    }

    /// Get registered tokens in index order
    pub async fn tokens(&self) -> Vec<String> {
        self.inner
            .lock()
            .await
            .devices()
            .map(|d| d.token.clone())
            .collect()
    }
}

#[cfg(test)]
impl SharedRegistry {
    /// Current index of a token, without registering it
    pub async fn index_of(&self, token: &str) -> Option<usize> {
        self.inner.lock().await.index_of(token)
    }

    /// Whether a token is registered and alive in the current round
    pub async fn is_alive(&self, token: &str) -> bool {
        let registry = self.inner.lock().await;
        registry
            .index_of(token)
            .is_some_and(|index| registry.is_alive(index))
    }
}
