//! In-memory per-sender mode store with inactivity eviction.

use super::mode::ConversationMode;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy)]
struct Entry {
    mode: ConversationMode,
    last_seen: Instant,
}

/// Sender id -> current mode. Entries appear on first write and are dropped once idle too long.
pub struct ModeStore {
    inner: Arc<RwLock<HashMap<String, Entry>>>,
    idle_timeout: Duration,
}

impl ModeStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Current mode for a sender; unknown or expired senders are `Idle`.
    pub async fn get(&self, sender_id: &str) -> ConversationMode {
        self.get_at(sender_id, Instant::now()).await
    }

    async fn get_at(&self, sender_id: &str, now: Instant) -> ConversationMode {
        let g = self.inner.read().await;
        match g.get(sender_id) {
            Some(e) if now.saturating_duration_since(e.last_seen) < self.idle_timeout => e.mode,
            _ => ConversationMode::Idle,
        }
    }

    /// Record the sender's mode and refresh its activity time.
    pub async fn set(&self, sender_id: &str, mode: ConversationMode) {
        let entry = Entry {
            mode,
            last_seen: Instant::now(),
        };
        self.inner
            .write()
            .await
            .insert(sender_id.to_string(), entry);
    }

    /// Drop entries idle for at least the timeout; returns how many were removed.
    pub async fn evict_idle(&self) -> usize {
        self.evict_idle_at(Instant::now()).await
    }

    async fn evict_idle_at(&self, now: Instant) -> usize {
        let mut g = self.inner.write().await;
        let before = g.len();
        g.retain(|_, e| now.saturating_duration_since(e.last_seen) < self.idle_timeout);
        before - g.len()
    }

    /// Number of tracked senders.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
