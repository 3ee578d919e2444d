use crate::domain::ports::StorageService;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    /// `None` for keys that never expire (counters).
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|deadline| now < deadline)
    }
}

/// A thread-safe in-memory key-value service with per-key expiry.
///
/// Uses `Arc<RwLock<HashMap<String, Entry>>>` so clones share the same keyspace.
/// Expired entries are invisible to reads and are purged when the key count is taken.
#[derive(Default, Clone)]
pub struct InMemoryStorage {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl InMemoryStorage {
    /// Creates a new, empty in-memory storage service.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageService for InMemoryStorage {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: Some(Instant::now() + ttl),
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn key_count(&self) -> Result<u64> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.is_live(now));
        Ok(entries.len() as u64)
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(key.to_string())
            .and_modify(|entry| {
                if !entry.is_live(now) {
                    entry.value = "0".to_string();
                    entry.expires_at = None;
                }
            })
            .or_insert_with(|| Entry {
                value: "0".to_string(),
                expires_at: None,
            });

        let current: i64 = entry.value.parse().map_err(|_| {
            PipelineError::WriteFailed(format!("value at {key} is not an integer"))
        })?;
        let next = current + 1;
        entry.value = next.to_string();
        Ok(next)
    }

    async fn counter(&self, key: &str) -> Result<Option<i64>> {
        match self.get(key).await? {
            Some(value) => value.parse().map(Some).map_err(|_| {
                PipelineError::ReadFailed(format!("value at {key} is not an integer"))
            }),
            None => Ok(None),
        }
    }
}
