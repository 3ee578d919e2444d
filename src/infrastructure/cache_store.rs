use crate::config::{CounterMode, FAILED_COUNTER, PROCESSED_COUNTER};
use crate::domain::ports::{StorageServiceRef, TransactionStore};
use crate::domain::stats::StoreStats;
use crate::domain::transaction::TransactionStatus;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

/// Cache-backed transaction store.
///
/// Every value is written with the same TTL. Storage failures are logged here and
/// reclassified into `WriteFailed` / `ReadFailed` / `DeleteFailed` so callers never
/// see backend-specific errors. Clones share the underlying storage service.
#[derive(Clone)]
pub struct CacheStore {
    storage: StorageServiceRef,
    ttl: Duration,
    counter_mode: CounterMode,
}

impl CacheStore {
    pub fn new(storage: StorageServiceRef, ttl: Duration, counter_mode: CounterMode) -> Self {
        Self {
            storage,
            ttl,
            counter_mode,
        }
    }

    async fn read_counter(&self, key: &str) -> u64 {
        match self.storage.counter(key).await {
            Ok(Some(value)) => u64::try_from(value).unwrap_or(0),
            Ok(None) => 0,
            Err(e) => {
                warn!(counter = key, error = %e, "Failed to read counter, reporting zero");
                0
            }
        }
    }
}

#[async_trait]
impl TransactionStore for CacheStore {
    async fn save(&self, key: &str, value: &str) -> Result<()> {
        self.storage.set(key, value, self.ttl).await.map_err(|e| {
            warn!(key, error = %e, "Failed to save data to storage");
            PipelineError::WriteFailed(e.to_string())
        })
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.storage.get(key).await.map_err(|e| {
            warn!(key, error = %e, "Failed to get data from storage");
            PipelineError::ReadFailed(e.to_string())
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.storage.delete(key).await.map_err(|e| {
            warn!(key, error = %e, "Failed to delete data from storage");
            PipelineError::DeleteFailed(e.to_string())
        })
    }

    async fn stats(&self) -> StoreStats {
        let saved = match self.storage.key_count().await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "Failed to count keys, reporting zero");
                0
            }
        };

        StoreStats {
            saved,
            processed: self.read_counter(PROCESSED_COUNTER).await,
            failed: self.read_counter(FAILED_COUNTER).await,
        }
    }

    async fn record_outcome(&self, status: TransactionStatus) -> Result<()> {
        if self.counter_mode == CounterMode::External {
            return Ok(());
        }

        let key = match status {
            TransactionStatus::Processed => PROCESSED_COUNTER,
            TransactionStatus::Failed => FAILED_COUNTER,
            TransactionStatus::Pending => return Ok(()),
        };
        self.storage.incr(key).await.map(|_| ()).map_err(|e| {
            warn!(counter = key, error = %e, "Failed to increment counter");
            PipelineError::WriteFailed(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::StorageService;
    use crate::infrastructure::in_memory::InMemoryStorage;
    use std::sync::Arc;

    /// Storage service whose every call fails.
    struct BrokenStorage;

    #[async_trait]
    impl StorageService for BrokenStorage {
        async fn set(&self, _: &str, _: &str, _: Duration) -> Result<()> {
            Err(PipelineError::InternalError("connection refused".into()))
        }
        async fn get(&self, _: &str) -> Result<Option<String>> {
            Err(PipelineError::InternalError("connection refused".into()))
        }
        async fn delete(&self, _: &str) -> Result<()> {
            Err(PipelineError::InternalError("connection refused".into()))
        }
        async fn key_count(&self) -> Result<u64> {
            Err(PipelineError::InternalError("connection refused".into()))
        }
        async fn incr(&self, _: &str) -> Result<i64> {
            Err(PipelineError::InternalError("connection refused".into()))
        }
        async fn counter(&self, _: &str) -> Result<Option<i64>> {
            Err(PipelineError::InternalError("connection refused".into()))
        }
    }

    fn store(mode: CounterMode) -> (InMemoryStorage, CacheStore) {
        let storage = InMemoryStorage::new();
        let store = CacheStore::new(Arc::new(storage.clone()), Duration::from_secs(120), mode);
        (storage, store)
    }

    #[tokio::test]
    async fn test_save_get_delete() {
        let (_, store) = store(CounterMode::External);
        store.save("T00001", "payload").await.unwrap();

        assert_eq!(
            store.get("T00001").await.unwrap(),
            Some("payload".to_string())
        );
        store.delete("T00001").await.unwrap();
        assert_eq!(store.get("T00001").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_stats_default_to_zero_without_counters() {
        let (_, store) = store(CounterMode::External);
        store.save("T00001", "a").await.unwrap();
        store.save("T00002", "b").await.unwrap();

        let stats = store.stats().await;
        assert_eq!(
            stats,
            StoreStats {
                saved: 2,
                processed: 0,
                failed: 0
            }
        );
    }

    #[tokio::test]
    async fn test_stats_read_external_counters() {
        let (storage, store) = store(CounterMode::External);
        storage.incr(PROCESSED_COUNTER).await.unwrap();
        storage.incr(PROCESSED_COUNTER).await.unwrap();
        storage.incr(FAILED_COUNTER).await.unwrap();

        let stats = store.stats().await;
        assert_eq!(stats.processed, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.saved, 2);
    }

    #[tokio::test]
    async fn test_stats_ignore_malformed_and_negative_counters() {
        let (storage, store) = store(CounterMode::External);
        storage
            .set(PROCESSED_COUNTER, "many", Duration::from_secs(60))
            .await
            .unwrap();
        storage
            .set(FAILED_COUNTER, "-4", Duration::from_secs(60))
            .await
            .unwrap();

        let stats = store.stats().await;
        assert_eq!(stats.processed, 0);
        assert_eq!(stats.failed, 0);
    }

    #[tokio::test]
    async fn test_external_mode_never_writes_counters() {
        let (storage, store) = store(CounterMode::External);
        store
            .record_outcome(TransactionStatus::Processed)
            .await
            .unwrap();

        assert_eq!(storage.key_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_increment_mode_counts_terminal_statuses() {
        let (_, store) = store(CounterMode::Increment);
        store
            .record_outcome(TransactionStatus::Processed)
            .await
            .unwrap();
        store
            .record_outcome(TransactionStatus::Processed)
            .await
            .unwrap();
        store.record_outcome(TransactionStatus::Failed).await.unwrap();
        store.record_outcome(TransactionStatus::Pending).await.unwrap();

        let stats = store.stats().await;
        assert_eq!(stats.processed, 2);
        assert_eq!(stats.failed, 1);
    }

    #[tokio::test]
    async fn test_errors_are_classified() {
        let store = CacheStore::new(
            Arc::new(BrokenStorage),
            Duration::from_secs(120),
            CounterMode::Increment,
        );

        assert!(matches!(
            store.save("k", "v").await,
            Err(PipelineError::WriteFailed(_))
        ));
        assert!(matches!(
            store.get("k").await,
            Err(PipelineError::ReadFailed(_))
        ));
        assert!(matches!(
            store.delete("k").await,
            Err(PipelineError::DeleteFailed(_))
        ));
        assert!(matches!(
            store.record_outcome(TransactionStatus::Failed).await,
            Err(PipelineError::WriteFailed(_))
        ));
        assert_eq!(store.stats().await, StoreStats::default());
    }
}
