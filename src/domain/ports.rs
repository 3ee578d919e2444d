use super::stats::StoreStats;
use super::transaction::TransactionStatus;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Key-value storage service consumed by the cache adapter.
///
/// Absent keys are reported as `Ok(None)`; `Err` always means the call itself failed.
#[async_trait]
pub trait StorageService: Send + Sync {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn delete(&self, key: &str) -> Result<()>;
    /// Number of keys currently held.
    async fn key_count(&self) -> Result<u64>;
    /// Atomically increments an integer counter, creating it at zero.
    async fn incr(&self, key: &str) -> Result<i64>;
    async fn counter(&self, key: &str) -> Result<Option<i64>>;
}

/// Entity-level store used by the workers.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn save(&self, key: &str, value: &str) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn delete(&self, key: &str) -> Result<()>;
    /// Best-effort: every field that cannot be read is reported as zero.
    async fn stats(&self) -> StoreStats;
    /// Accounts for a terminal status in the aggregate counters, if enabled.
    async fn record_outcome(&self, status: TransactionStatus) -> Result<()>;
}

pub type StorageServiceRef = Arc<dyn StorageService>;
pub type TransactionStoreRef = Arc<dyn TransactionStore>;
