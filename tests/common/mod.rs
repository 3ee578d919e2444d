#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use txflow::application::orchestrator::CycleOrchestrator;
use txflow::config::PipelineConfig;
use txflow::domain::ports::StorageService;
use txflow::error::{PipelineError, Result};
use txflow::infrastructure::cache_store::CacheStore;
use txflow::infrastructure::in_memory::InMemoryStorage;

/// In-memory storage whose writes and reads can be made to fail on demand.
#[derive(Default)]
pub struct FlakyStorage {
    inner: InMemoryStorage,
    /// Number of `set` calls that succeed before every further one fails.
    set_budget: AtomicUsize,
    limit_sets: AtomicBool,
    fail_gets: AtomicBool,
}

impl FlakyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &InMemoryStorage {
        &self.inner
    }

    pub fn fail_sets_after(&self, successes: usize) {
        self.set_budget.store(successes, Ordering::SeqCst);
        self.limit_sets.store(true, Ordering::SeqCst);
    }

    pub fn fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    fn refused() -> PipelineError {
        PipelineError::InternalError("connection refused".into())
    }
}

#[async_trait]
impl StorageService for FlakyStorage {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        if self.limit_sets.load(Ordering::SeqCst) {
            let granted = self
                .set_budget
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok();
            if !granted {
                return Err(Self::refused());
            }
        }
        self.inner.set(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(Self::refused());
        }
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(key).await
    }

    async fn key_count(&self) -> Result<u64> {
        self.inner.key_count().await
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        self.inner.incr(key).await
    }

    async fn counter(&self, key: &str) -> Result<Option<i64>> {
        self.inner.counter(key).await
    }
}

pub fn config(transactions: usize, pool_size: usize, status_pool_size: usize) -> PipelineConfig {
    PipelineConfig {
        transactions,
        pool_size,
        status_pool_size,
        seed: Some(20240501),
        ..Default::default()
    }
}

pub fn orchestrator(
    config: PipelineConfig,
    storage: Arc<dyn StorageService>,
) -> (CycleOrchestrator, Arc<CacheStore>) {
    let store = Arc::new(CacheStore::new(
        storage,
        config.cache_ttl,
        config.counter_mode,
    ));
    let orchestrator = CycleOrchestrator::new(config, store.clone()).expect("valid config");
    (orchestrator, store)
}

pub fn in_memory() -> Arc<dyn StorageService> {
    Arc::new(InMemoryStorage::new())
}
