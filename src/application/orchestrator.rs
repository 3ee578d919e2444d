use super::completion::BatchOutcome;
use super::pool::{DispatchPool, PoolSettings, mix_seed};
use crate::config::PipelineConfig;
use crate::domain::ports::TransactionStoreRef;
use crate::domain::stats::StoreStats;
use crate::domain::transaction::Transaction;
use crate::error::{PipelineError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{Instrument, info, info_span};

/// Result of one processing cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle: u64,
    pub submitted: usize,
    pub outcome: BatchOutcome,
    pub stats: StoreStats,
    pub elapsed: Duration,
}

/// Generates `n` pending transactions with amounts uniform in `[0, 100)`.
pub fn generate_batch<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<Transaction> {
    (0..n)
        .map(|_| {
            let amount = rng.gen_range(0.0..100.0);
            Transaction::new(amount, rng)
        })
        .collect()
}

/// Runs batch cycles against a shared transaction store.
///
/// Each cycle gets a fresh [`DispatchPool`] that is torn down before the cycle returns.
pub struct CycleOrchestrator {
    config: PipelineConfig,
    store: TransactionStoreRef,
    cycles: AtomicU64,
}

impl CycleOrchestrator {
    pub fn new(config: PipelineConfig, store: TransactionStoreRef) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            cycles: AtomicU64::new(0),
        })
    }

    pub fn store(&self) -> &TransactionStoreRef {
        &self.store
    }

    /// Runs one cycle with the configured batch size.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        self.run_batch(self.config.transactions).await
    }

    /// Generates and processes `n` transactions, waits for all of them, then
    /// reads the aggregate stats.
    pub async fn run_batch(&self, n: usize) -> Result<CycleReport> {
        if n == 0 {
            return Err(PipelineError::ConfigError(
                "batch size must be > 0".to_string(),
            ));
        }

        let cycle = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;
        let span = info_span!("cycle", cycle, transactions = n);
        self.execute(cycle, n).instrument(span).await
    }

    async fn execute(&self, cycle: u64, n: usize) -> Result<CycleReport> {
        let started = Instant::now();
        info!("Cycle started");

        let seed = match self.config.seed {
            Some(seed) => mix_seed(seed, cycle),
            None => rand::random(),
        };
        let mut rng = StdRng::seed_from_u64(seed);
        let transactions = generate_batch(n, &mut rng);

        let pool = DispatchPool::spawn(
            PoolSettings {
                pool_size: self.config.pool_size,
                status_pool_size: self.config.status_pool_size,
                failure_rate: self.config.failure_rate,
                seed: rng.r#gen(),
            },
            self.store.clone(),
        )?;
        let outcome = pool.submit_batch(transactions).await;
        let stats = self.store.stats().await;
        pool.shutdown().await;

        info!(
            "Total transactions: {}, Processed: {}, Failed: {}",
            stats.saved, stats.processed, stats.failed
        );
        let elapsed = started.elapsed();
        info!(
            verified = outcome.verified(),
            failed_items = outcome.failed(),
            lost = outcome.lost(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Cycle finished"
        );

        Ok(CycleReport {
            cycle,
            submitted: n,
            outcome,
            stats,
            elapsed,
        })
    }
}
