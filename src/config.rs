use crate::error::{PipelineError, Result};
use std::time::Duration;

/// Counter key incremented for transactions that reached `Processed`.
pub const PROCESSED_COUNTER: &str = "processed";
/// Counter key incremented for transactions that reached `Failed`.
pub const FAILED_COUNTER: &str = "failed";

/// Who maintains the `processed` / `failed` counter keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CounterMode {
    /// Counters are owned by something outside the pipeline; workers never write them.
    #[default]
    External,
    /// Transaction workers increment the matching counter after each successful save.
    ///
    /// A record the status worker repairs is counted again under `failed`; the
    /// counter for its earlier outcome is not decremented.
    Increment,
}

/// Settings for one pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Transactions generated per cycle.
    pub transactions: usize,
    pub pool_size: usize,
    pub status_pool_size: usize,
    /// Probability that a transaction worker marks a record as failed.
    pub failure_rate: f64,
    pub cache_ttl: Duration,
    /// Delay between scheduled cycles.
    pub interval: Duration,
    pub counter_mode: CounterMode,
    /// Fixed seed for id, amount and outcome draws. `None` uses entropy.
    pub seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            transactions: 100_000,
            pool_size: 100,
            status_pool_size: 100,
            failure_rate: 0.05,
            cache_ttl: Duration::from_secs(2 * 60),
            interval: Duration::from_secs(5 * 60),
            counter_mode: CounterMode::External,
            seed: None,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.transactions == 0 {
            return Err(PipelineError::ConfigError(
                "transactions must be > 0".to_string(),
            ));
        }
        if self.pool_size == 0 || self.status_pool_size == 0 {
            return Err(PipelineError::ConfigError(
                "pool sizes must be > 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(PipelineError::ConfigError(
                "failure rate must be within [0, 1]".to_string(),
            ));
        }
        if self.cache_ttl.is_zero() {
            return Err(PipelineError::ConfigError(
                "cache TTL must be non-zero".to_string(),
            ));
        }
        if self.interval.is_zero() {
            return Err(PipelineError::ConfigError(
                "interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
