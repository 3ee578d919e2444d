use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use txflow::application::orchestrator::CycleOrchestrator;
use txflow::application::scheduler::Scheduler;
use txflow::config::{CounterMode, PipelineConfig};
use txflow::domain::ports::StorageServiceRef;
use txflow::infrastructure::cache_store::CacheStore;
use txflow::infrastructure::in_memory::InMemoryStorage;
use txflow::interfaces::csv::report_writer::CycleReportWriter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Transactions generated per cycle
    #[arg(long, default_value_t = 100_000)]
    transactions: usize,

    /// Number of transaction workers
    #[arg(long, default_value_t = 100)]
    pool_size: usize,

    /// Number of status workers
    #[arg(long, default_value_t = 100)]
    status_pool_size: usize,

    /// Probability that a transaction is marked as failed
    #[arg(long, default_value_t = 0.05)]
    failure_rate: f64,

    /// Expiry applied to every stored transaction
    #[arg(long, default_value = "2m")]
    ttl: humantime::Duration,

    /// Delay between scheduled cycles
    #[arg(long, default_value = "5m")]
    interval: humantime::Duration,

    /// Who maintains the processed/failed counters
    #[arg(long, value_enum, default_value_t = CounterMode::External)]
    counter_mode: CounterMode,

    /// Seed for reproducible ids and outcomes
    #[arg(long)]
    seed: Option<u64>,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

impl Cli {
    fn config(&self) -> PipelineConfig {
        PipelineConfig {
            transactions: self.transactions,
            pool_size: self.pool_size,
            status_pool_size: self.status_pool_size,
            failure_rate: self.failure_rate,
            cache_ttl: *self.ttl,
            interval: *self.interval,
            counter_mode: self.counter_mode,
            seed: self.seed,
        }
    }
}

#[cfg(feature = "storage-rocksdb")]
fn open_storage(db_path: Option<PathBuf>, ttl: Duration) -> Result<StorageServiceRef> {
    use txflow::infrastructure::rocksdb::RocksDBStorage;

    if let Some(path) = db_path {
        info!(path = %path.display(), "Using RocksDB storage");
        let storage = RocksDBStorage::open(path, ttl).into_diagnostic()?;
        return Ok(Arc::new(storage));
    }
    Ok(Arc::new(InMemoryStorage::new()))
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_storage(db_path: Option<PathBuf>, _ttl: Duration) -> Result<StorageServiceRef> {
    if db_path.is_some() {
        tracing::warn!(
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(Arc::new(InMemoryStorage::new()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config();
    config.validate().into_diagnostic()?;

    let storage = open_storage(cli.db_path.clone(), config.cache_ttl)?;
    let store = Arc::new(CacheStore::new(
        storage,
        config.cache_ttl,
        config.counter_mode,
    ));
    let interval = config.interval;
    let orchestrator = Arc::new(CycleOrchestrator::new(config, store).into_diagnostic()?);

    let mut writer = CycleReportWriter::new(io::stdout());

    if cli.once {
        let report = orchestrator.run_cycle().await.into_diagnostic()?;
        writer.write_report(&report).into_diagnostic()?;
        return Ok(());
    }

    let token = CancellationToken::new();
    let shutdown = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                shutdown.cancel();
            }
            Err(e) => tracing::warn!(error = %e, "Unable to listen for shutdown signal"),
        }
    });

    let scheduler = Scheduler::new(orchestrator, interval);
    scheduler
        .run(token, |report| writer.write_report(report))
        .await
        .into_diagnostic()?;

    Ok(())
}
