use crate::domain::ports::StorageService;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use rocksdb::{DB, IteratorMode, Options};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Longest TTL RocksDB can hold; it stores the value as an `i32` number of seconds.
pub const MAX_TTL: Duration = Duration::from_secs(i32::MAX as u64);

/// A persistent storage service backed by RocksDB's TTL mode.
///
/// RocksDB applies one TTL to the whole database, fixed when it is opened, so the
/// per-call `ttl` passed to [`StorageService::set`] is ignored. Expired entries are
/// dropped during compaction; until then they remain readable and are included in
/// [`StorageService::key_count`].
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStorage {
    db: Arc<DB>,
    /// Serializes read-modify-write counter updates.
    counter_lock: Arc<Mutex<()>>,
}

impl RocksDBStorage {
    /// Opens or creates a TTL-enabled RocksDB instance at the specified path.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    /// * `ttl` - Time after which entries become eligible for removal. Must be at
    ///   least one second and at most [`MAX_TTL`]; RocksDB truncates it to whole
    ///   seconds and treats zero as "never expire".
    pub fn open<P: AsRef<Path>>(path: P, ttl: Duration) -> Result<Self> {
        if ttl.as_secs() == 0 || ttl > MAX_TTL {
            return Err(PipelineError::ConfigError(format!(
                "RocksDB TTL must be between 1s and {}s, got {:?}",
                MAX_TTL.as_secs(),
                ttl
            )));
        }

        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DB::open_with_ttl(&opts, path, ttl)?;

        Ok(Self {
            db: Arc::new(db),
            counter_lock: Arc::new(Mutex::new(())),
        })
    }

    fn read_string(&self, key: &str) -> Result<Option<String>> {
        match self.db.get(key.as_bytes())? {
            Some(bytes) => String::from_utf8(bytes).map(Some).map_err(|e| {
                PipelineError::InternalError(Box::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("Non UTF-8 value: {}", e),
                )))
            }),
            None => Ok(None),
        }
    }
}

fn parse_counter(key: &str, value: &str) -> Result<i64> {
    value
        .parse()
        .map_err(|_| PipelineError::ReadFailed(format!("value at {key} is not an integer")))
}

#[async_trait]
impl StorageService for RocksDBStorage {
    async fn set(&self, key: &str, value: &str, _ttl: Duration) -> Result<()> {
        self.db.put(key.as_bytes(), value.as_bytes())?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.read_string(key)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.db.delete(key.as_bytes())?;
        Ok(())
    }

    async fn key_count(&self) -> Result<u64> {
        let mut count = 0;
        for item in self.db.iterator(IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let _guard = self.counter_lock.lock().await;
        let current = match self.read_string(key)? {
            Some(value) => parse_counter(key, &value)?,
            None => 0,
        };
        let next = current + 1;
        self.db.put(key.as_bytes(), next.to_string().as_bytes())?;
        Ok(next)
    }

    async fn counter(&self, key: &str) -> Result<Option<i64>> {
        match self.read_string(key)? {
            Some(value) => parse_counter(key, &value).map(Some),
            None => Ok(None),
        }
    }
}
