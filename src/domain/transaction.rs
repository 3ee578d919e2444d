use crate::error::Result;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Upper bound (exclusive) of the numeric part of generated transaction ids.
const ID_SPACE: u32 = 10_000_000;

/// Processing outcome of a transaction.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
pub enum TransactionStatus {
    #[default]
    Pending,
    Processed,
    Failed,
}

/// Verification flag, set only once a status worker has checked the record.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
pub enum ReadStatus {
    #[default]
    Pending,
    Processed,
}

/// A synthetic transaction flowing through the pipeline.
///
/// The `Default` value is the "zero" record a status worker falls back to when
/// the stored representation cannot be parsed.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct Transaction {
    pub id: String,
    pub amount: f64,
    pub status: TransactionStatus,
    pub read_status: ReadStatus,
    /// Stamped when a transaction worker picks the record up.
    pub created_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Creates a pending transaction with a fresh id drawn from `rng`.
    pub fn new<R: Rng + ?Sized>(amount: f64, rng: &mut R) -> Self {
        Self {
            id: generate_id(rng),
            amount,
            status: TransactionStatus::Pending,
            read_status: ReadStatus::Pending,
            created_at: None,
        }
    }

    pub fn update_status(&mut self, status: TransactionStatus) {
        self.status = status;
    }

    pub fn mark_read(&mut self) {
        self.read_status = ReadStatus::Processed;
    }

    /// Flat string form used as the stored value.
    pub fn stringify(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn parse(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }
}

/// `T` followed by the random number, zero-padded to at least five digits.
/// Ids are not deduplicated; collisions overwrite each other in storage.
pub fn generate_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("T{:05}", rng.gen_range(0..ID_SPACE))
}
