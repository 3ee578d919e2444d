use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to write data to storage: {0}")]
    WriteFailed(String),
    #[error("Failed to read data from storage: {0}")]
    ReadFailed(String),
    #[error("Failed to delete data from storage: {0}")]
    DeleteFailed(String),
    #[error("Malformed transaction record: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for PipelineError {
    fn from(e: rocksdb::Error) -> Self {
        PipelineError::InternalError(Box::new(e))
    }
}
