use storage::error::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Failure reported by a statistics source after its own retries are exhausted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Upstream unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed upstream data: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Data unavailable for league '{0}'")]
    DataUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown league '{0}'")]
    UnknownLeague(String),
}
