use thiserror::Error;

/// Postgres SQLSTATE for a unique constraint hit.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Entry {entry_id} is not an active qualifier of '{league_key}'")]
    NotActiveQualifier { league_key: String, entry_id: i64 },
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    /// Another writer already stored a row with the same natural key.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            StorageError::Database(sqlx::Error::Database(e)) => {
                e.code().as_deref() == Some(UNIQUE_VIOLATION)
            }
            _ => false,
        }
    }
}
