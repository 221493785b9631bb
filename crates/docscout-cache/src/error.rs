use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Results blob error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache lock poisoned")]
    Poisoned,
}
