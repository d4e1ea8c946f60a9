//! Errors from the persistence layer (best scores, history, config)

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("history log error: {0}")]
    Csv(#[from] csv::Error),

    #[error("config encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no writable data directory could be determined")]
    NoDataDir,
}
