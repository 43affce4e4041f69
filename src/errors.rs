use thiserror::Error;

use crate::domain::Month;

/// Error type that captures budgeting, storage, and sync failures.
#[derive(Debug, Error)]
pub enum BudgetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Invalid month `{0}`, expected YYYY-MM")]
    InvalidMonth(String),
    #[error("No data stored for month {0}")]
    NoPreviousData(Month),
    #[error("Remote store error: {0}")]
    Remote(String),
    #[error("Sync unavailable: {0}")]
    SyncUnavailable(String),
}

pub type Result<T> = std::result::Result<T, BudgetError>;
