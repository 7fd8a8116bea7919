use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A concurrent transaction touched a row this transaction depends on.
    /// Retryable: the caller may run the whole transaction again.
    #[error("Transaction conflict: {0}")]
    Conflict(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store could not complete the operation for a non-retryable reason.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// True for transient conflicts that a caller may resolve by retrying
    /// the whole transaction.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
