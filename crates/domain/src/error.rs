use thiserror::Error;

use common::RecordId;
use musicbrainz::LookupError;
use store::StoreError;

/// Errors that can occur when placing an order.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The referenced record does not exist.
    #[error("Record {0} not found")]
    RecordNotFound(RecordId),

    /// The record has less stock than the order asks for.
    #[error("Insufficient stock: {available} available, {requested} requested")]
    InsufficientStock { available: u32, requested: u32 },

    /// The requested quantity is not a positive integer.
    #[error("Order quantity must be at least 1, got {0}")]
    InvalidQuantity(u32),

    /// The transaction could not be committed. The transaction is rolled
    /// back; the caller may retry the whole request.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// A storage error unrelated to transaction contention.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl OrderError {
    /// True for business-rule rejections, as opposed to system faults.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            OrderError::RecordNotFound(_)
                | OrderError::InsufficientStock { .. }
                | OrderError::InvalidQuantity(_)
        )
    }
}

/// Errors that can occur in catalog management.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The record to update does not exist.
    #[error("Record {0} not found")]
    NotFound(RecordId),

    /// The request fails validation.
    #[error("Invalid record: {0}")]
    Invalid(String),

    /// The metadata provider could not resolve the release.
    #[error("Metadata lookup failed: {0}")]
    Metadata(#[from] LookupError),

    /// A storage error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
