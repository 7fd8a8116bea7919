use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when publishing an order event.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The channel rejected the event or is unreachable.
    #[error("Publish failed: {0}")]
    Failed(String),

    /// The publish did not complete within the allowed time.
    #[error("Publish timed out after {0:?}")]
    Timeout(Duration),
}

/// Result type for publish operations.
pub type Result<T> = std::result::Result<T, PublishError>;
