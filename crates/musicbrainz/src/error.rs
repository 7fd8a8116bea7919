use thiserror::Error;

/// Errors that can occur when looking up release metadata.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The request could not be sent or the response body could not be read.
    #[error("Metadata request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("Metadata provider returned status {status} for {url}")]
    Status { status: u16, url: String },
}

/// Result type for lookup operations.
pub type Result<T> = std::result::Result<T, LookupError>;
