//! Error types for the edge core.
//!
//! URI expansion itself cannot fail; these cover event decoding and
//! configuration.

/// Core error type.
#[derive(Debug, thiserror::Error)]
pub enum EdgeError {
    /// Unknown deployment stage name.
    #[error("invalid deployment stage: {0} (expected development or production)")]
    InvalidDeploymentStage(String),

    /// A viewer-request event could not be decoded.
    #[error("invalid viewer-request event: {0}")]
    InvalidEvent(#[source] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience result type for edge operations.
pub type EdgeResult<T> = Result<T, EdgeError>;
