//! Error types for pool operations

/// Errors from pool operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("account not found: {0}")]
    NotFound(String),

    #[error("pool storage error: {0}")]
    Storage(String),

    #[error("accounts file parse error: {0}")]
    Parse(String),

    #[error("pool unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for pool operations.
pub type Result<T> = std::result::Result<T, Error>;
