//! Error types for the credential store boundary

use thiserror::Error;

/// Errors surfaced by a [`PrincipalStore`](super::PrincipalStore).
///
/// The auth core only distinguishes a uniqueness violation from everything
/// else; any other failure is treated as a generic server fault.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Insert rejected by the identity key uniqueness constraint
    #[error("identity key already exists")]
    Duplicate,

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
