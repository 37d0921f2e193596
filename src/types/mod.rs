#![forbid(unsafe_code)]

//! Shared error and result types.

/// Errors surfaced by stores and by the paging layer on top of them.
///
/// The paging core never invents failures of its own: whatever a store
/// returns is handed back to the caller untouched.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Underlying I/O failure.
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    /// Store state contradicts itself.
    #[error("corruption: {0}")]
    Corruption(&'static str),
    /// Caller supplied an argument the store cannot honour.
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
    /// Named table, index or record does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// Token or dataset payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
