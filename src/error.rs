//! Unified error type for all store and handler operations.

use thiserror::Error;

/// Things that can go wrong when using the store.
///
/// Payloads are plain strings so the error stays `Clone + PartialEq`, which
/// keeps assertions in tests and handler code simple.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Malformed or incomplete input (missing `item_name`, body not an object).
    #[error("validation error: {0}")]
    Validation(String),
    /// No item carries the given `backendId`.
    #[error("no item with backendId {0:?}")]
    NotFound(String),
    /// Writing the document back to disk failed; persisted state is unchanged.
    #[error("persistence error: {0}")]
    Persistence(String),
    /// The file exists but is not a `{"items": [...]}` document.
    #[error("corrupt store: {0}")]
    CorruptStore(String),
    /// File system problem while reading.
    #[error("i/o error: {0}")]
    Io(String),
    /// Failed to encode the document.
    #[error("serialization error: {0}")]
    Serialize(String),
    /// Bad configuration (empty path and the like).
    #[error("config error: {0}")]
    Config(String),
}

/// Result alias using our [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;
