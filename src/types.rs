//! Shared error and result types
//!
//! Every fallible operation in the crate returns [`TurnstileError`] through
//! the crate-wide [`Result`] alias.

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, TurnstileError>;

/// Errors surfaced by clients, collections and the connection engine
#[derive(Debug, Error)]
pub enum TurnstileError {
    /// Caller violated the pagination or query contract
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Cursor token failed to decode
    #[error("Invalid cursor token: {0}")]
    InvalidCursor(String),

    /// Search cursor was issued for a different query string
    #[error("Stale cursor: issued for query {expected:?}, used with {requested:?}")]
    StaleCursor {
        /// Query string embedded in the cursor
        expected: String,
        /// Query string of the current request
        requested: String,
    },

    /// Raw record did not match the expected document shape
    #[error("Malformed document in collection {collection:?}: {message}")]
    MalformedDocument {
        /// Collection the record came from
        collection: String,
        /// Underlying decode failure
        message: String,
    },

    /// Search hit references a document the store no longer has
    #[error("Document {id:?} missing from collection {collection:?}")]
    MissingDocument {
        /// Collection that was resolved against
        collection: String,
        /// Identifier returned by the search index
        id: String,
    },

    /// Collection name is not present in the registry
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    /// Collection name registered twice
    #[error("Collection {0:?} is already registered")]
    DuplicateCollection(String),

    /// Registered descriptor does not match the requested document type
    #[error("Document type mismatch for collection {0:?}")]
    DocumentType(String),

    /// Update target does not exist
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Search index requested but the client has none configured
    #[error("Search is not configured: {0}")]
    SearchUnavailable(String),

    /// Backing store failure, propagated without retry
    #[error("Store error: {0}")]
    Store(String),

    /// Search engine failure, propagated without retry
    #[error("Search error: {0}")]
    Search(String),
}
