//! Backing store interface
//!
//! The store is an already-connected collaborator exposing find/sort/limit
//! primitives over raw BSON records. Implementations own their transport,
//! retries and timeouts; errors arrive here as [`TurnstileError::Store`] and
//! propagate unmodified.

pub mod memory;

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::Document as RawDocument;

use crate::types::Result;

pub use memory::MemoryStore;

/// Sorted, filtered access to raw document records.
///
/// `sort` is an order-preserving BSON document of `(field, direction)` pairs
/// where direction is `1` (ascending) or `-1` (descending), mirroring the
/// wire shape of a MongoDB sort specification.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Scan a collection under a filter and sort, up to `limit` records
    async fn scan(
        &self,
        collection: &str,
        filter: RawDocument,
        sort: RawDocument,
        limit: Option<u64>,
    ) -> Result<Vec<RawDocument>>;

    /// Insert one record, returning the store-assigned ordering key
    async fn insert(&self, collection: &str, document: RawDocument) -> Result<ObjectId>;

    /// Set fields on every record matching the filter, returning the number
    /// of records changed
    async fn update(&self, collection: &str, filter: RawDocument, set: RawDocument)
        -> Result<u64>;
}
