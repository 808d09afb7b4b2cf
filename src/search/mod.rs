//! Search engine interface
//!
//! The search engine is an already-connected collaborator exposing
//! relevance-ranked offset/limit queries. Only document identifiers come
//! back from a search; full documents are resolved through the loader.

pub mod memory;

use async_trait::async_trait;
use bson::Document as RawDocument;

use crate::types::Result;

pub use memory::MemoryIndex;

/// One searchable record: document id plus the indexed field values
#[derive(Debug, Clone)]
pub struct SearchEntry {
    /// Document identifier
    pub id: String,
    /// Indexed fields projected out of the document
    pub fields: RawDocument,
}

/// One page of ranked hits
#[derive(Debug, Clone)]
pub struct SearchResults {
    /// Document identifiers in rank order
    pub ids: Vec<String>,
    /// Total number of hits for the query, across all pages
    pub total: u64,
}

/// Project the searchable fields out of a raw record.
///
/// Returns `None` when the record has no identifier to index under.
pub(crate) fn project_entry(record: &RawDocument, fields: &[String]) -> Option<SearchEntry> {
    let id = record.get_str("id").ok()?.to_string();

    let mut projected = RawDocument::new();
    for field in fields {
        if let Some(value) = record.get(field) {
            projected.insert(field.clone(), value.clone());
        }
    }

    Some(SearchEntry {
        id,
        fields: projected,
    })
}

/// Relevance-ranked search over per-collection indexes
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Query a collection's index at `(offset, limit)`, returning ranked
    /// identifiers and the total hit count
    async fn search(
        &self,
        collection: &str,
        query: &str,
        limit: u64,
        offset: u64,
    ) -> Result<SearchResults>;

    /// Insert or replace entries in a collection's index
    async fn upsert(&self, collection: &str, entries: Vec<SearchEntry>) -> Result<()>;
}
