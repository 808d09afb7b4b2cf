//! In-memory search index
//!
//! Token-based matching with insertion-ordered ranking: an entry matches when
//! every query token appears among its field tokens. Replacing an entry keeps
//! its rank position, so cursors stay stable across updates.

use async_trait::async_trait;
use bson::Bson;
use dashmap::DashMap;
use tracing::debug;

use crate::search::{SearchEntry, SearchIndex, SearchResults};
use crate::types::Result;

/// In-memory index keyed by collection name
#[derive(Debug, Default)]
pub struct MemoryIndex {
    collections: DashMap<String, Vec<SearchEntry>>,
}

impl MemoryIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries indexed for a collection
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    /// Whether a collection has no indexed entries
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

#[async_trait]
impl SearchIndex for MemoryIndex {
    async fn search(
        &self,
        collection: &str,
        query: &str,
        limit: u64,
        offset: u64,
    ) -> Result<SearchResults> {
        let needles = tokenize(query);

        let hits: Vec<String> = self
            .collections
            .get(collection)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| entry_matches(entry, &needles))
                    .map(|entry| entry.id.clone())
                    .collect()
            })
            .unwrap_or_default();

        let total = hits.len() as u64;
        let ids: Vec<String> = hits
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();

        debug!(collection, query, total, returned = ids.len(), "memory index search");
        Ok(SearchResults { ids, total })
    }

    async fn upsert(&self, collection: &str, entries: Vec<SearchEntry>) -> Result<()> {
        let mut indexed = self.collections.entry(collection.to_string()).or_default();

        for entry in entries {
            match indexed.iter().position(|existing| existing.id == entry.id) {
                Some(position) => indexed[position] = entry,
                None => indexed.push(entry),
            }
        }

        Ok(())
    }
}

fn entry_matches(entry: &SearchEntry, needles: &[String]) -> bool {
    if needles.is_empty() {
        return true;
    }

    let mut haystack = Vec::new();
    for (_, value) in entry.fields.iter() {
        collect_tokens(value, &mut haystack);
    }

    needles.iter().all(|needle| haystack.contains(needle))
}

fn collect_tokens(value: &Bson, out: &mut Vec<String>) {
    match value {
        Bson::String(text) => out.extend(tokenize(text)),
        Bson::Array(items) => {
            for item in items {
                collect_tokens(item, out);
            }
        }
        Bson::Int32(v) => out.push(v.to_string()),
        Bson::Int64(v) => out.push(v.to_string()),
        _ => {}
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_lowercase())
        .collect()
}
