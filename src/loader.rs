//! Batched by-id document resolution
//!
//! Resolves identifier lists to raw records in one store round trip,
//! preserving input order and length. Resolved records are cached across
//! calls; mutations prime or invalidate the cache so reads stay current.

use std::collections::HashMap;
use std::sync::Arc;

use bson::{doc, Bson, Document as RawDocument};
use dashmap::DashMap;
use tracing::debug;

use crate::store::DocumentStore;
use crate::types::Result;

/// Per-collection loader with a cross-call cache
pub struct Loader {
    store: Arc<dyn DocumentStore>,
    collection: String,
    cache: DashMap<String, RawDocument>,
}

impl Loader {
    pub(crate) fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
            cache: DashMap::new(),
        }
    }

    /// Resolve identifiers to raw records.
    ///
    /// The result has the same order and length as the input; unknown
    /// identifiers resolve to `None`. Duplicate identifiers are fetched once.
    pub async fn load_many(&self, ids: &[String]) -> Result<Vec<Option<RawDocument>>> {
        let mut resolved: HashMap<String, RawDocument> = HashMap::new();
        let mut missing: Vec<String> = Vec::new();

        for id in ids {
            if resolved.contains_key(id) || missing.contains(id) {
                continue;
            }
            match self.cache.get(id) {
                Some(record) => {
                    resolved.insert(id.clone(), record.clone());
                }
                None => missing.push(id.clone()),
            }
        }

        if !missing.is_empty() {
            debug!(
                collection = %self.collection,
                requested = ids.len(),
                fetching = missing.len(),
                "loader batch fetch"
            );

            let clauses: Vec<Bson> = missing
                .iter()
                .map(|id| Bson::Document(doc! { "id": id.as_str() }))
                .collect();
            let records = self
                .store
                .scan(&self.collection, doc! { "$or": clauses }, doc! {}, None)
                .await?;

            for record in records {
                if let Ok(id) = record.get_str("id") {
                    self.cache.insert(id.to_string(), record.clone());
                    resolved.insert(id.to_string(), record);
                }
            }
        }

        Ok(ids.iter().map(|id| resolved.get(id).cloned()).collect())
    }

    /// Resolve one identifier
    pub async fn load_one(&self, id: &str) -> Result<Option<RawDocument>> {
        let ids = [id.to_string()];
        let mut records = self.load_many(&ids).await?;
        Ok(records.pop().flatten())
    }

    /// Put a freshly written record into the cache
    pub(crate) fn prime(&self, record: RawDocument) {
        if let Some(id) = record.get_str("id").ok().map(str::to_string) {
            self.cache.insert(id, record);
        }
    }

    /// Drop a record from the cache
    pub(crate) fn invalidate(&self, id: &str) {
        self.cache.remove(id);
    }
}
