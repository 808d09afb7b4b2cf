//! Client wiring
//!
//! A [`Client`] binds an already-connected store, an optional search index
//! and an immutable [`Registry`] together, owning one batch loader per
//! registered collection. Initialization backfills the search index for
//! every searchable collection so pre-existing documents become findable.

use std::collections::HashMap;
use std::sync::Arc;

use bson::doc;
use tracing::info;

use crate::collection::Collection;
use crate::config::Config;
use crate::document::Document;
use crate::events::Context;
use crate::loader::Loader;
use crate::registry::Registry;
use crate::search::{project_entry, SearchIndex};
use crate::store::DocumentStore;
use crate::types::{Result, TurnstileError};

/// Entry point for typed collection access
#[derive(Clone)]
pub struct Client {
    store: Arc<dyn DocumentStore>,
    search: Option<Arc<dyn SearchIndex>>,
    registry: Arc<Registry>,
    loaders: Arc<HashMap<String, Arc<Loader>>>,
    context: Option<Context>,
    config: Config,
}

impl Client {
    /// Wire a client over an already-connected store and optional search
    /// index.
    ///
    /// The registry is consumed and immutable from here on. Searchable
    /// collections are backfilled into the index before the client is
    /// returned.
    pub async fn initialize(
        store: Arc<dyn DocumentStore>,
        search: Option<Arc<dyn SearchIndex>>,
        registry: Registry,
        config: Config,
    ) -> Result<Self> {
        let registry = Arc::new(registry);

        let mut loaders = HashMap::new();
        for collection_config in registry.configs() {
            loaders.insert(
                collection_config.name.clone(),
                Arc::new(Loader::new(
                    Arc::clone(&store),
                    collection_config.name.clone(),
                )),
            );
        }

        let client = Self {
            store,
            search,
            registry,
            loaders: Arc::new(loaders),
            context: None,
            config,
        };

        client.backfill_search().await?;

        Ok(client)
    }

    /// Mirror every searchable collection's existing documents into the
    /// search index, in `Config::backfill_chunk_size` batches
    async fn backfill_search(&self) -> Result<()> {
        let Some(index) = &self.search else {
            return Ok(());
        };

        for collection_config in self.registry.configs() {
            let Some(fields) = &collection_config.search_fields else {
                continue;
            };

            let records = self
                .store
                .scan(
                    &collection_config.name,
                    doc! {},
                    doc! { "_id": 1 },
                    None,
                )
                .await?;

            info!(
                collection = %collection_config.name,
                documents = records.len(),
                "backfilling search index"
            );

            for chunk in records.chunks(self.config.backfill_chunk_size) {
                let entries = chunk
                    .iter()
                    .filter_map(|record| project_entry(record, fields))
                    .collect();
                index.upsert(&collection_config.name, entries).await?;
            }
        }

        Ok(())
    }

    /// Clone of this client carrying a caller context, which is forwarded
    /// to change observers
    pub fn with_context(&self, context: Context) -> Self {
        let mut client = self.clone();
        client.context = Some(context);
        client
    }

    /// Typed access to a registered collection
    pub fn collection<D: Document>(&self) -> Result<Collection<D>> {
        let descriptor = self.registry.descriptor::<D>()?;
        let loader = self
            .loaders
            .get(D::COLLECTION)
            .cloned()
            .ok_or_else(|| TurnstileError::UnknownCollection(D::COLLECTION.to_string()))?;

        Ok(Collection::new(
            Arc::clone(&self.store),
            self.search.clone(),
            loader,
            descriptor,
            self.context.clone(),
        ))
    }

    /// The backing store handle
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// The search index handle, when configured
    pub fn search(&self) -> Option<&Arc<dyn SearchIndex>> {
        self.search.as_ref()
    }
}
