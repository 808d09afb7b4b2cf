//! Typed collection access
//!
//! A [`Collection`] binds one registered document type to the client's store,
//! search index and loader. It owns the thin CRUD wrappers and the
//! `find_connection` facade that dispatches to the scan or ranked paginator.

use std::sync::Arc;

use bson::{doc, Document as RawDocument};
use tracing::debug;

use crate::connection::ranked::RankedPaginator;
use crate::connection::scan::ScanPaginator;
use crate::connection::{Connection, ConnectionArgs, PageRequest, Paginator};
use crate::document::{new_document_id, now, Document};
use crate::events::{dispatch, Context, EventKind};
use crate::loader::Loader;
use crate::registry::Descriptor;
use crate::search::{project_entry, SearchIndex};
use crate::store::DocumentStore;
use crate::types::{Result, TurnstileError};

/// Options for plain sorted scans
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Secondary sort field; must be a declared sort option
    pub sort: Option<String>,
    /// Descending order
    pub reverse: bool,
    /// Maximum number of documents
    pub limit: Option<u64>,
}

/// Typed access to one collection
#[derive(Clone)]
pub struct Collection<D: Document> {
    store: Arc<dyn DocumentStore>,
    search: Option<Arc<dyn SearchIndex>>,
    loader: Arc<Loader>,
    descriptor: Arc<Descriptor<D>>,
    context: Option<Context>,
}

impl<D: Document> Collection<D> {
    pub(crate) fn new(
        store: Arc<dyn DocumentStore>,
        search: Option<Arc<dyn SearchIndex>>,
        loader: Arc<Loader>,
        descriptor: Arc<Descriptor<D>>,
        context: Option<Context>,
    ) -> Self {
        Self {
            store,
            search,
            loader,
            descriptor,
            context,
        }
    }

    /// Collection name
    pub fn name(&self) -> &str {
        &self.descriptor.config().name
    }

    fn parse(&self, record: RawDocument) -> Result<D> {
        bson::from_document(record).map_err(|err| TurnstileError::MalformedDocument {
            collection: self.name().to_string(),
            message: err.to_string(),
        })
    }

    /// Find the first document matching the filter
    pub async fn find_one(&self, filter: RawDocument) -> Result<Option<D>> {
        let mut records = self
            .store
            .scan(self.name(), filter, doc! { "_id": 1 }, Some(1))
            .await?;

        records.pop().map(|record| self.parse(record)).transpose()
    }

    /// Find a document by its identifier
    pub async fn find_one_by_id(&self, id: &str) -> Result<Option<D>> {
        self.find_one(doc! { "id": id }).await
    }

    /// Sorted scan over the collection.
    ///
    /// The ordering key is always appended to the sort as a tiebreaker, so
    /// the result order is total even with duplicate sort values.
    pub async fn find(&self, filter: RawDocument, options: FindOptions) -> Result<Vec<D>> {
        if let Some(sort) = &options.sort {
            self.descriptor.config().ensure_sort_option(sort)?;
        }

        let direction = if options.reverse { -1 } else { 1 };
        let mut sort_spec = RawDocument::new();
        if let Some(sort) = &options.sort {
            sort_spec.insert(sort.clone(), direction);
        }
        sort_spec.insert("_id", direction);

        let records = self
            .store
            .scan(self.name(), filter, sort_spec, options.limit)
            .await?;

        records
            .into_iter()
            .map(|record| self.parse(record))
            .collect()
    }

    /// Resolve identifiers through the batch loader, preserving order and
    /// length
    pub async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Option<D>>> {
        let records = self.loader.load_many(ids).await?;

        records
            .into_iter()
            .map(|record| record.map(|r| self.parse(r)).transpose())
            .collect()
    }

    /// Resolve one identifier through the batch loader
    pub async fn load_one(&self, id: &str) -> Result<Option<D>> {
        let record = self.loader.load_one(id).await?;
        record.map(|r| self.parse(r)).transpose()
    }

    /// Create a document.
    ///
    /// Assigns the identifier and timestamps, inserts, and dispatches a
    /// `Create` event to the descriptor's observers.
    pub async fn create_one(&self, fields: RawDocument) -> Result<D> {
        let stamp = now();
        let mut record = fields;
        record.insert("id", new_document_id());
        record.insert("created_at", stamp);
        record.insert("updated_at", stamp);

        let object_id = self.store.insert(self.name(), record.clone()).await?;
        record.insert("_id", object_id);

        debug!(collection = %self.name(), %object_id, "created document");

        let node = self.parse(record.clone())?;
        self.loader.prime(record.clone());
        self.sync_search(&record).await?;
        dispatch(
            self.descriptor.observers(),
            EventKind::Create,
            &node,
            self.context.as_ref(),
        )
        .await?;

        Ok(node)
    }

    /// Update the first document matching the filter.
    ///
    /// Only fields whose values actually change are written; a no-op update
    /// bumps nothing and dispatches no event.
    pub async fn update_one(&self, filter: RawDocument, update: RawDocument) -> Result<D> {
        let mut records = self
            .store
            .scan(self.name(), filter, doc! { "_id": 1 }, Some(1))
            .await?;
        let record = records
            .pop()
            .ok_or_else(|| TurnstileError::NotFound(self.name().to_string()))?;

        self.apply_update(record, &update).await
    }

    /// Update a document by its identifier
    pub async fn update_one_by_id(&self, id: &str, update: RawDocument) -> Result<D> {
        self.update_one(doc! { "id": id }, update).await
    }

    /// Apply the same update to every document matching the filter
    pub async fn update_many(&self, filter: RawDocument, update: RawDocument) -> Result<Vec<D>> {
        let records = self
            .store
            .scan(self.name(), filter, doc! { "_id": 1 }, None)
            .await?;

        let mut updated = Vec::with_capacity(records.len());
        for record in records {
            updated.push(self.apply_update(record, &update).await?);
        }

        Ok(updated)
    }

    async fn apply_update(&self, original: RawDocument, update: &RawDocument) -> Result<D> {
        let mut changed = RawDocument::new();
        for (key, value) in update.iter() {
            if original.get(key) != Some(value) {
                changed.insert(key.clone(), value.clone());
            }
        }

        if changed.is_empty() {
            return self.parse(original);
        }
        changed.insert("updated_at", now());

        let id = original
            .get_str("id")
            .map_err(|_| TurnstileError::MalformedDocument {
                collection: self.name().to_string(),
                message: "record is missing id".to_string(),
            })?
            .to_string();

        self.store
            .update(self.name(), doc! { "id": id.as_str() }, changed.clone())
            .await?;

        let mut record = original;
        for (key, value) in changed.iter() {
            record.insert(key.clone(), value.clone());
        }

        debug!(collection = %self.name(), id = %id, fields = changed.len(), "updated document");

        let node = self.parse(record.clone())?;
        self.loader.prime(record.clone());
        self.sync_search(&record).await?;
        dispatch(
            self.descriptor.observers(),
            EventKind::Update,
            &node,
            self.context.as_ref(),
        )
        .await?;

        Ok(node)
    }

    /// Cursor-paginated connection over this collection.
    ///
    /// With a free-text `query` the page comes from the ranked search index;
    /// otherwise from an ordered store scan. `sort` and `reverse` apply only
    /// to the store path and are rejected alongside a query.
    pub async fn find_connection(&self, args: ConnectionArgs) -> Result<Connection<D>> {
        let request = PageRequest::from_args(&args)?;

        let ranked;
        let scan;
        let paginator: &dyn Paginator<D> = match &args.query {
            Some(query) => {
                if args.sort.is_some() || args.reverse {
                    return Err(TurnstileError::Configuration(
                        "sort and reverse cannot be combined with a search query".to_string(),
                    ));
                }
                let index = self.search.clone().ok_or_else(|| {
                    TurnstileError::SearchUnavailable(self.name().to_string())
                })?;

                ranked = RankedPaginator::new(
                    index,
                    Arc::clone(&self.loader),
                    self.name().to_string(),
                    query.clone(),
                );
                &ranked
            }
            None => {
                if let Some(sort) = &args.sort {
                    self.descriptor.config().ensure_sort_option(sort)?;
                }

                scan = ScanPaginator::new(
                    Arc::clone(&self.store),
                    self.name().to_string(),
                    args.filter.clone(),
                    args.sort.clone(),
                    args.reverse,
                );
                &scan
            }
        };

        paginator.page(&request).await
    }

    /// Mirror a record into the search index, when this collection is
    /// searchable and the client has an index configured
    async fn sync_search(&self, record: &RawDocument) -> Result<()> {
        let (Some(index), Some(fields)) = (
            self.search.as_ref(),
            self.descriptor.config().search_fields.as_ref(),
        ) else {
            return Ok(());
        };

        if let Some(entry) = project_entry(record, fields) {
            index.upsert(self.name(), vec![entry]).await?;
        }

        Ok(())
    }
}
