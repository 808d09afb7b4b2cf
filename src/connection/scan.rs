//! Ordered-store paginator
//!
//! Walks a sorted collection scan with the `_id` ordering key as tiebreaker.
//! Backward pages flip the effective scan direction, collect the preceding
//! window, and reverse it back into display order. One extra record is
//! fetched past the page size as a lookahead sentinel, so "is there more"
//! never costs a second round trip.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use bson::{doc, Bson, Document as RawDocument};
use tracing::debug;

use crate::connection::cursor::{self, ScanCursor};
use crate::connection::{Connection, Edge, PageInfo, PageRequest, Paginator};
use crate::document::{raw_object_id, Document};
use crate::store::DocumentStore;
use crate::types::{Result, TurnstileError};

/// Paginator over the store's native sort order
pub(crate) struct ScanPaginator<D: Document> {
    store: Arc<dyn DocumentStore>,
    collection: String,
    filter: Option<RawDocument>,
    sort: Option<String>,
    reverse: bool,
    _document: PhantomData<fn() -> D>,
}

impl<D: Document> ScanPaginator<D> {
    pub(crate) fn new(
        store: Arc<dyn DocumentStore>,
        collection: impl Into<String>,
        filter: Option<RawDocument>,
        sort: Option<String>,
        reverse: bool,
    ) -> Self {
        Self {
            store,
            collection: collection.into(),
            filter,
            sort,
            reverse,
            _document: PhantomData,
        }
    }

    /// Range predicate anchored at the cursor document.
    ///
    /// With a matching sort field the predicate widens to a disjunction:
    /// records strictly beyond the anchor's sort value, or records sharing
    /// that value but beyond the anchor's ordering key. Without the
    /// disjunction, duplicate sort values would be skipped or repeated
    /// across page boundaries.
    fn cursor_predicate(&self, cursor: &ScanCursor, operator: &str) -> RawDocument {
        let mut id_range = RawDocument::new();
        id_range.insert(operator, cursor.id);

        let mut predicate = RawDocument::new();
        predicate.insert("_id", id_range.clone());

        if let (Some(cursor_sort), Some(value)) = (&cursor.sort, &cursor.value) {
            if self.sort.as_deref() == Some(cursor_sort.as_str()) {
                let mut value_range = RawDocument::new();
                value_range.insert(operator, value.clone());

                let mut beyond_value = RawDocument::new();
                beyond_value.insert(cursor_sort.clone(), value_range);

                let mut same_value = RawDocument::new();
                same_value.insert(cursor_sort.clone(), value.clone());
                same_value.insert("_id", id_range);

                predicate = doc! { "$or": [beyond_value, same_value] };
            }
        }

        predicate
    }

    /// Store-level sort: the secondary field first when present, always
    /// terminated by the ordering key so the order is total
    fn sort_spec(&self, direction: i32) -> RawDocument {
        let mut spec = RawDocument::new();
        if let Some(sort) = &self.sort {
            spec.insert(sort.clone(), direction);
        }
        spec.insert("_id", direction);
        spec
    }

    /// Fresh cursor anchored at one result record
    fn edge_cursor(&self, record: &RawDocument) -> Result<String> {
        let id = raw_object_id(record).ok_or_else(|| TurnstileError::MalformedDocument {
            collection: self.collection.clone(),
            message: "record is missing _id".to_string(),
        })?;

        let value: Option<Bson> = self
            .sort
            .as_ref()
            .and_then(|field| record.get(field).cloned());

        cursor::encode(&ScanCursor {
            id,
            sort: self.sort.clone(),
            value,
        })
    }
}

#[async_trait]
impl<D: Document> Paginator<D> for ScanPaginator<D> {
    async fn page(&self, request: &PageRequest) -> Result<Connection<D>> {
        // Backward paging scans against the requested direction to collect
        // the preceding window, then restores display order below.
        let mut reverse = self.reverse;
        if request.backward {
            reverse = !reverse;
        }
        let operator = if reverse { "$lt" } else { "$gt" };
        let direction = if reverse { -1 } else { 1 };

        let mut filter = RawDocument::new();
        if let Some(token) = &request.cursor {
            let anchor: ScanCursor = cursor::decode(token)?;
            filter = self.cursor_predicate(&anchor, operator);
        }
        if let Some(extra) = &self.filter {
            filter = if filter.is_empty() {
                extra.clone()
            } else {
                doc! { "$and": [filter, extra.clone()] }
            };
        }

        let limit = u64::from(request.page_size) + 1;
        let mut records = self
            .store
            .scan(&self.collection, filter, self.sort_spec(direction), Some(limit))
            .await?;

        let lookahead = records.len() > request.page_size as usize;
        if lookahead {
            records.pop();
        }
        if request.backward {
            records.reverse();
        }

        let page_info = if request.backward {
            PageInfo {
                // A before-cursor anchors into a known-larger sequence, so
                // at least the anchor's own page lies ahead.
                has_next_page: true,
                has_previous_page: lookahead,
            }
        } else {
            PageInfo {
                has_next_page: lookahead,
                has_previous_page: request.cursor.is_some(),
            }
        };

        debug!(
            collection = %self.collection,
            page = records.len(),
            backward = request.backward,
            has_next = page_info.has_next_page,
            "scan page"
        );

        let mut edges = Vec::with_capacity(records.len());
        for record in records {
            let edge_cursor = self.edge_cursor(&record)?;
            let node: D = bson::from_document(record).map_err(|err| {
                TurnstileError::MalformedDocument {
                    collection: self.collection.clone(),
                    message: err.to_string(),
                }
            })?;
            edges.push(Edge {
                node,
                cursor: edge_cursor,
            });
        }

        Ok(Connection { edges, page_info })
    }
}
