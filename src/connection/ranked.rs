//! Ranked-search paginator
//!
//! Pages through a relevance-ranked result list using offset cursors scoped
//! to one query string. The ranking engine only returns identifiers; full
//! documents are resolved through the batch loader, which preserves rank
//! order.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::connection::cursor::{self, RankedCursor};
use crate::connection::{Connection, Edge, PageInfo, PageRequest, Paginator};
use crate::document::Document;
use crate::loader::Loader;
use crate::search::SearchIndex;
use crate::types::{Result, TurnstileError};

/// Paginator over a ranked search result list
pub(crate) struct RankedPaginator<D: Document> {
    index: Arc<dyn SearchIndex>,
    loader: Arc<Loader>,
    collection: String,
    query: String,
    _document: PhantomData<fn() -> D>,
}

impl<D: Document> RankedPaginator<D> {
    pub(crate) fn new(
        index: Arc<dyn SearchIndex>,
        loader: Arc<Loader>,
        collection: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            index,
            loader,
            collection: collection.into(),
            query: query.into(),
            _document: PhantomData,
        }
    }

    /// Translate the request into an `(offset, limit)` window.
    ///
    /// Backward windows clamp at the start of the list, so `limit` shrinks
    /// when fewer than a full page precedes the anchor.
    fn window(&self, request: &PageRequest) -> Result<(u64, u64)> {
        let page_size = u64::from(request.page_size);

        let Some(token) = &request.cursor else {
            return Ok((0, page_size));
        };

        let anchor: RankedCursor = cursor::decode(token)?;
        if anchor.query != self.query {
            return Err(TurnstileError::StaleCursor {
                expected: anchor.query,
                requested: self.query.clone(),
            });
        }

        if request.backward {
            let offset = anchor.offset.saturating_sub(page_size);
            let limit = page_size.min(anchor.offset);
            Ok((offset, limit))
        } else {
            Ok((anchor.offset + 1, page_size))
        }
    }
}

#[async_trait]
impl<D: Document> Paginator<D> for RankedPaginator<D> {
    async fn page(&self, request: &PageRequest) -> Result<Connection<D>> {
        let (offset, limit) = self.window(request)?;

        let results = self
            .index
            .search(&self.collection, &self.query, limit, offset)
            .await?;

        debug!(
            collection = %self.collection,
            query = %self.query,
            offset,
            limit,
            total = results.total,
            "ranked page"
        );

        let records = self.loader.load_many(&results.ids).await?;

        let page_info = PageInfo {
            has_next_page: offset + limit < results.total,
            has_previous_page: offset != 0,
        };

        let mut edges = Vec::with_capacity(records.len());
        for (position, (id, record)) in results.ids.iter().zip(records).enumerate() {
            let record = record.ok_or_else(|| TurnstileError::MissingDocument {
                collection: self.collection.clone(),
                id: id.clone(),
            })?;

            let node: D = bson::from_document(record).map_err(|err| {
                TurnstileError::MalformedDocument {
                    collection: self.collection.clone(),
                    message: err.to_string(),
                }
            })?;

            let token = cursor::encode(&RankedCursor {
                offset: offset + position as u64,
                query: self.query.clone(),
            })?;

            edges.push(Edge {
                node,
                cursor: token,
            });
        }

        Ok(Connection { edges, page_info })
    }
}
