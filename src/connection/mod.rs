//! Cursor-paginated connections
//!
//! The connection engine turns a filtered, sorted collection scan — or a
//! relevance-ranked search — into a stable, bidirectional, cursor-addressable
//! page sequence. Two paginators implement the same [`Paginator`] capability:
//! [`scan::ScanPaginator`] walks the store's native order with an `_id`
//! tiebreaker, [`ranked::RankedPaginator`] walks a ranked result list through
//! offset cursors scoped to one query string.

pub mod cursor;
pub(crate) mod ranked;
pub(crate) mod scan;

use async_trait::async_trait;
use bson::Document as RawDocument;
use serde::Serialize;

use crate::document::Document;
use crate::types::{Result, TurnstileError};

/// One document plus the cursor pointing at it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge<D> {
    /// The document
    pub node: D,
    /// Opaque token resuming pagination at this document
    pub cursor: String,
}

/// Whether pages exist beyond either end of the current page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PageInfo {
    /// A page exists after this one
    pub has_next_page: bool,
    /// A page exists before this one
    pub has_previous_page: bool,
}

/// One page of edges plus page info
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connection<D> {
    /// Edges in display order
    pub edges: Vec<Edge<D>>,
    /// Page boundary flags
    pub page_info: PageInfo,
}

impl<D> Connection<D> {
    /// Documents of this page, dropping the cursors
    pub fn into_nodes(self) -> Vec<D> {
        self.edges.into_iter().map(|edge| edge.node).collect()
    }

    /// Cursor of the first edge, if the page is non-empty
    pub fn start_cursor(&self) -> Option<&str> {
        self.edges.first().map(|edge| edge.cursor.as_str())
    }

    /// Cursor of the last edge, if the page is non-empty
    pub fn end_cursor(&self) -> Option<&str> {
        self.edges.last().map(|edge| edge.cursor.as_str())
    }
}

/// Arguments accepted by `find_connection`
#[derive(Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Opaque filter predicate, passed through to the store untouched
    pub filter: Option<RawDocument>,
    /// Free-text query; when present, pagination runs over the search index
    pub query: Option<String>,
    /// Page size for forward paging
    pub first: Option<u32>,
    /// Resume forward paging after this cursor
    pub after: Option<String>,
    /// Page size for backward paging
    pub last: Option<u32>,
    /// Resume backward paging before this cursor
    pub before: Option<String>,
    /// Secondary sort field (store pagination only)
    pub sort: Option<String>,
    /// Descending base direction (store pagination only)
    pub reverse: bool,
}

/// Validated pagination window shared by both paginators
#[derive(Debug, Clone)]
pub(crate) struct PageRequest {
    /// Maximum number of edges in the page
    pub page_size: u32,
    /// True when paging backward (`last`/`before`)
    pub backward: bool,
    /// Raw cursor token, if the caller supplied one
    pub cursor: Option<String>,
}

impl PageRequest {
    /// Enforce the first/last/after/before contract
    pub fn from_args(args: &ConnectionArgs) -> Result<Self> {
        let (page_size, backward) = match (args.first, args.last) {
            (Some(first), None) => (first, false),
            (None, Some(last)) => (last, true),
            (Some(_), Some(_)) => {
                return Err(TurnstileError::Configuration(
                    "first and last are mutually exclusive".to_string(),
                ))
            }
            (None, None) => {
                return Err(TurnstileError::Configuration(
                    "must provide one of first or last".to_string(),
                ))
            }
        };

        if page_size == 0 {
            return Err(TurnstileError::Configuration(
                "page size must be at least 1".to_string(),
            ));
        }

        if backward {
            if args.after.is_some() {
                return Err(TurnstileError::Configuration(
                    "after cannot be combined with last".to_string(),
                ));
            }
            if args.before.is_none() {
                return Err(TurnstileError::Configuration(
                    "must provide both last and before".to_string(),
                ));
            }
        } else if args.before.is_some() {
            return Err(TurnstileError::Configuration(
                "before cannot be combined with first".to_string(),
            ));
        }

        let cursor = if backward {
            args.before.clone()
        } else {
            args.after.clone()
        };

        Ok(Self {
            page_size,
            backward,
            cursor,
        })
    }
}

/// One capability, two implementations: page through a sequence
#[async_trait]
pub(crate) trait Paginator<D: Document>: Send + Sync {
    async fn page(&self, request: &PageRequest) -> Result<Connection<D>>;
}
