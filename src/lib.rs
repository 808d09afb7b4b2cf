//! Turnstile - typed document collections with cursor-paginated connections
//!
//! A document-mapping layer over a pluggable, MongoDB-shaped store: typed
//! documents, change events, and bidirectional cursor pagination
//! ("connections") with optional search-backed pagination.
//!
//! ## Components
//!
//! - **Client**: wires a store, an optional search index and a schema
//!   registry into typed [`Collection`] handles
//! - **Connections**: stable cursor pagination over ordered scans and
//!   relevance-ranked search results, behind one `find_connection` call
//! - **Events**: per-descriptor observers notified after create/update
//! - **Loader**: order-preserving batched by-id resolution with caching
//! - **Memory backends**: in-process [`MemoryStore`] and [`MemoryIndex`]
//!   implementing the store and search interfaces
//!
//! ## Example
//!
//! ```ignore
//! let mut registry = Registry::new();
//! registry.register(Descriptor::<Item>::new().sort_option("index"))?;
//!
//! let store = Arc::new(MemoryStore::new());
//! let client = Client::initialize(store, None, registry, Config::default()).await?;
//!
//! let items = client.collection::<Item>()?;
//! let page = items
//!     .find_connection(ConnectionArgs {
//!         first: Some(10),
//!         ..Default::default()
//!     })
//!     .await?;
//! ```

pub mod client;
pub mod collection;
pub mod config;
pub mod connection;
pub mod document;
pub mod events;
pub mod loader;
pub mod registry;
pub mod search;
pub mod store;
pub mod types;

pub use client::Client;
pub use collection::{Collection, FindOptions};
pub use config::Config;
pub use connection::cursor::{RankedCursor, ScanCursor};
pub use connection::{Connection, ConnectionArgs, Edge, PageInfo};
pub use document::{new_document_id, Document};
pub use events::{ChangeEvent, ChangeHandler, Context, EventKind};
pub use loader::Loader;
pub use registry::{CollectionConfig, Descriptor, Registry};
pub use search::{MemoryIndex, SearchEntry, SearchIndex, SearchResults};
pub use store::{DocumentStore, MemoryStore};
pub use types::{Result, TurnstileError};
