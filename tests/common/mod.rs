//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use turnstile::{
    Client, Config, Connection, Descriptor, Document, MemoryIndex, MemoryStore, PageInfo, Registry,
};

/// Plain numbered document used by most scenarios
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "_id")]
    pub object_id: ObjectId,
    pub id: String,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
    pub index: i64,
}

impl Document for Item {
    const COLLECTION: &'static str = "items";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Searchable document with a title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub object_id: ObjectId,
    pub id: String,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
    pub title: String,
}

impl Document for Product {
    const COLLECTION: &'static str = "products";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Route crate logs to the test output when RUST_LOG is set
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Client over a fresh memory store with `Item` registered
pub async fn item_client() -> Client {
    init_tracing();

    let mut registry = Registry::new();
    registry
        .register(Descriptor::<Item>::new().sort_option("index"))
        .expect("register items");

    Client::initialize(
        Arc::new(MemoryStore::new()),
        None,
        registry,
        Config::default(),
    )
    .await
    .expect("client initializes")
}

/// Client over a fresh memory store and memory index with `Product`
/// registered as searchable
pub async fn product_client() -> Client {
    init_tracing();

    let mut registry = Registry::new();
    registry
        .register(Descriptor::<Product>::new().search_fields(["title"]))
        .expect("register products");

    Client::initialize(
        Arc::new(MemoryStore::new()),
        Some(Arc::new(MemoryIndex::new())),
        registry,
        Config::default(),
    )
    .await
    .expect("client initializes")
}

pub fn nodes<D: Clone>(connection: &Connection<D>) -> Vec<D> {
    connection.edges.iter().map(|edge| edge.node.clone()).collect()
}

pub fn first_cursor<D>(connection: &Connection<D>) -> String {
    connection
        .start_cursor()
        .expect("connection has edges")
        .to_string()
}

pub fn last_cursor<D>(connection: &Connection<D>) -> String {
    connection
        .end_cursor()
        .expect("connection has edges")
        .to_string()
}

pub fn assert_page_info<D>(connection: &Connection<D>, has_next_page: bool, has_previous_page: bool) {
    assert_eq!(
        connection.page_info,
        PageInfo {
            has_next_page,
            has_previous_page,
        }
    );
}
