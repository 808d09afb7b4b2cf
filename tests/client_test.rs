//! Client and collection CRUD integration tests

mod common;

use std::sync::Arc;

use bson::doc;
use bson::oid::ObjectId;
use common::{item_client, Item, Product};
use serde::{Deserialize, Serialize};
use turnstile::{
    Client, Config, Descriptor, Document, FindOptions, MemoryStore, Registry, TurnstileError,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Note {
    #[serde(rename = "_id")]
    object_id: ObjectId,
    id: String,
    created_at: bson::DateTime,
    updated_at: bson::DateTime,
    index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl Document for Note {
    const COLLECTION: &'static str = "notes";

    fn id(&self) -> &str {
        &self.id
    }
}

async fn note_client() -> Client {
    let mut registry = Registry::new();
    registry
        .register(Descriptor::<Note>::new())
        .expect("register notes");

    Client::initialize(
        Arc::new(MemoryStore::new()),
        None,
        registry,
        Config::default(),
    )
    .await
    .expect("client initializes")
}

#[tokio::test]
async fn test_create_and_find_round_trip() {
    let client = item_client().await;
    let items = client.collection::<Item>().unwrap();

    let created = items.create_one(doc! { "index": 1 }).await.unwrap();
    assert!(!created.id.is_empty());
    assert_eq!(created.created_at, created.updated_at);

    let found = items.find_one_by_id(&created.id).await.unwrap();
    assert_eq!(found, Some(created));
}

#[tokio::test]
async fn test_find_variants() {
    let client = item_client().await;
    let items = client.collection::<Item>().unwrap();

    assert_eq!(items.find_one(doc! {}).await.unwrap(), None);
    assert_eq!(items.find_one_by_id("fakeid").await.unwrap(), None);
    assert_eq!(
        items.find_by_ids(&["fakeid".to_string()]).await.unwrap(),
        vec![None]
    );
    assert!(items
        .find(doc! {}, FindOptions::default())
        .await
        .unwrap()
        .is_empty());

    let mut created = Vec::new();
    for index in 0..10 {
        created.push(items.create_one(doc! { "index": index }).await.unwrap());
    }

    assert_eq!(
        items.find_one(doc! { "index": 4 }).await.unwrap(),
        Some(created[4].clone())
    );
    assert_eq!(
        items.find_one_by_id(&created[9].id).await.unwrap(),
        Some(created[9].clone())
    );

    // Batch resolution preserves request order and marks absences
    let batch = items
        .find_by_ids(&[
            created[9].id.clone(),
            "fakeid".to_string(),
            created[3].id.clone(),
            created[5].id.clone(),
        ])
        .await
        .unwrap();
    assert_eq!(
        batch,
        vec![
            Some(created[9].clone()),
            None,
            Some(created[3].clone()),
            Some(created[5].clone()),
        ]
    );

    assert_eq!(
        items.find(doc! {}, FindOptions::default()).await.unwrap(),
        created
    );
    assert_eq!(
        items
            .find(doc! { "index": 4 }, FindOptions::default())
            .await
            .unwrap(),
        vec![created[4].clone()]
    );
}

#[tokio::test]
async fn test_update_one() {
    let client = note_client().await;
    let notes = client.collection::<Note>().unwrap();

    let mut created = Vec::new();
    for index in 0..10 {
        created.push(notes.create_one(doc! { "index": index }).await.unwrap());
    }

    let updated = notes
        .update_one(
            doc! { "index": 4 },
            doc! { "description": "Hello there how are you?" },
        )
        .await
        .unwrap();

    assert_eq!(updated.id, created[4].id);
    assert_eq!(
        updated.description.as_deref(),
        Some("Hello there how are you?")
    );
    assert!(updated.updated_at >= created[4].updated_at);
    assert_eq!(updated.created_at, created[4].created_at);

    // The write is visible through both the loader and a direct lookup
    assert_eq!(
        notes.load_one(&updated.id).await.unwrap(),
        Some(updated.clone())
    );
    assert_eq!(
        notes.find_one_by_id(&updated.id).await.unwrap(),
        Some(updated)
    );
}

#[tokio::test]
async fn test_update_one_no_change_is_a_no_op() {
    let client = note_client().await;
    let notes = client.collection::<Note>().unwrap();

    let created = notes.create_one(doc! { "index": 7 }).await.unwrap();
    let unchanged = notes
        .update_one_by_id(&created.id, doc! { "index": 7 })
        .await
        .unwrap();

    // No field changed, so the update timestamp must not move
    assert_eq!(unchanged, created);
}

#[tokio::test]
async fn test_update_missing_document() {
    let client = note_client().await;
    let notes = client.collection::<Note>().unwrap();

    let result = notes
        .update_one_by_id("fakeid", doc! { "index": 1 })
        .await;
    assert!(matches!(result, Err(TurnstileError::NotFound(_))));
}

#[tokio::test]
async fn test_update_many() {
    let client = note_client().await;
    let notes = client.collection::<Note>().unwrap();

    for index in 0..10 {
        notes.create_one(doc! { "index": index }).await.unwrap();
    }

    let updated = notes
        .update_many(
            doc! { "index": { "$gte": 4 } },
            doc! { "description": "bulk" },
        )
        .await
        .unwrap();

    assert_eq!(updated.len(), 6);
    for note in &updated {
        assert_eq!(note.description.as_deref(), Some("bulk"));
        assert_eq!(
            notes.find_one_by_id(&note.id).await.unwrap(),
            Some(note.clone())
        );
    }

    let untouched = notes
        .find(doc! { "index": { "$lt": 4 } }, FindOptions::default())
        .await
        .unwrap();
    assert!(untouched.iter().all(|note| note.description.is_none()));
}

#[tokio::test]
async fn test_collections_are_isolated() {
    let mut registry = Registry::new();
    registry
        .register(Descriptor::<Item>::new().sort_option("index"))
        .expect("register items");
    registry
        .register(Descriptor::<Product>::new())
        .expect("register products");

    let client = Client::initialize(
        Arc::new(MemoryStore::new()),
        None,
        registry,
        Config::default(),
    )
    .await
    .expect("client initializes");

    let items = client.collection::<Item>().unwrap();
    let products = client.collection::<Product>().unwrap();

    let item = items.create_one(doc! { "index": 1 }).await.unwrap();
    let product = products
        .create_one(doc! { "title": "tshirt" })
        .await
        .unwrap();

    assert_eq!(items.find_one_by_id(&item.id).await.unwrap(), Some(item));
    assert_eq!(
        products.find_one_by_id(&product.id).await.unwrap(),
        Some(product)
    );
    assert_eq!(items.find_one_by_id("nope").await.unwrap(), None);

    assert_eq!(
        items.find(doc! {}, FindOptions::default()).await.unwrap().len(),
        1
    );
    assert_eq!(
        products
            .find(doc! {}, FindOptions::default())
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_unregistered_collection_rejected() {
    let client = item_client().await;
    let result = client.collection::<Product>();
    assert!(matches!(
        result,
        Err(TurnstileError::UnknownCollection(_))
    ));
}
