//! Sorted scan and sorted connection integration tests

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use bson::doc;
use bson::oid::ObjectId;
use common::{item_client, last_cursor, nodes, Item};
use serde::{Deserialize, Serialize};
use turnstile::{
    Client, Config, ConnectionArgs, Descriptor, Document, FindOptions, MemoryStore, Registry,
    TurnstileError,
};

/// Seed items with index values descending in creation order, so index order
/// and insertion order disagree
async fn seeded_descending(count: i64) -> (Client, Vec<Item>) {
    let client = item_client().await;
    let items = client.collection::<Item>().expect("items collection");

    let mut fixture = Vec::new();
    for index in 0..count {
        let item = items
            .create_one(doc! { "index": count - index })
            .await
            .expect("create item");
        fixture.push(item);
    }

    (client, fixture)
}

#[tokio::test]
async fn test_sorted_find() {
    let (client, fixture) = seeded_descending(50).await;
    let items = client.collection::<Item>().unwrap();
    let reversed: Vec<Item> = fixture.iter().rev().cloned().collect();

    let index_ascending = items
        .find(
            doc! {},
            FindOptions {
                sort: Some("index".to_string()),
                limit: Some(10),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(index_ascending, reversed[..10]);

    let index_descending = items
        .find(
            doc! {},
            FindOptions {
                sort: Some("index".to_string()),
                reverse: true,
                limit: Some(10),
            },
        )
        .await
        .unwrap();
    assert_eq!(index_descending, fixture[..10]);

    let created_ascending = items
        .find(
            doc! {},
            FindOptions {
                sort: Some("created_at".to_string()),
                limit: Some(10),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(created_ascending, fixture[..10]);
}

#[tokio::test]
async fn test_undeclared_sort_field_rejected() {
    let (client, _) = seeded_descending(5).await;
    let items = client.collection::<Item>().unwrap();

    let result = items
        .find(
            doc! {},
            FindOptions {
                sort: Some("title".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(TurnstileError::Configuration(_))));

    let result = items
        .find_connection(ConnectionArgs {
            first: Some(10),
            sort: Some("title".to_string()),
            ..Default::default()
        })
        .await;
    assert!(matches!(result, Err(TurnstileError::Configuration(_))));
}

#[tokio::test]
async fn test_reversed_connection() {
    let (client, fixture) = seeded_descending(50).await;
    let items = client.collection::<Item>().unwrap();
    let reversed: Vec<Item> = fixture.iter().rev().cloned().collect();

    let first_page = items
        .find_connection(ConnectionArgs {
            first: Some(10),
            reverse: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(nodes(&first_page), reversed[..10]);

    let second_page = items
        .find_connection(ConnectionArgs {
            first: Some(10),
            after: Some(last_cursor(&first_page)),
            reverse: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(nodes(&second_page), reversed[10..20]);
}

#[tokio::test]
async fn test_sorted_connection() {
    let (client, fixture) = seeded_descending(50).await;
    let items = client.collection::<Item>().unwrap();
    let reversed: Vec<Item> = fixture.iter().rev().cloned().collect();

    let first_page = items
        .find_connection(ConnectionArgs {
            first: Some(10),
            sort: Some("index".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(nodes(&first_page), reversed[..10]);

    let second_page = items
        .find_connection(ConnectionArgs {
            first: Some(10),
            after: Some(last_cursor(&first_page)),
            sort: Some("index".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(nodes(&second_page), reversed[10..20]);

    let reversed_first_page = items
        .find_connection(ConnectionArgs {
            first: Some(10),
            sort: Some("index".to_string()),
            reverse: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(nodes(&reversed_first_page), fixture[..10]);

    let reversed_second_page = items
        .find_connection(ConnectionArgs {
            first: Some(10),
            after: Some(last_cursor(&reversed_first_page)),
            sort: Some("index".to_string()),
            reverse: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(nodes(&reversed_second_page), fixture[10..20]);
}

#[tokio::test]
async fn test_sorted_backward_connection() {
    let (client, _) = seeded_descending(50).await;
    let items = client.collection::<Item>().unwrap();

    let head = items
        .find_connection(ConnectionArgs {
            first: Some(20),
            sort: Some("index".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    let head_nodes = nodes(&head);

    let rewound = items
        .find_connection(ConnectionArgs {
            last: Some(10),
            before: Some(last_cursor(&head)),
            sort: Some("index".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    // The ten documents preceding the anchor, in ascending display order
    assert_eq!(nodes(&rewound), head_nodes[9..19]);
    assert!(rewound.page_info.has_next_page);
    assert!(rewound.page_info.has_previous_page);
}

/// Ticket with a non-unique priority, for tiebreak coverage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Ticket {
    #[serde(rename = "_id")]
    object_id: ObjectId,
    id: String,
    created_at: bson::DateTime,
    updated_at: bson::DateTime,
    priority: i64,
    serial: i64,
}

impl Document for Ticket {
    const COLLECTION: &'static str = "tickets";

    fn id(&self) -> &str {
        &self.id
    }
}

#[tokio::test]
async fn test_duplicate_sort_values_partition_cleanly() {
    let mut registry = Registry::new();
    registry
        .register(Descriptor::<Ticket>::new().sort_option("priority"))
        .expect("register tickets");
    let client = Client::initialize(
        Arc::new(MemoryStore::new()),
        None,
        registry,
        Config::default(),
    )
    .await
    .expect("client initializes");

    let tickets = client.collection::<Ticket>().unwrap();
    for serial in 0..50i64 {
        tickets
            .create_one(doc! { "priority": serial % 5, "serial": serial })
            .await
            .expect("create ticket");
    }

    // Page all the way through under the duplicate-heavy sort; every ticket
    // must appear exactly once.
    let mut seen: Vec<Ticket> = Vec::new();
    let mut after: Option<String> = None;
    loop {
        let page = tickets
            .find_connection(ConnectionArgs {
                first: Some(7),
                after: after.clone(),
                sort: Some("priority".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        seen.extend(nodes(&page));
        if !page.page_info.has_next_page {
            break;
        }
        after = Some(last_cursor(&page));
    }

    assert_eq!(seen.len(), 50);

    let unique: HashSet<String> = seen.iter().map(|t| t.id.clone()).collect();
    assert_eq!(unique.len(), 50, "no ticket repeated across pages");

    // Priorities are non-decreasing, and within one priority the serials
    // follow insertion order (the _id tiebreaker)
    for window in seen.windows(2) {
        assert!(window[0].priority <= window[1].priority);
        if window[0].priority == window[1].priority {
            assert!(window[0].serial < window[1].serial);
        }
    }
}

#[tokio::test]
async fn test_cursor_sort_mismatch_degrades_to_tiebreaker() {
    let (client, fixture) = seeded_descending(20).await;
    let items = client.collection::<Item>().unwrap();

    // Cursor issued under a sort...
    let sorted_page = items
        .find_connection(ConnectionArgs {
            first: Some(5),
            sort: Some("index".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    // ...reused without one: the embedded sort value is ignored and only the
    // ordering-key tiebreaker applies.
    let anchor = nodes(&sorted_page).last().cloned().unwrap();
    let degraded = items
        .find_connection(ConnectionArgs {
            first: Some(5),
            after: Some(last_cursor(&sorted_page)),
            ..Default::default()
        })
        .await
        .unwrap();

    let expected: Vec<Item> = fixture
        .iter()
        .filter(|item| item.object_id > anchor.object_id)
        .take(5)
        .cloned()
        .collect();
    assert_eq!(nodes(&degraded), expected);
}
