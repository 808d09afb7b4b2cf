//! Typed document contract
//!
//! Concrete document structs declare the standard storage fields themselves
//! (`_id`, `id`, `created_at`, `updated_at`) and implement [`Document`] to
//! bind the type to its collection name.

use std::fmt::Debug;

use bson::oid::ObjectId;
use bson::DateTime;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

/// A typed document stored in a named collection.
///
/// Implementors are expected to carry the standard fields so that parsing a
/// raw store record succeeds:
///
/// - `#[serde(rename = "_id")] object_id: ObjectId` — store-assigned ordering
///   key, immutable after insert
/// - `id: String` — short unique identifier, immutable after creation
/// - `created_at: bson::DateTime` / `updated_at: bson::DateTime`
pub trait Document:
    Serialize + DeserializeOwned + Clone + Debug + Send + Sync + Unpin + 'static
{
    /// Collection this document type is stored in
    const COLLECTION: &'static str;

    /// Short unique identifier
    fn id(&self) -> &str;
}

/// Generate a short opaque document identifier.
///
/// Base58-encoded UUIDv4 bytes, 22 characters, URL safe.
pub fn new_document_id() -> String {
    bs58::encode(Uuid::new_v4().as_bytes()).into_string()
}

/// Current time at the storage engine's millisecond precision
pub fn now() -> DateTime {
    DateTime::now()
}

/// Read the ordering key out of a raw record
pub(crate) fn raw_object_id(raw: &bson::Document) -> Option<ObjectId> {
    raw.get_object_id("_id").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_ids_are_unique_and_short() {
        let a = new_document_id();
        let b = new_document_id();

        assert_ne!(a, b);
        assert!(a.len() <= 24);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_timestamps_round_trip_at_millisecond_precision() {
        let stamp = now();
        let rebuilt = DateTime::from_millis(stamp.timestamp_millis());

        // bson::DateTime stores milliseconds since the epoch; nothing finer
        // survives a round trip through the store.
        assert_eq!(stamp, rebuilt);
    }
}
