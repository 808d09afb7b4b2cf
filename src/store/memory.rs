//! In-memory document store
//!
//! Insertion-ordered collections with a small BSON predicate matcher. The
//! ordering key is assigned at insert time from the wall clock plus a
//! process-wide sequence, so `_id` order always equals insertion order.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, Document as RawDocument};
use dashmap::DashMap;
use tracing::debug;

use crate::store::DocumentStore;
use crate::types::Result;

/// In-memory store keyed by collection name
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: DashMap<String, Vec<RawDocument>>,
    sequence: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in a collection
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|records| records.len())
            .unwrap_or(0)
    }

    /// Whether a collection is empty or absent
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Next ordering key: unix seconds in the leading bytes, then a
    /// process-wide sequence. Byte order equals assignment order.
    fn next_object_id(&self) -> ObjectId {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as u32)
            .unwrap_or(0);
        let sequence = self.sequence.fetch_add(1, AtomicOrdering::SeqCst);

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..].copy_from_slice(&sequence.to_be_bytes());
        ObjectId::from_bytes(bytes)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn scan(
        &self,
        collection: &str,
        filter: RawDocument,
        sort: RawDocument,
        limit: Option<u64>,
    ) -> Result<Vec<RawDocument>> {
        let mut records: Vec<RawDocument> = self
            .collections
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| matches(record, &filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if !sort.is_empty() {
            records.sort_by(|a, b| compare_records(a, b, &sort));
        }

        if let Some(limit) = limit {
            records.truncate(limit as usize);
        }

        debug!(collection, returned = records.len(), "memory store scan");
        Ok(records)
    }

    async fn insert(&self, collection: &str, mut document: RawDocument) -> Result<ObjectId> {
        let object_id = self.next_object_id();
        document.insert("_id", object_id);

        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(document);

        Ok(object_id)
    }

    async fn update(
        &self,
        collection: &str,
        filter: RawDocument,
        set: RawDocument,
    ) -> Result<u64> {
        let Some(mut entry) = self.collections.get_mut(collection) else {
            return Ok(0);
        };

        let mut changed = 0;
        for record in entry.iter_mut() {
            if !matches(record, &filter) {
                continue;
            }
            for (key, value) in set.iter() {
                record.insert(key.clone(), value.clone());
            }
            changed += 1;
        }

        Ok(changed)
    }
}

/// Evaluate a filter document against a record.
///
/// Supports the subset of the query language this crate emits: implicit
/// equality, `$and`, `$or`, and the `$eq`/`$ne`/`$gt`/`$gte`/`$lt`/`$lte`/
/// `$in` field operators.
pub(crate) fn matches(record: &RawDocument, filter: &RawDocument) -> bool {
    filter.iter().all(|(key, condition)| match key.as_str() {
        "$and" => clause_list(condition)
            .map(|clauses| clauses.iter().all(|clause| matches(record, clause)))
            .unwrap_or(false),
        "$or" => clause_list(condition)
            .map(|clauses| clauses.iter().any(|clause| matches(record, clause)))
            .unwrap_or(false),
        field => field_matches(record.get(field), condition),
    })
}

fn clause_list(condition: &Bson) -> Option<Vec<&RawDocument>> {
    match condition {
        Bson::Array(items) => items
            .iter()
            .map(|item| match item {
                Bson::Document(clause) => Some(clause),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

fn field_matches(value: Option<&Bson>, condition: &Bson) -> bool {
    match condition {
        Bson::Document(operators) if is_operator_document(operators) => operators
            .iter()
            .all(|(operator, operand)| operator_matches(value, operator, operand)),
        literal => bson_equals(value, literal),
    }
}

fn bson_equals(value: Option<&Bson>, operand: &Bson) -> bool {
    match value {
        Some(Bson::Document(x)) => matches!(operand, Bson::Document(y) if x == y),
        _ => compare_same_type(value, operand) == Some(Ordering::Equal),
    }
}

fn is_operator_document(condition: &RawDocument) -> bool {
    !condition.is_empty() && condition.keys().all(|key| key.starts_with('$'))
}

fn operator_matches(value: Option<&Bson>, operator: &str, operand: &Bson) -> bool {
    match operator {
        "$eq" => bson_equals(value, operand),
        "$ne" => !bson_equals(value, operand),
        "$gt" => compare_same_type(value, operand) == Some(Ordering::Greater),
        "$gte" => matches!(
            compare_same_type(value, operand),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        "$lt" => compare_same_type(value, operand) == Some(Ordering::Less),
        "$lte" => matches!(
            compare_same_type(value, operand),
            Some(Ordering::Less | Ordering::Equal)
        ),
        "$in" => match operand {
            Bson::Array(candidates) => candidates
                .iter()
                .any(|candidate| bson_equals(value, candidate)),
            _ => false,
        },
        _ => false,
    }
}

/// Compare a field value against an operand, refusing cross-type comparisons
/// the way range predicates do in the real store
fn compare_same_type(value: Option<&Bson>, operand: &Bson) -> Option<Ordering> {
    let value = value?;
    if type_rank(value) != type_rank(operand) {
        return None;
    }
    Some(total_compare(value, operand))
}

fn compare_records(a: &RawDocument, b: &RawDocument, sort: &RawDocument) -> Ordering {
    for (field, direction) in sort.iter() {
        let av = a.get(field).unwrap_or(&Bson::Null);
        let bv = b.get(field).unwrap_or(&Bson::Null);

        let mut ordering = if type_rank(av) == type_rank(bv) {
            total_compare(av, bv)
        } else {
            type_rank(av).cmp(&type_rank(bv))
        };

        if descending(direction) {
            ordering = ordering.reverse();
        }
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}

fn descending(direction: &Bson) -> bool {
    match direction {
        Bson::Int32(d) => *d < 0,
        Bson::Int64(d) => *d < 0,
        Bson::Double(d) => *d < 0.0,
        _ => false,
    }
}

/// Approximate canonical BSON type order
fn type_rank(value: &Bson) -> u8 {
    match value {
        Bson::Null | Bson::Undefined => 0,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 1,
        Bson::String(_) | Bson::Symbol(_) => 2,
        Bson::Document(_) => 3,
        Bson::Array(_) => 4,
        Bson::Binary(_) => 5,
        Bson::ObjectId(_) => 6,
        Bson::Boolean(_) => 7,
        Bson::DateTime(_) => 8,
        Bson::Timestamp(_) => 9,
        _ => 10,
    }
}

/// Total order within one type rank
fn total_compare(a: &Bson, b: &Bson) -> Ordering {
    match (a, b) {
        (Bson::ObjectId(x), Bson::ObjectId(y)) => x.bytes().cmp(&y.bytes()),
        (Bson::String(x), Bson::String(y)) => x.cmp(y),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::DateTime(x), Bson::DateTime(y)) => {
            x.timestamp_millis().cmp(&y.timestamp_millis())
        }
        (Bson::Array(x), Bson::Array(y)) => {
            for (xv, yv) in x.iter().zip(y.iter()) {
                let ordering = if type_rank(xv) == type_rank(yv) {
                    total_compare(xv, yv)
                } else {
                    type_rank(xv).cmp(&type_rank(yv))
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => match (numeric(a), numeric(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
    }
}

fn numeric(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}
