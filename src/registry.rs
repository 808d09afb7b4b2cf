//! Collection descriptors and the schema registry
//!
//! A [`Descriptor`] is a plain configuration value built explicitly by the
//! caller: collection name, sortable fields, optional search fields, and the
//! observer list. Descriptors are registered into a [`Registry`] once, before
//! client construction; the registry is immutable afterwards.

use std::any::Any;
use std::collections::BTreeSet;
use std::collections::HashMap;
use std::sync::Arc;

use crate::document::Document;
use crate::events::ChangeHandler;
use crate::types::{Result, TurnstileError};

/// Plain configuration for one collection
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    /// Collection name
    pub name: String,
    /// Fields connections and scans may sort by
    pub sort_options: BTreeSet<String>,
    /// Fields mirrored to the search index, when the collection is searchable
    pub search_fields: Option<Vec<String>>,
}

impl CollectionConfig {
    /// Reject sort fields that were not declared on the descriptor
    pub(crate) fn ensure_sort_option(&self, field: &str) -> Result<()> {
        if self.sort_options.contains(field) {
            return Ok(());
        }

        Err(TurnstileError::Configuration(format!(
            "field {:?} is not a sort option of collection {:?}",
            field, self.name
        )))
    }
}

/// Descriptor for one document type: configuration plus observers
pub struct Descriptor<D: Document> {
    config: CollectionConfig,
    observers: Vec<Arc<dyn ChangeHandler<D>>>,
}

impl<D: Document> Descriptor<D> {
    /// Create a descriptor for `D` with the default sort options
    /// (`created_at`, `updated_at`)
    pub fn new() -> Self {
        let mut sort_options = BTreeSet::new();
        sort_options.insert("created_at".to_string());
        sort_options.insert("updated_at".to_string());

        Self {
            config: CollectionConfig {
                name: D::COLLECTION.to_string(),
                sort_options,
                search_fields: None,
            },
            observers: Vec::new(),
        }
    }

    /// Declare an additional sortable field
    pub fn sort_option(mut self, field: impl Into<String>) -> Self {
        self.config.sort_options.insert(field.into());
        self
    }

    /// Declare the fields mirrored to the search index
    pub fn search_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.search_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Register a change observer. Observers run in registration order.
    pub fn on_change(mut self, handler: impl ChangeHandler<D> + 'static) -> Self {
        self.observers.push(Arc::new(handler));
        self
    }

    /// Collection configuration
    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    /// Registered observers
    pub(crate) fn observers(&self) -> &[Arc<dyn ChangeHandler<D>>] {
        &self.observers
    }
}

impl<D: Document> Default for Descriptor<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Document> std::fmt::Debug for Descriptor<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Descriptor")
            .field("config", &self.config)
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Type-erased descriptor entry held by the registry
pub(crate) trait ErasedDescriptor: Send + Sync {
    fn config(&self) -> &CollectionConfig;
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<D: Document> ErasedDescriptor for Descriptor<D> {
    fn config(&self) -> &CollectionConfig {
        &self.config
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Immutable mapping from collection name to descriptor
#[derive(Default)]
pub struct Registry {
    entries: HashMap<String, Arc<dyn ErasedDescriptor>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor. Each collection name may appear once.
    pub fn register<D: Document>(&mut self, descriptor: Descriptor<D>) -> Result<()> {
        let name = descriptor.config.name.clone();
        if self.entries.contains_key(&name) {
            return Err(TurnstileError::DuplicateCollection(name));
        }

        self.entries.insert(name, Arc::new(descriptor));
        Ok(())
    }

    /// Recover the typed descriptor for `D`
    pub(crate) fn descriptor<D: Document>(&self) -> Result<Arc<Descriptor<D>>> {
        let entry = self
            .entries
            .get(D::COLLECTION)
            .ok_or_else(|| TurnstileError::UnknownCollection(D::COLLECTION.to_string()))?;

        Arc::clone(entry)
            .as_any()
            .downcast::<Descriptor<D>>()
            .map_err(|_| TurnstileError::DocumentType(D::COLLECTION.to_string()))
    }

    /// Iterate all registered configurations
    pub(crate) fn configs(&self) -> impl Iterator<Item = &CollectionConfig> {
        self.entries.values().map(|entry| entry.config())
    }
}
