pub mod memory;

pub use memory::MemoryCollection;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CollectionError;

/// A session record as stored: a flat map whose field names come from the
/// configured [`crate::config::Columns`] mapping.
pub type Document = serde_json::Map<String, Value>;

/// The predicates the session store needs a backend to evaluate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// String field equals the given value.
    Eq { field: String, value: String },
    /// Integer field is strictly less than the cutoff.
    Lt { field: String, cutoff: i64 },
}

impl Filter {
    pub fn eq(field: &str, value: &str) -> Self {
        Filter::Eq {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn lt(field: &str, cutoff: i64) -> Self {
        Filter::Lt {
            field: field.to_string(),
            cutoff,
        }
    }

    /// Evaluate the predicate against a document. Missing or mistyped
    /// fields never match.
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::Eq { field, value } => {
                doc.get(field).and_then(Value::as_str) == Some(value.as_str())
            }
            Filter::Lt { field, cutoff } => doc
                .get(field)
                .and_then(Value::as_i64)
                .is_some_and(|v| v < *cutoff),
        }
    }
}

/// Find/insert/replace/delete over a document collection keyed by an
/// indexed identifier field.
///
/// Identifier uniqueness is the backend's job (a unique index), not the
/// caller's: concurrent store activations may race to create records.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, CollectionError>;

    /// Insert a new document. Fails with [`CollectionError::DuplicateKey`]
    /// if the identifier field value already exists.
    async fn insert_one(&self, doc: Document) -> Result<(), CollectionError>;

    /// Replace the first document matching `filter` with `doc` in one
    /// operation. Returns the number of documents matched (0 or 1).
    async fn replace_one(&self, filter: &Filter, doc: Document) -> Result<u64, CollectionError>;

    /// Delete the first document matching `filter`. Returns the number of
    /// documents deleted (0 or 1).
    async fn delete_one(&self, filter: &Filter) -> Result<u64, CollectionError>;

    /// Delete every document matching `filter` in one bulk operation.
    /// Returns the number of documents deleted.
    async fn delete_many(&self, filter: &Filter) -> Result<u64, CollectionError>;
}

#[async_trait]
impl<T: DocumentCollection + ?Sized> DocumentCollection for std::sync::Arc<T> {
    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, CollectionError> {
        (**self).find_one(filter).await
    }

    async fn insert_one(&self, doc: Document) -> Result<(), CollectionError> {
        (**self).insert_one(doc).await
    }

    async fn replace_one(&self, filter: &Filter, doc: Document) -> Result<u64, CollectionError> {
        (**self).replace_one(filter, doc).await
    }

    async fn delete_one(&self, filter: &Filter) -> Result<u64, CollectionError> {
        (**self).delete_one(filter).await
    }

    async fn delete_many(&self, filter: &Filter) -> Result<u64, CollectionError> {
        (**self).delete_many(filter).await
    }
}
