use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{Document, DocumentCollection, Filter};
use crate::error::CollectionError;

/// In-memory document collection with a unique index on one field.
///
/// The reference backend: tests run against it, and single-process hosts
/// can use it directly.
pub struct MemoryCollection {
    unique_field: String,
    docs: RwLock<Vec<Document>>,
}

impl MemoryCollection {
    /// `unique_field` is the identifier column being indexed; inserts and
    /// replaces that would duplicate a value in it are rejected.
    pub fn new(unique_field: impl Into<String>) -> Self {
        Self {
            unique_field: unique_field.into(),
            docs: RwLock::new(Vec::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }

    fn key_of<'d>(&self, doc: &'d Document) -> Option<&'d str> {
        doc.get(&self.unique_field).and_then(Value::as_str)
    }
}

#[async_trait]
impl DocumentCollection for MemoryCollection {
    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, CollectionError> {
        let docs = self.docs.read().await;
        Ok(docs.iter().find(|d| filter.matches(d)).cloned())
    }

    async fn insert_one(&self, doc: Document) -> Result<(), CollectionError> {
        let mut docs = self.docs.write().await;
        if let Some(key) = self.key_of(&doc) {
            if docs.iter().any(|d| self.key_of(d) == Some(key)) {
                return Err(CollectionError::DuplicateKey(self.unique_field.clone()));
            }
        }
        docs.push(doc);
        Ok(())
    }

    async fn replace_one(&self, filter: &Filter, doc: Document) -> Result<u64, CollectionError> {
        let mut docs = self.docs.write().await;
        let Some(index) = docs.iter().position(|d| filter.matches(d)) else {
            return Ok(0);
        };
        if let Some(key) = self.key_of(&doc) {
            let clash = docs
                .iter()
                .enumerate()
                .any(|(i, d)| i != index && self.key_of(d) == Some(key));
            if clash {
                return Err(CollectionError::DuplicateKey(self.unique_field.clone()));
            }
        }
        docs[index] = doc;
        Ok(1)
    }

    async fn delete_one(&self, filter: &Filter) -> Result<u64, CollectionError> {
        let mut docs = self.docs.write().await;
        match docs.iter().position(|d| filter.matches(d)) {
            Some(index) => {
                docs.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_many(&self, filter: &Filter) -> Result<u64, CollectionError> {
        let mut docs = self.docs.write().await;
        let before = docs.len();
        docs.retain(|d| !filter.matches(d));
        Ok((before - docs.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, last_active: i64) -> Document {
        let mut doc = Document::new();
        doc.insert("session_id".to_string(), json!(id));
        doc.insert("last_active".to_string(), json!(last_active));
        doc
    }

    #[tokio::test]
    async fn insert_enforces_unique_index() {
        let collection = MemoryCollection::new("session_id");
        collection.insert_one(doc("a", 1)).await.unwrap();

        let err = collection.insert_one(doc("a", 2)).await.unwrap_err();
        assert!(matches!(err, CollectionError::DuplicateKey(_)));
        assert_eq!(collection.len().await, 1);
    }

    #[tokio::test]
    async fn replace_can_change_the_identifier() {
        let collection = MemoryCollection::new("session_id");
        collection.insert_one(doc("a", 1)).await.unwrap();

        let matched = collection
            .replace_one(&Filter::eq("session_id", "a"), doc("b", 2))
            .await
            .unwrap();
        assert_eq!(matched, 1);
        assert_eq!(collection.len().await, 1);
        assert!(collection
            .find_one(&Filter::eq("session_id", "a"))
            .await
            .unwrap()
            .is_none());
        assert!(collection
            .find_one(&Filter::eq("session_id", "b"))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn replace_rejects_identifier_clash() {
        let collection = MemoryCollection::new("session_id");
        collection.insert_one(doc("a", 1)).await.unwrap();
        collection.insert_one(doc("b", 2)).await.unwrap();

        let err = collection
            .replace_one(&Filter::eq("session_id", "a"), doc("b", 3))
            .await
            .unwrap_err();
        assert!(matches!(err, CollectionError::DuplicateKey(_)));
    }

    #[tokio::test]
    async fn replace_of_missing_document_matches_nothing() {
        let collection = MemoryCollection::new("session_id");
        let matched = collection
            .replace_one(&Filter::eq("session_id", "ghost"), doc("ghost", 1))
            .await
            .unwrap();
        assert_eq!(matched, 0);
        assert!(collection.is_empty().await);
    }

    #[tokio::test]
    async fn delete_one_reports_zero_for_missing() {
        let collection = MemoryCollection::new("session_id");
        collection.insert_one(doc("a", 1)).await.unwrap();

        assert_eq!(
            collection
                .delete_one(&Filter::eq("session_id", "a"))
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            collection
                .delete_one(&Filter::eq("session_id", "a"))
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn delete_many_removes_all_matches() {
        let collection = MemoryCollection::new("session_id");
        collection.insert_one(doc("a", 10)).await.unwrap();
        collection.insert_one(doc("b", 20)).await.unwrap();
        collection.insert_one(doc("c", 30)).await.unwrap();

        let deleted = collection
            .delete_many(&Filter::lt("last_active", 25))
            .await
            .unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(collection.len().await, 1);
        assert!(collection
            .find_one(&Filter::eq("session_id", "c"))
            .await
            .unwrap()
            .is_some());
    }
}
