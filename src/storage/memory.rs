use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{Document, DocumentStore, Fields};
use crate::error::{BackendError, StoreError, StoreResult};

/// In-process document store used by tests and `AppState::fake`.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<BTreeMap<String, BTreeMap<String, Fields>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    reads: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, collection: &str, key: &str, fields: Fields) {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), fields);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `get_all`/`get_one` calls served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn check_read(&self) -> StoreResult<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(BackendError::new("store/unavailable", "read rejected").into());
        }
        Ok(())
    }

    fn check_write(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BackendError::new("store/unavailable", "write rejected").into());
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.check_read()?;
        let guard = self.collections.read().await;
        let docs: Vec<Document> = guard
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(key, fields)| Document {
                        key: key.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(docs)
    }

    async fn get_one(&self, collection: &str, key: &str) -> StoreResult<Option<Fields>> {
        self.check_read()?;
        let guard = self.collections.read().await;
        Ok(guard.get(collection).and_then(|docs| docs.get(key)).cloned())
    }

    async fn set_one(&self, collection: &str, key: &str, fields: Fields) -> StoreResult<()> {
        self.check_write()?;
        self.seed(collection, key, fields).await;
        Ok(())
    }

    async fn update_fields(&self, collection: &str, key: &str, fields: Fields) -> StoreResult<()> {
        self.check_write()?;
        let mut guard = self.collections.write().await;
        let doc = guard
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(key))
            .ok_or_else(|| StoreError::not_found(collection, key))?;
        doc.extend(fields);
        Ok(())
    }

    async fn union_append(
        &self,
        collection: &str,
        key: &str,
        field: &str,
        value: Value,
    ) -> StoreResult<()> {
        self.check_write()?;
        let mut guard = self.collections.write().await;
        let doc = guard
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(key))
            .ok_or_else(|| StoreError::not_found(collection, key))?;

        match doc.get_mut(field) {
            Some(Value::Array(items)) => {
                if !items.contains(&value) {
                    items.push(value);
                }
            }
            _ => {
                doc.insert(field.to_string(), Value::Array(vec![value]));
            }
        }
        Ok(())
    }

    async fn insert(&self, collection: &str, fields: Fields) -> StoreResult<String> {
        self.check_write()?;
        let key = Uuid::new_v4().simple().to_string();
        self.seed(collection, &key, fields).await;
        debug!(collection, key = %key, "document inserted");
        Ok(key)
    }
}

#[cfg(test)]
mod memory_store_tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Fields {
        v.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn update_merges_and_requires_existing_document() {
        let store = MemoryDocumentStore::new();
        let err = store
            .update_fields("users", "u1", obj(json!({ "skills": [] })))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));

        store
            .seed("users", "u1", obj(json!({ "name": "Ann", "skills": ["Go"] })))
            .await;
        store
            .update_fields("users", "u1", obj(json!({ "skills": ["Rust"] })))
            .await
            .unwrap();
        let doc = store.get_one("users", "u1").await.unwrap().unwrap();
        assert_eq!(doc.get("name"), Some(&json!("Ann")));
        assert_eq!(doc.get("skills"), Some(&json!(["Rust"])));
    }

    #[tokio::test]
    async fn union_append_is_idempotent() {
        let store = MemoryDocumentStore::new();
        store.seed("jobs", "j1", obj(json!({ "candidates": [] }))).await;
        for _ in 0..3 {
            store
                .union_append("jobs", "j1", "candidates", json!("u1"))
                .await
                .unwrap();
        }
        let doc = store.get_one("jobs", "j1").await.unwrap().unwrap();
        assert_eq!(doc.get("candidates"), Some(&json!(["u1"])));
    }

    #[tokio::test]
    async fn injected_failures_leave_data_untouched() {
        let store = MemoryDocumentStore::new();
        store.seed("users", "u1", obj(json!({ "skills": ["Go"] }))).await;
        store.set_fail_writes(true);
        assert!(store
            .set_one("users", "u1", obj(json!({ "skills": [] })))
            .await
            .is_err());
        store.set_fail_writes(false);
        let doc = store.get_one("users", "u1").await.unwrap().unwrap();
        assert_eq!(doc.get("skills"), Some(&json!(["Go"])));
        assert_eq!(store.read_count(), 1);
    }

    #[tokio::test]
    async fn insert_generates_distinct_keys() {
        let store = MemoryDocumentStore::new();
        let a = store.insert("jobs", Fields::new()).await.unwrap();
        let b = store.insert("jobs", Fields::new()).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.get_all("jobs").await.unwrap().len(), 2);
    }
}
