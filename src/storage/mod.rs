//! Document-store collaborator.
//!
//! Collections hold JSON objects keyed by string. Writes are last-write-wins;
//! `union_append` is the only primitive that is idempotent under retries.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::{StoreError, StoreResult};

pub mod memory;
pub mod postgres;

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

pub const USERS: &str = "users";
pub const JOBS: &str = "jobs";
/// Reserved key inside `jobs` holding the skill/location facet aggregate.
pub const FACETS_KEY: &str = "data";

pub type Fields = serde_json::Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub key: String,
    pub fields: Fields,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_all(&self, collection: &str) -> StoreResult<Vec<Document>>;
    async fn get_one(&self, collection: &str, key: &str) -> StoreResult<Option<Fields>>;
    /// Full replace; creates the document when missing.
    async fn set_one(&self, collection: &str, key: &str, fields: Fields) -> StoreResult<()>;
    /// Merges `fields` into an existing document. Fails with `NotFound` when absent.
    async fn update_fields(&self, collection: &str, key: &str, fields: Fields) -> StoreResult<()>;
    /// Appends `value` to the array `field` unless it is already present.
    async fn union_append(
        &self,
        collection: &str,
        key: &str,
        field: &str,
        value: Value,
    ) -> StoreResult<()>;
    /// Stores a new document under a generated key and returns that key.
    async fn insert(&self, collection: &str, fields: Fields) -> StoreResult<String>;
}

pub fn encode<T: Serialize>(value: &T) -> StoreResult<Fields> {
    let not_object = || StoreError::Validation("document must serialize to an object".into());
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(not_object()),
        Err(_) => Err(not_object()),
    }
}

pub fn decode<T: DeserializeOwned>(collection: &str, key: &str, fields: Fields) -> StoreResult<T> {
    serde_json::from_value(Value::Object(fields)).map_err(|source| StoreError::Decode {
        collection: collection.to_string(),
        key: key.to_string(),
        source,
    })
}
