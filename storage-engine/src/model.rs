//! Typed model mapping over the document store.
//!
//! A [`Model`] names its collection and key field; [`ModelStore`] converts
//! between the typed value and stored documents with serde, so callers never
//! touch raw JSON.

use crate::document::{Collection, Document, SledDocumentStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{StoreError, StoreResult};
use std::marker::PhantomData;
use std::path::Path;
use tandem::DurableBackend;

pub trait Model: Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: &'static str;
    const KEY_FIELD: &'static str;

    fn from_record(key: &str, value: &str) -> Self;

    fn value(&self) -> &str;
}

/// Record as stored by the model-mapped durable tier
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordModel {
    pub key: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model for RecordModel {
    const COLLECTION: &'static str = "record_models";
    const KEY_FIELD: &'static str = "key";

    fn from_record(key: &str, value: &str) -> Self {
        let now = Utc::now();
        Self {
            key: key.to_string(),
            value: value.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn value(&self) -> &str {
        &self.value
    }
}

pub struct ModelStore<M: Model> {
    collection: Collection,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Clone for ModelStore<M> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            _model: PhantomData,
        }
    }
}

impl<M: Model> ModelStore<M> {
    pub fn new(store: &SledDocumentStore) -> StoreResult<Self> {
        Ok(Self {
            collection: store.collection(M::COLLECTION, &[M::KEY_FIELD])?,
            _model: PhantomData,
        })
    }

    pub fn find_by_key(&self, key: &str) -> StoreResult<Option<M>> {
        let mut filter = Document::new();
        filter.insert(M::KEY_FIELD.to_string(), Value::String(key.to_string()));

        self.collection
            .find_one(&filter)?
            .map(|document| serde_json::from_value(Value::Object(document)))
            .transpose()
            .map_err(StoreError::from)
    }

    pub fn create(&self, model: &M) -> StoreResult<String> {
        match serde_json::to_value(model)? {
            Value::Object(document) => self.collection.insert_one(document),
            other => Err(StoreError::Codec(format!(
                "model for {} serialized to non-object {}",
                M::COLLECTION,
                other
            ))),
        }
    }

    pub fn count(&self) -> usize {
        self.collection.len()
    }
}

/// Durable tier storing each write as a new typed model document
pub struct ModelBackend<M: Model = RecordModel> {
    store: SledDocumentStore,
    models: ModelStore<M>,
}

impl<M: Model> ModelBackend<M> {
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let store = SledDocumentStore::open(path)?;
        let models = ModelStore::new(&store)?;
        Ok(Self { store, models })
    }

    pub fn models(&self) -> &ModelStore<M> {
        &self.models
    }
}

#[async_trait]
impl<M: Model> DurableBackend for ModelBackend<M> {
    fn name(&self) -> &'static str {
        "sled-model"
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self
            .models
            .find_by_key(key)?
            .map(|model| model.value().to_string()))
    }

    async fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        self.models.create(&M::from_record(key, value))?;
        self.store.flush()
    }

    async fn ping(&self) -> StoreResult<()> {
        self.store.size_on_disk().map(|_| ())
    }

    async fn shutdown(&self) -> StoreResult<()> {
        self.store.flush()
    }
}

impl<M: Model> std::fmt::Debug for ModelBackend<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBackend")
            .field("collection", &M::COLLECTION)
            .field("documents", &self.models.count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    struct Session {
        session_id: String,
        state: String,
    }

    impl Model for Session {
        const COLLECTION: &'static str = "sessions";
        const KEY_FIELD: &'static str = "session_id";

        fn from_record(key: &str, value: &str) -> Self {
            Self {
                session_id: key.to_string(),
                state: value.to_string(),
            }
        }

        fn value(&self) -> &str {
            &self.state
        }
    }

    #[test]
    fn test_model_store_create_and_find() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SledDocumentStore::open(temp_dir.path().join("models.sled")).unwrap();
        let records: ModelStore<RecordModel> = ModelStore::new(&store).unwrap();

        let model = RecordModel::from_record("session:42", "active");
        records.create(&model).unwrap();

        let found = records.find_by_key("session:42").unwrap().unwrap();
        assert_eq!(found, model);
        assert!(records.find_by_key("session:43").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_model_backend_uses_custom_key_field() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend: ModelBackend<Session> =
            ModelBackend::open(temp_dir.path().join("models.sled")).unwrap();

        backend.put("abc", "active").await.unwrap();
        backend.put("abc", "closed").await.unwrap();

        assert_eq!(backend.get("abc").await.unwrap().as_deref(), Some("closed"));
        assert_eq!(backend.models().count(), 2);
    }

    #[tokio::test]
    async fn test_record_model_backend_round_trip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend: ModelBackend = ModelBackend::open(temp_dir.path().join("models.sled")).unwrap();

        assert!(backend.get("unknown-key").await.unwrap().is_none());
        backend.put("k", "v").await.unwrap();
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("v"));
        assert!(backend.ping().await.is_ok());
    }
}
