//! Embedded document store on sled.
//!
//! A collection keeps JSON object documents in insertion order (keys come from
//! `Db::generate_id`, stored big-endian). Each document gets a string `_id`.
//! Declared fields get a secondary index tree mapping the field value to the
//! most recently inserted document, so `find_one` on an indexed field answers
//! with the latest document for that value. Index entries only ever move to a
//! higher slot, so racing inserts cannot leave an older document indexed.
//! Each index also remembers the last slot it has scanned; opening a collection
//! catches the index up on documents inserted by handles that did not carry it.
//! Unindexed lookups scan newest first.

use crate::sled_kv::{open_db, sled_error};
use async_trait::async_trait;
use serde_json::{Map, Value};
use shared::{StoreError, StoreResult};
use std::ops::Bound;
use std::path::Path;
use tandem::{DurableBackend, Record};
use tracing::{debug, info};

pub type Document = Map<String, Value>;

pub const ID_FIELD: &str = "_id";

/// Separates collection and field in index tree names; reserved in collection names
const INDEX_SEPARATOR: char = '#';
/// Index trees store entries under `s`/`j` prefixed keys, so this never collides
const WATERMARK_KEY: &[u8] = b"#scanned-through";

/// Handle to a sled database holding document collections
#[derive(Clone)]
pub struct SledDocumentStore {
    db: sled::Db,
}

impl SledDocumentStore {
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = open_db(path.as_ref())?;
        info!("Opened sled document store at {}", path.as_ref().display());
        Ok(Self { db })
    }

    /// Open (or create) a collection, building any missing field indexes
    pub fn collection(&self, name: &str, indexed_fields: &[&str]) -> StoreResult<Collection> {
        if name.is_empty() || name.contains(INDEX_SEPARATOR) {
            return Err(StoreError::Operation(format!(
                "invalid collection name '{}': must be non-empty and not contain '{}'",
                name, INDEX_SEPARATOR
            )));
        }

        let documents = self.db.open_tree(name).map_err(sled_error)?;

        let mut indexes = Vec::with_capacity(indexed_fields.len());
        for field in indexed_fields {
            let tree = self
                .db
                .open_tree(format!("{}{}{}", name, INDEX_SEPARATOR, field))
                .map_err(sled_error)?;
            indexes.push(FieldIndex {
                field: field.to_string(),
                tree,
            });
        }

        let collection = Collection {
            db: self.db.clone(),
            name: name.to_string(),
            documents,
            indexes,
        };
        collection.catch_up_indexes()?;
        Ok(collection)
    }

    pub fn flush(&self) -> StoreResult<()> {
        self.db.flush().map_err(sled_error)?;
        Ok(())
    }

    pub fn size_on_disk(&self) -> StoreResult<u64> {
        self.db.size_on_disk().map_err(sled_error)
    }
}

#[derive(Clone)]
struct FieldIndex {
    field: String,
    tree: sled::Tree,
}

#[derive(Clone)]
pub struct Collection {
    db: sled::Db,
    name: String,
    documents: sled::Tree,
    indexes: Vec<FieldIndex>,
}

impl Collection {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Insert a document and return its `_id`. Existing documents are never replaced.
    pub fn insert_one(&self, mut document: Document) -> StoreResult<String> {
        let id = match document.get(ID_FIELD) {
            Some(Value::String(id)) => id.clone(),
            Some(other) => {
                return Err(StoreError::Codec(format!(
                    "{} must be a string, got {}",
                    ID_FIELD, other
                )));
            }
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                document.insert(ID_FIELD.to_string(), Value::String(id.clone()));
                id
            }
        };

        let slot = self.db.generate_id().map_err(sled_error)?.to_be_bytes();
        let bytes = serde_json::to_vec(&document)?;

        // Document first, then indexes, so an index never points at a missing slot
        self.documents
            .insert(&slot[..], bytes)
            .map_err(sled_error)?;

        for index in &self.indexes {
            if let Some(value) = document.get(&index.field) {
                advance(&index.tree, index_key(value), &slot)?;
            }
        }

        debug!("Inserted document {} into {}", id, self.name);
        Ok(id)
    }

    /// Find the most recent document whose fields equal every entry of `filter`
    pub fn find_one(&self, filter: &Document) -> StoreResult<Option<Document>> {
        let indexed = self
            .indexes
            .iter()
            .find_map(|index| filter.get(&index.field).map(|value| (index, value)));

        if let Some((index, value)) = indexed {
            let Some(slot) = index.tree.get(index_key(value)).map_err(sled_error)? else {
                return Ok(None);
            };
            let Some(bytes) = self.documents.get(&slot).map_err(sled_error)? else {
                return Ok(None);
            };
            let document = decode(&bytes)?;
            return Ok(matches(&document, filter).then_some(document));
        }

        for item in self.documents.iter().rev() {
            let (_, bytes) = item.map_err(sled_error)?;
            let document = decode(&bytes)?;
            if matches(&document, filter) {
                return Ok(Some(document));
            }
        }

        Ok(None)
    }

    /// Index every document past each index's watermark
    fn catch_up_indexes(&self) -> StoreResult<()> {
        for index in &self.indexes {
            let pending = match index.tree.get(WATERMARK_KEY).map_err(sled_error)? {
                Some(scanned) => self
                    .documents
                    .range((Bound::Excluded(scanned), Bound::Unbounded)),
                None => self.documents.iter(),
            };

            let mut last = None;
            let mut indexed = 0usize;
            for item in pending {
                let (slot, bytes) = item.map_err(sled_error)?;
                let document = decode(&bytes)?;
                if let Some(value) = document.get(&index.field) {
                    advance(&index.tree, index_key(value), &slot)?;
                    indexed += 1;
                }
                last = Some(slot);
            }

            if let Some(last) = last {
                index
                    .tree
                    .insert(WATERMARK_KEY, last)
                    .map_err(sled_error)?;
                info!(
                    "Caught up index {}.{} with {} documents",
                    self.name, index.field, indexed
                );
            }
        }

        Ok(())
    }
}

/// Point `key` at `slot` unless it already points at a newer slot.
/// Slots are big-endian, so byte order is insertion order.
fn advance(tree: &sled::Tree, key: Vec<u8>, slot: &[u8]) -> StoreResult<()> {
    tree.fetch_and_update(key, |current| match current {
        Some(current) if current >= slot => Some(current.to_vec()),
        _ => Some(slot.to_vec()),
    })
    .map_err(sled_error)?;
    Ok(())
}

fn decode(bytes: &[u8]) -> StoreResult<Document> {
    Ok(serde_json::from_slice(bytes)?)
}

fn matches(document: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(field, expected)| document.get(field) == Some(expected))
}

/// Strings index by their raw bytes, anything else by its JSON text
fn index_key(value: &Value) -> Vec<u8> {
    match value {
        Value::String(s) => {
            let mut key = Vec::with_capacity(s.len() + 1);
            key.push(b's');
            key.extend_from_slice(s.as_bytes());
            key
        }
        other => {
            let mut key = vec![b'j'];
            key.extend_from_slice(other.to_string().as_bytes());
            key
        }
    }
}

/// Durable tier backed by a document collection.
/// Every `put` inserts a new `{key, value, created_at}` document.
#[derive(Clone)]
pub struct DocumentBackend {
    store: SledDocumentStore,
    collection: Collection,
}

impl DocumentBackend {
    /// Field of [`Record`] the collection is indexed on
    pub const KEY_FIELD: &str = "key";

    pub fn open(path: impl AsRef<Path>, collection: &str) -> StoreResult<Self> {
        let store = SledDocumentStore::open(path)?;
        let collection = store.collection(collection, &[Self::KEY_FIELD])?;
        Ok(Self { store, collection })
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }
}

#[async_trait]
impl DurableBackend for DocumentBackend {
    fn name(&self) -> &'static str {
        "sled-document"
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut filter = Document::new();
        filter.insert(Self::KEY_FIELD.to_string(), Value::String(key.to_string()));

        match self.collection.find_one(&filter)? {
            Some(document) => {
                let record: Record = serde_json::from_value(Value::Object(document))?;
                Ok(Some(record.value))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        let Value::Object(mut document) = serde_json::to_value(Record::new(key, value))? else {
            return Err(StoreError::Codec(format!(
                "record for '{}' did not serialize to a document",
                key
            )));
        };
        document.insert(
            "created_at".to_string(),
            Value::String(chrono::Utc::now().to_rfc3339()),
        );

        self.collection.insert_one(document)?;
        self.store.flush()
    }

    async fn ping(&self) -> StoreResult<()> {
        self.store.size_on_disk().map(|_| ())
    }

    async fn shutdown(&self) -> StoreResult<()> {
        self.store.flush()
    }
}

impl std::fmt::Debug for DocumentBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentBackend")
            .field("collection", &self.collection.name)
            .field("documents", &self.collection.len())
            .finish()
    }
}
