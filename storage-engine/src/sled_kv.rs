use async_trait::async_trait;
use shared::{StoreError, StoreResult};
use std::path::Path;
use tandem::DurableBackend;
use tracing::info;

const RECORDS_TREE: &str = "records";

pub(crate) fn sled_error(err: sled::Error) -> StoreError {
    match err {
        sled::Error::Io(e) => StoreError::Unavailable(e.to_string()),
        other => StoreError::Operation(other.to_string()),
    }
}

/// Open a sled database, creating the parent directory if needed
pub(crate) fn open_db(path: &Path) -> StoreResult<sled::Db> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| StoreError::Unavailable(format!("Failed to create directory: {}", e)))?;
    }

    sled::open(path).map_err(sled_error)
}

/// Embedded key-value durable store: one sled tree, value stored verbatim under its key
#[derive(Clone)]
pub struct SledKeyValueStore {
    db: sled::Db,
    records: sled::Tree,
}

impl SledKeyValueStore {
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = open_db(path.as_ref())?;
        let records = db.open_tree(RECORDS_TREE).map_err(sled_error)?;

        info!("Opened sled key-value store at {}", path.as_ref().display());
        Ok(Self { db, records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl DurableBackend for SledKeyValueStore {
    fn name(&self) -> &'static str {
        "sled-kv"
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        match self.records.get(key.as_bytes()).map_err(sled_error)? {
            Some(bytes) => String::from_utf8(bytes.to_vec())
                .map(Some)
                .map_err(|e| StoreError::Codec(format!("Stored value is not UTF-8: {}", e))),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        self.records
            .insert(key.as_bytes(), value.as_bytes())
            .map_err(sled_error)?;

        self.records.flush().map_err(sled_error)?;
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.db.size_on_disk().map_err(sled_error)?;
        Ok(())
    }

    async fn shutdown(&self) -> StoreResult<()> {
        self.db.flush().map_err(sled_error)?;
        Ok(())
    }
}

impl std::fmt::Debug for SledKeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledKeyValueStore")
            .field("records", &self.records.len())
            .finish()
    }
}
