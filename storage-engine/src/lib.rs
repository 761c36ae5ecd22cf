pub mod document;
pub mod factory;
pub mod model;
pub mod moka_cache;
pub mod redis_store;
pub mod sled_kv;

pub use document::{Collection, Document, DocumentBackend, SledDocumentStore};
pub use factory::{connect_cache, connect_durable};
pub use model::{Model, ModelBackend, ModelStore, RecordModel};
pub use moka_cache::MokaCache;
pub use redis_store::{RedisCache, RedisKeyValueStore};
pub use sled_kv::SledKeyValueStore;
