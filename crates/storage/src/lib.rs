//! Key/value storage the shipment type projection lives in.

pub mod in_memory;
#[cfg(feature = "redis")]
pub mod redis_store;
pub mod store;

pub use in_memory::InMemoryKeyValueStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisKeyValueStore;
pub use store::{KeyValueStore, StorageError, StoredValue};
