//! Synchronization queue adapters beyond the in-memory one.

#[cfg(feature = "redis")]
pub mod redis_queue;

#[cfg(feature = "redis")]
pub use redis_queue::RedisSyncQueue;
