//! Storage services and the cache-backed transaction store built on them.

pub mod cache_store;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
