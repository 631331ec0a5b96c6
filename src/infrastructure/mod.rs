//! Adapters implementing the domain ports.

pub mod dummy_gateway;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
