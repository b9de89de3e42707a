#![forbid(unsafe_code)]

pub mod local_store;
pub mod repository;
pub mod sqlite;

pub use local_store::{LocalSnapshot, LocalStore};
pub use repository::{InMemoryStore, KeyValueStore, Storage, StorageError};
