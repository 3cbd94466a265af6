//! The user's persisted card collection

mod storage;
mod store;

pub use storage::{FileStore, KeyValueStore, MemoryStore, SqliteStore};
pub use store::{CollectionStore, STORAGE_KEY};
