//! KvStore - file-backed key-value store
//!
//! A small, process-wide key-value store in the spirit of browser
//! `localStorage`: string keys map to string values, writes overwrite
//! unconditionally, and there is no history. Each key lives in its own file
//! so a corrupted value never takes the rest of the store down with it.
//!
//! # Architecture
//!
//! ```text
//! .kvstore/
//! ├── .lock                         # advisory lock held during writes
//! ├── focusFlow_tasks_v7.json
//! └── focusFlow_gardenState_v7.json
//! ```
//!
//! # Example
//!
//! ```ignore
//! use kvstore::{KvBackend, KvStore};
//!
//! let store = KvStore::open(".kvstore")?;
//! store.set("greeting", "\"hello\"")?;
//! assert_eq!(store.get("greeting")?.as_deref(), Some("\"hello\""));
//! store.remove("greeting")?;
//! ```

pub mod cli;
pub mod config;
mod key;
mod memory;
mod store;

pub use key::{KeyError, validate_key};
pub use memory::MemoryStore;
pub use store::{EntryMeta, KvStore};

use eyre::Result;

/// File extension used for stored values
pub const VALUE_EXTENSION: &str = "json";

/// Storage backend seam
///
/// Implemented by the file-backed [`KvStore`] and the in-memory
/// [`MemoryStore`]. All operations are synchronous and last-write-wins.
pub trait KvBackend: Send + Sync {
    /// Read the raw value stored under `key`, `None` if absent
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value stored under `key`
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key` entirely; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;

    /// List all keys currently stored, sorted
    fn keys(&self) -> Result<Vec<String>>;
}
