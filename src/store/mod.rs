/// Persisted key-value state.
///
/// The engine persists exactly two keys (the cached measurement and the
/// selected location) through the `KeyValueStore` trait, so the backing
/// store can be swapped without touching the cache logic.
///
/// Submodules:
/// - `memory`: process-local map, for tests and one-shot runs.
/// - `file`: a single JSON file, survives restarts.
/// - `pg`: a `kv_state` table in PostgreSQL.

use crate::model::AqError;

pub mod file;
pub mod memory;
pub mod pg;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use pg::PostgresStore;

/// String-keyed, string-valued persistent store. Values are JSON documents.
pub trait KeyValueStore {
    /// Returns the stored value, or `None` if the key was never written.
    fn get(&mut self, key: &str) -> Result<Option<String>, AqError>;

    /// Overwrites the value for `key`.
    fn put(&mut self, key: &str, value: &str) -> Result<(), AqError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&mut self, key: &str) -> Result<Option<String>, AqError> {
        (**self).get(key)
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), AqError> {
        (**self).put(key, value)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn get(&mut self, key: &str) -> Result<Option<String>, AqError> {
        (**self).get(key)
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), AqError> {
        (**self).put(key, value)
    }
}
