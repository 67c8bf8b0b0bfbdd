use std::collections::HashMap;

use super::KeyValueStore;
use crate::model::AqError;

/// In-memory store. Contents are lost when the process exits.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&mut self, key: &str) -> Result<Option<String>, AqError> {
        Ok(self.values.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), AqError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
