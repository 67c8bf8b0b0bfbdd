/// JSON-file backed store.
///
/// All keys live in one JSON object on disk. Writes go to a sibling
/// temporary file which is then renamed over the original, so a crash
/// mid-write leaves the previous state intact.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::KeyValueStore;
use crate::model::AqError;

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, AqError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                AqError::Store(format!("{} is not a valid state file: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(AqError::Store(format!("reading {}: {}", self.path.display(), e))),
        }
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<(), AqError> {
        let text = serde_json::to_string_pretty(values)
            .map_err(|e| AqError::Store(format!("serializing state: {}", e)))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, text)
            .map_err(|e| AqError::Store(format!("writing {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| AqError::Store(format!("replacing {}: {}", self.path.display(), e)))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&mut self, key: &str) -> Result<Option<String>, AqError> {
        Ok(self.read_all()?.remove(key))
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), AqError> {
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = JsonFileStore::new(dir.path().join("state.json"));
        assert_eq!(store.get("measurement"), Ok(None));
    }

    #[test]
    fn test_values_survive_a_new_store_instance() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");

        let mut first = JsonFileStore::new(&path);
        first.put("measurement", "{\"aqi\":42}").expect("put");
        first.put("selected_location", "{\"kind\":\"ambient\"}").expect("put");

        let mut second = JsonFileStore::new(&path);
        assert_eq!(second.get("measurement"), Ok(Some("{\"aqi\":42}".to_string())));
        assert_eq!(
            second.get("selected_location"),
            Ok(Some("{\"kind\":\"ambient\"}".to_string()))
        );
    }

    #[test]
    fn test_corrupt_file_is_a_store_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        fs::write(&path, "not json").expect("write");

        let mut store = JsonFileStore::new(&path);
        assert!(matches!(store.get("measurement"), Err(AqError::Store(_))));
    }
}
