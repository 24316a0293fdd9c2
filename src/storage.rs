use crate::error::{DrillError, Result};
use directories::ProjectDirs;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "math_drill";
const ORG_NAME: &str = "practice";

/// Key-value persistence for JSON records.
pub trait Store {
    fn load(&self, key: &str) -> Result<Option<Value>>;
    fn save(&mut self, key: &str, value: &Value) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a record, e.g. progress written by an earlier run.
    pub fn with_record(mut self, key: &str, value: Value) -> Self {
        self.records.insert(key.to_string(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.records.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Store for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.records.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &Value) -> Result<()> {
        self.records.insert(key.to_string(), value.clone());
        Ok(())
    }
}

/// One `<key>.json` file per record inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The per-user data directory for this application.
    pub fn default_location() -> Result<Self> {
        ProjectDirs::from("com", ORG_NAME, APP_NAME)
            .map(|dirs| Self::new(dirs.data_dir()))
            .ok_or(DrillError::NoDataDir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Store for FileStore {
    fn load(&self, key: &str) -> Result<Option<Value>> {
        let file_path = self.path_for(key);
        if !file_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&file_path)?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| DrillError::MalformedPersistedState {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    fn save(&mut self, key: &str, value: &Value) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(value)?;
        fs::write(self.path_for(key), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert!(store.load("missing").unwrap().is_none());

        store.save("progress", &json!({"currentLevel": 2})).unwrap();
        assert_eq!(
            store.load("progress").unwrap(),
            Some(json!({"currentLevel": 2}))
        );
    }

    #[test]
    fn test_file_store_creates_directory_on_save() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("nested").join("data"));

        assert!(store.load("history").unwrap().is_none());
        store.save("history", &json!([1, 2, 3])).unwrap();

        assert!(store.dir().join("history.json").exists());
        assert_eq!(store.load("history").unwrap(), Some(json!([1, 2, 3])));
    }

    #[test]
    fn test_file_store_reports_garbage_as_malformed() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("progress.json"), "{not json").unwrap();
        let store = FileStore::new(dir.path());

        match store.load("progress") {
            Err(DrillError::MalformedPersistedState { key, .. }) => assert_eq!(key, "progress"),
            other => panic!("expected malformed state, got {:?}", other),
        }
    }
}
