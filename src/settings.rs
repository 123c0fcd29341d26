use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::{fs, path::PathBuf, sync::RwLock};

/// Fixed keys used in the local store.
pub mod keys {
    pub const USER: &str = "aarogya_user";
}

/// Small persistent key/value store backed by one JSON file.
///
/// Every write is flushed to disk immediately and only reaches memory once
/// the flush succeeded. A missing or unreadable file starts the store empty.
pub struct LocalStore {
    path: PathBuf,
    data: RwLock<Map<String, Value>>,
}

impl LocalStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read local store from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            Map::new()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn get_raw(&self, key: &str) -> Option<Value> {
        self.data.read().unwrap().get(key).cloned()
    }

    /// Typed read. A value that no longer matches `T` reads as `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_raw(key)
            .and_then(|value| serde_json::from_value(value).ok())
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)
            .with_context(|| format!("Failed to serialize value for key {key}"))?;
        let mut guard = self.data.write().unwrap();
        let mut next = guard.clone();
        next.insert(key.to_string(), value);
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        if !guard.contains_key(key) {
            return Ok(());
        }
        let mut next = guard.clone();
        next.remove(key);
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }

    fn persist(&self, data: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create store directory {}", parent.display())
                })?;
            }
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write local store to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = LocalStore::new(path.clone()).unwrap();
        store.set("aarogya_language", &"hi").unwrap();
        drop(store);

        let reopened = LocalStore::new(path).unwrap();
        assert_eq!(reopened.get::<String>("aarogya_language").as_deref(), Some("hi"));
    }

    #[test]
    fn remove_deletes_key() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("store.json")).unwrap();
        store.set("aarogya_theme", &"dark").unwrap();
        store.remove("aarogya_theme").unwrap();
        assert!(store.get_raw("aarogya_theme").is_none());
    }

    #[test]
    fn failed_write_leaves_memory_unchanged() {
        let dir = tempdir().unwrap();
        let parent = dir.path().join("nested");
        let store = LocalStore::new(parent.join("store.json")).unwrap();
        store.set("aarogya_theme", &"light").unwrap();

        fs::remove_dir_all(&parent).unwrap();
        fs::write(&parent, "not a directory").unwrap();

        assert!(store.set("aarogya_theme", &"dark").is_err());
        assert_eq!(store.get::<String>("aarogya_theme").as_deref(), Some("light"));
        assert!(store.remove("aarogya_theme").is_err());
        assert!(store.get_raw("aarogya_theme").is_some());
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{not json").unwrap();

        let store = LocalStore::new(path).unwrap();
        assert!(store.get_raw(keys::USER).is_none());
    }
}
