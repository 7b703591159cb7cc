//! Durable key/value text storage for client state.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::StorageError;

pub trait Storage: Send {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;
    /// Replaces the whole value under `key`.
    fn store(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One `<key>.json` file per key inside `dir`.
#[derive(Clone, Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Staged through a sibling temp file and renamed over the target:
    /// readers see the old value or the new one, never a partial write.
    fn store(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        let target = self.path(key);
        let staging = self.dir.join(format!(".{key}.json.tmp"));
        std::fs::write(&staging, value)?;
        std::fs::rename(&staging, &target)?;
        log::debug!("stored {} bytes to {}", value.len(), target.display());
        Ok(())
    }
}

/// In-process storage. Clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get(key))
    }

    fn store(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.write().insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_clones_share_values() {
        let mut writer = MemoryStorage::new();
        let reader = writer.clone();
        writer.store("graphs", "[]").unwrap();
        assert_eq!(reader.load("graphs").unwrap().as_deref(), Some("[]"));
        assert_eq!(reader.load("networkGraphs").unwrap(), None);
    }

    #[test]
    fn files_are_created_on_first_store() {
        let root = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(root.path().join("nested"));
        assert_eq!(storage.load("graphs").unwrap(), None);
        storage.store("graphs", "[1]").unwrap();
        storage.store("graphs", "[1,2]").unwrap();
        assert_eq!(storage.load("graphs").unwrap().as_deref(), Some("[1,2]"));
        assert!(storage.dir().join("graphs.json").exists());
        assert!(!storage.dir().join(".graphs.json.tmp").exists());
    }
}
