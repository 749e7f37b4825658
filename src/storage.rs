use std::{
    collections::HashMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Mutex,
};
use thiserror::Error;
use tracing::debug;

/// Named slots of the durable key-value store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Categories,
    Stats,
    CustomFields,
    StopwatchHistory,
}

impl Slot {
    pub fn name(self) -> &'static str {
        match self {
            Slot::Categories => "callCategories",
            Slot::Stats => "callStats",
            Slot::CustomFields => "customFields",
            Slot::StopwatchHistory => "stopwatchHistory",
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode {slot}: {source}")]
    Encode {
        slot: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Whole-value storage: every write replaces the slot.
pub trait KeyValueStore: Send + Sync {
    fn read(&self, slot: Slot) -> Result<Option<String>, StorageError>;
    fn write(&self, slot: Slot, value: &str) -> Result<(), StorageError>;
}

/// Serializes `value` and writes it to `slot`.
pub fn save_json<T: serde::Serialize>(
    store: &dyn KeyValueStore,
    slot: Slot,
    value: &T,
) -> Result<(), StorageError> {
    let payload = serde_json::to_string_pretty(value).map_err(|source| StorageError::Encode {
        slot: slot.name(),
        source,
    })?;
    store.write(slot, &payload)
}

/// One JSON file per slot under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, slot: Slot) -> PathBuf {
        self.dir.join(format!("{}.json", slot.name()))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, slot: Slot) -> Result<Option<String>, StorageError> {
        let path = self.slot_path(slot);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn write(&self, slot: Slot, value: &str) -> Result<(), StorageError> {
        let path = self.slot_path(slot);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|source| StorageError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(slot = slot.name(), bytes = value.len(), "slot written");
        Ok(())
    }
}

/// In-memory store for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<Slot, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slot(self, slot: Slot, value: impl Into<String>) -> Self {
        self.lock().insert(slot, value.into());
        self
    }

    pub fn get(&self, slot: Slot) -> Option<String> {
        self.lock().get(&slot).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Slot, String>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, slot: Slot) -> Result<Option<String>, StorageError> {
        Ok(self.get(slot))
    }

    fn write(&self, slot: Slot, value: &str) -> Result<(), StorageError> {
        self.lock().insert(slot, value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("call_desk_{name}_{}_{nanos}", std::process::id()))
    }

    #[test]
    fn file_store_missing_slot_reads_as_none() {
        let store = FileStore::open(temp_dir("missing")).unwrap();
        assert!(store.read(Slot::Stats).unwrap().is_none());
    }

    #[test]
    fn file_store_write_replaces_whole_value() {
        let dir = temp_dir("replace");
        let store = FileStore::open(&dir).unwrap();
        store.write(Slot::CustomFields, "[{\"name\":\"Order\"},{\"name\":\"Case\"}]").unwrap();
        store.write(Slot::CustomFields, "[]").unwrap();

        assert_eq!(store.read(Slot::CustomFields).unwrap().as_deref(), Some("[]"));
        assert!(dir.join("customFields.json").exists());
        assert!(!dir.join("customFields.json.tmp").exists());
        fs::remove_dir_all(dir).unwrap();
    }
}
