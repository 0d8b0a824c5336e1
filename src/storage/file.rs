use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::config::StorageConfig;

use super::accessor::{StorageAccessor, StorageError, StorageEvent};

const EVENT_CHANNEL_SIZE: usize = 64;

/// [`StorageAccessor`] persisted as one JSON object in a file.
///
/// The whole map is rewritten on each write. A failed write leaves both the
/// file and the in-memory view unchanged.
pub struct FileStorage {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
    events: broadcast::Sender<StorageEvent>,
}

impl FileStorage {
    /// Default storage file: `usekit/storage.json` under the platform data
    /// directory, or the current directory when there is none.
    pub fn default_path() -> PathBuf {
        let data_dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        data_dir.join("usekit").join("storage.json")
    }

    /// Open the file named by `config`, or [`default_path`](Self::default_path).
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        match &config.path {
            Some(path) => Self::open(path),
            None => Self::open(&Self::default_path()),
        }
    }

    /// Open `path`. A missing file is treated as empty storage.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let values = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| StorageError::Read {
                path: path.to_path_buf(),
                source: e,
            })?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|e| StorageError::Parse {
                    path: path.to_path_buf(),
                    source: e,
                })?
            }
        } else {
            BTreeMap::new()
        };

        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Ok(Self {
            path: path.to_path_buf(),
            values: Mutex::new(values),
            events,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(values)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::Write {
                path: self.path.clone(),
                source: e,
            })?;
        }
        fs::write(&self.path, content).map_err(|e| StorageError::Write {
            path: self.path.clone(),
            source: e,
        })
    }

    fn notify(&self, key: &str, new_value: Option<String>, origin: u64) {
        let _ = self.events.send(StorageEvent {
            key: key.to_string(),
            new_value,
            origin,
        });
    }
}

impl StorageAccessor for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str, origin: u64) -> Result<(), StorageError> {
        {
            let mut values = self.values.lock();
            let previous = values.insert(key.to_string(), value.to_string());
            if let Err(err) = self.persist(&values) {
                match previous {
                    Some(old) => values.insert(key.to_string(), old),
                    None => values.remove(key),
                };
                return Err(err);
            }
        }
        self.notify(key, Some(value.to_string()), origin);
        Ok(())
    }

    fn remove(&self, key: &str, origin: u64) -> Result<(), StorageError> {
        {
            let mut values = self.values.lock();
            let Some(previous) = values.remove(key) else {
                return Ok(());
            };
            if let Err(err) = self.persist(&values) {
                values.insert(key.to_string(), previous);
                return Err(err);
            }
        }
        self.notify(key, None, origin);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}
