use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::broadcast;

const EVENT_CHANNEL_SIZE: usize = 64;

static NEXT_ORIGIN: AtomicU64 = AtomicU64::new(1);

/// Allocate a writer identity. Origin `0` is reserved for writes made
/// outside any adapter.
pub fn next_origin() -> u64 {
    NEXT_ORIGIN.fetch_add(1, Ordering::Relaxed)
}

/// Notification of a write. `new_value` is `None` for removals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub new_value: Option<String>,
    pub origin: u64,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read storage file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse storage file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write storage file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// String key/value storage capability.
pub trait StorageAccessor: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str, origin: u64) -> Result<(), StorageError>;

    fn remove(&self, key: &str, origin: u64) -> Result<(), StorageError>;

    /// Receive every subsequent write, including the subscriber's own.
    fn subscribe(&self) -> broadcast::Receiver<StorageEvent>;
}

/// In-process [`StorageAccessor`].
pub struct MemoryStorage {
    values: RwLock<HashMap<String, String>>,
    events: broadcast::Sender<StorageEvent>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self {
            values: RwLock::new(HashMap::new()),
            events,
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageAccessor for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str, origin: u64) -> Result<(), StorageError> {
        self.values.write().insert(key.to_string(), value.to_string());
        let _ = self.events.send(StorageEvent {
            key: key.to_string(),
            new_value: Some(value.to_string()),
            origin,
        });
        Ok(())
    }

    fn remove(&self, key: &str, origin: u64) -> Result<(), StorageError> {
        if self.values.write().remove(key).is_some() {
            let _ = self.events.send(StorageEvent {
                key: key.to_string(),
                new_value: None,
                origin,
            });
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}
