//! Persisted key/value adapter with cross-instance sync.
//!
//! A [`StorageAccessor`] owns the values and broadcasts a [`StorageEvent`]
//! on every write. Each [`UseStorage`] listens for writes to its key made by
//! other instances and folds them into its state.

mod accessor;
mod adapter;
mod file;

pub use accessor::{next_origin, MemoryStorage, StorageAccessor, StorageError, StorageEvent};
pub use adapter::{StoredValue, UseStorage};
pub use file::FileStorage;
