use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::store::{HookState, Intent, Reducer, Store};

use super::accessor::{next_origin, StorageAccessor, StorageEvent};

#[derive(Debug, Clone, PartialEq)]
pub struct StoredValue<T> {
    pub value: T,
}

impl<T: Clone + Send + Sync + 'static> HookState for StoredValue<T> {}

struct Replace<T>(T);

impl<T: Send + 'static> Intent for Replace<T> {}

struct StorageReducer<T>(std::marker::PhantomData<fn() -> T>);

impl<T: Clone + Send + Sync + 'static> Reducer for StorageReducer<T> {
    type State = StoredValue<T>;
    type Intent = Replace<T>;

    fn reduce(_state: Self::State, intent: Self::Intent) -> Self::State {
        StoredValue { value: intent.0 }
    }
}

/// One key of a [`StorageAccessor`], decoded as JSON into `T`.
///
/// Writes from other `UseStorage` instances on the same accessor and key
/// update this instance's value. Undecodable values are ignored and logged.
pub struct UseStorage<T>
where
    T: Clone + Send + Sync + 'static,
{
    key: String,
    origin: u64,
    accessor: Arc<dyn StorageAccessor>,
    store: Store<StorageReducer<T>>,
    listener: JoinHandle<()>,
}

impl<T> UseStorage<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Read `key`, falling back to `initial` when it is missing or does not
    /// decode. Must be called inside a tokio runtime.
    pub fn new(accessor: Arc<dyn StorageAccessor>, key: impl Into<String>, initial: T) -> Self {
        let key = key.into();
        let value = match accessor.get(&key) {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(key = %key, "Ignoring undecodable stored value: {}", err);
                    initial
                }
            },
            None => initial,
        };

        let origin = next_origin();
        let store = Store::new(StoredValue { value });
        let listener = tokio::spawn(listen(
            accessor.subscribe(),
            store.clone(),
            key.clone(),
            origin,
        ));

        Self {
            key,
            origin,
            accessor,
            store,
            listener,
        }
    }

    pub fn value(&self) -> T {
        self.store.state().value
    }

    pub fn subscribe(&self) -> watch::Receiver<StoredValue<T>> {
        self.store.subscribe()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Update the value and persist it. Persistence failures are logged;
    /// the local value is updated regardless.
    pub fn set(&self, value: T) {
        match serde_json::to_string(&value) {
            Ok(raw) => {
                if let Err(err) = self.accessor.set(&self.key, &raw, self.origin) {
                    tracing::warn!(key = %self.key, "Failed to persist value: {}", err);
                }
            }
            Err(err) => {
                tracing::warn!(key = %self.key, "Failed to encode value: {}", err);
            }
        }
        self.store.dispatch(Replace(value));
    }

    /// Apply `f` to the current value, then [`set`](Self::set) the result.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let next = f(&self.value());
        self.set(next);
    }
}

impl<T> Drop for UseStorage<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.listener.abort();
    }
}

async fn listen<T>(
    mut events: broadcast::Receiver<StorageEvent>,
    store: Store<StorageReducer<T>>,
    key: String,
    origin: u64,
) where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(key = %key, skipped, "Storage listener lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => return,
        };

        if event.key != key || event.origin == origin {
            continue;
        }

        // Removals carry no value to decode.
        let Some(raw) = event.new_value else {
            continue;
        };

        match serde_json::from_str::<T>(&raw) {
            Ok(value) => {
                store.dispatch(Replace(value));
            }
            Err(err) => {
                tracing::warn!(key = %key, "Ignoring undecodable storage event: {}", err);
            }
        }
    }
}
