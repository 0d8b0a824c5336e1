use std::sync::Arc;

use tokio::sync::watch;

use super::reducer::Reducer;

/// Owns one adapter's state and fans snapshots out to subscribers.
///
/// Cloning a `Store` yields another handle to the same state; adapters hand
/// a clone to their driver task. Dispatch is serialised by the underlying
/// `watch` channel lock, so the reducer always sees the latest state.
pub struct Store<R: Reducer> {
    sender: Arc<watch::Sender<R::State>>,
}

impl<R: Reducer> Clone for Store<R> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl<R: Reducer> Store<R> {
    pub fn new(initial: R::State) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Apply `intent` and return the resulting snapshot.
    pub fn dispatch(&self, intent: R::Intent) -> R::State {
        let mut next = None;
        self.sender.send_modify(|state| {
            *state = R::reduce(state.clone(), intent);
            next = Some(state.clone());
        });
        next.unwrap_or_else(|| self.state())
    }

    /// Current snapshot.
    pub fn state(&self) -> R::State {
        self.sender.borrow().clone()
    }

    /// Receiver notified on every dispatch.
    pub fn subscribe(&self) -> watch::Receiver<R::State> {
        self.sender.subscribe()
    }

    /// Wait until `done` holds for the current state and return it.
    pub async fn wait_until<F>(&self, mut done: F) -> R::State
    where
        F: FnMut(&R::State) -> bool,
    {
        let mut receiver = self.subscribe();
        let snapshot = match receiver.wait_for(|state| done(state)).await {
            Ok(state) => (*state).clone(),
            // The sender lives as long as `self`, so this arm only runs
            // while the store is being torn down.
            Err(_) => return self.state(),
        };
        snapshot
    }
}
