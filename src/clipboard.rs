//! Copy-to-clipboard adapter.
//!
//! `copied` flips to true after a successful write and back to false once
//! `reset_after` has elapsed. A newer copy restarts the reset delay.

use std::sync::Arc;
use std::time::Duration;

use arboard::Clipboard;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::ClipboardConfig;
use crate::store::{HookState, Intent, Reducer, Store};
use crate::timer::{Timer, TokioTimer};

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to set clipboard text: {0}")]
    Write(String),
}

/// Text clipboard capability.
pub trait ClipboardWriter: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// System clipboard via `arboard`.
pub struct SystemClipboard {
    clipboard: Mutex<Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Result<Self, ClipboardError> {
        let clipboard = Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        Ok(Self {
            clipboard: Mutex::new(clipboard),
        })
    }
}

impl ClipboardWriter for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        self.clipboard
            .lock()
            .set_text(text.to_string())
            .map_err(|e| ClipboardError::Write(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CopyState {
    pub copied: bool,
}

impl HookState for CopyState {}

#[derive(Debug)]
enum CopyIntent {
    Copied,
    Reset,
}

impl Intent for CopyIntent {}

struct CopyReducer;

impl Reducer for CopyReducer {
    type State = CopyState;
    type Intent = CopyIntent;

    fn reduce(_state: CopyState, intent: CopyIntent) -> CopyState {
        CopyState {
            copied: matches!(intent, CopyIntent::Copied),
        }
    }
}

pub struct UseClipboard {
    store: Store<CopyReducer>,
    writer: Arc<dyn ClipboardWriter>,
    timer: Arc<dyn Timer>,
    reset_after: Duration,
    pending_reset: Mutex<Option<JoinHandle<()>>>,
}

impl UseClipboard {
    pub fn new(writer: Arc<dyn ClipboardWriter>, timer: Arc<dyn Timer>, reset_after: Duration) -> Self {
        Self {
            store: Store::new(CopyState::default()),
            writer,
            timer,
            reset_after,
            pending_reset: Mutex::new(None),
        }
    }

    /// Adapter over the system clipboard with the configured reset delay.
    pub fn system(config: &ClipboardConfig) -> Result<Self, ClipboardError> {
        Ok(Self::new(
            Arc::new(SystemClipboard::new()?),
            Arc::new(TokioTimer),
            config.reset_after(),
        ))
    }

    pub fn copied(&self) -> bool {
        self.store.state().copied
    }

    pub fn subscribe(&self) -> watch::Receiver<CopyState> {
        self.store.subscribe()
    }

    /// Write `text`. Returns whether the write succeeded; failures are
    /// logged and leave `copied` false. Must be called inside a tokio
    /// runtime.
    pub fn copy(&self, text: &str) -> bool {
        let mut pending = self.pending_reset.lock();
        if let Some(previous) = pending.take() {
            previous.abort();
        }

        if let Err(err) = self.writer.write_text(text) {
            tracing::warn!("Copy failed: {}", err);
            self.store.dispatch(CopyIntent::Reset);
            return false;
        }

        self.store.dispatch(CopyIntent::Copied);

        let store = self.store.clone();
        let timer = Arc::clone(&self.timer);
        let delay = self.reset_after;
        *pending = Some(tokio::spawn(async move {
            timer.sleep(delay).await;
            store.dispatch(CopyIntent::Reset);
        }));
        true
    }
}

impl Drop for UseClipboard {
    fn drop(&mut self) {
        if let Some(pending) = self.pending_reset.get_mut().take() {
            pending.abort();
        }
    }
}
