//! Timer capability and per-activation cancellation.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

/// Schedules delayed continuations.
///
/// Adapters never call `tokio::time` directly for their delays so that a
/// caller can substitute its own clock.
#[async_trait]
pub trait Timer: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Timer`] on the tokio clock. Honours `tokio::time::pause` in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

#[async_trait]
impl Timer for TokioTimer {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Owner side of a cancel signal for one activation.
///
/// Dropping the `Cancellation` cancels as well, so an adapter that is torn
/// down without an explicit `cancel()` still releases its waiters.
#[derive(Debug)]
pub struct Cancellation {
    sender: watch::Sender<bool>,
}

/// Waiter side handed to a driver task.
#[derive(Debug, Clone)]
pub struct CancelToken {
    receiver: watch::Receiver<bool>,
}

impl Cancellation {
    pub fn pair() -> (Self, CancelToken) {
        let (sender, receiver) = watch::channel(false);
        (Self { sender }, CancelToken { receiver })
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow() || self.receiver.has_changed().is_err()
    }

    /// Resolves once cancelled or once the owning [`Cancellation`] is gone.
    pub async fn cancelled(&mut self) {
        let _ = self.receiver.wait_for(|cancelled| *cancelled).await;
    }

    /// Sleep on `timer` unless cancelled first. Returns `false` on cancel.
    pub async fn sleep(&mut self, timer: &dyn Timer, duration: Duration) -> bool {
        if self.is_cancelled() {
            return false;
        }
        tokio::select! {
            _ = timer.sleep(duration) => true,
            _ = self.cancelled() => false,
        }
    }
}
