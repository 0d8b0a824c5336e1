//! Resettable delayed callback.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::timer::Timer;

type Callback = Arc<Mutex<Box<dyn FnMut() + Send>>>;

/// Runs a callback once, `delay` after construction or the last
/// [`reset`](Self::reset). Dropping the adapter cancels a pending firing.
pub struct UseTimeout {
    delay: Duration,
    callback: Callback,
    timer: Arc<dyn Timer>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl UseTimeout {
    /// Schedule `callback`. Must be called inside a tokio runtime.
    pub fn new<F>(delay: Duration, timer: Arc<dyn Timer>, callback: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let timeout = Self {
            delay,
            callback: Arc::new(Mutex::new(Box::new(callback))),
            timer,
            pending: Mutex::new(None),
        };
        timeout.reset();
        timeout
    }

    /// Cancel any pending firing and schedule a fresh one.
    pub fn reset(&self) {
        let mut pending = self.pending.lock();
        if let Some(previous) = pending.take() {
            previous.abort();
        }

        let callback = Arc::clone(&self.callback);
        let timer = Arc::clone(&self.timer);
        let delay = self.delay;
        *pending = Some(tokio::spawn(async move {
            timer.sleep(delay).await;
            let mut callback = callback.lock();
            (*callback)();
        }));
    }

    /// Cancel the pending firing, if any.
    pub fn clear(&self) {
        if let Some(pending) = self.pending.lock().take() {
            pending.abort();
        }
    }

    /// Swap the callback. A pending firing runs the new one.
    pub fn set_callback<F>(&self, callback: F)
    where
        F: FnMut() + Send + 'static,
    {
        *self.callback.lock() = Box::new(callback);
    }
}

impl Drop for UseTimeout {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.get_mut().take() {
            pending.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::TokioTimer;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl FnMut() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (count, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let (count, callback) = counter();
        let _timeout = UseTimeout::new(Duration::from_millis(100), Arc::new(TokioTimer), callback);

        tokio::time::sleep(Duration::from_millis(99)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_postpones_firing() {
        let (count, callback) = counter();
        let timeout = UseTimeout::new(Duration::from_millis(100), Arc::new(TokioTimer), callback);

        tokio::time::sleep(Duration::from_millis(80)).await;
        timeout.reset();

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_and_drop_cancel() {
        let (cleared_count, callback) = counter();
        let cleared = UseTimeout::new(Duration::from_millis(50), Arc::new(TokioTimer), callback);
        cleared.clear();

        let (dropped_count, callback) = counter();
        let dropped = UseTimeout::new(Duration::from_millis(50), Arc::new(TokioTimer), callback);
        drop(dropped);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(cleared_count.load(Ordering::SeqCst), 0);
        assert_eq!(dropped_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn swapped_callback_runs() {
        let (first, callback) = counter();
        let timeout = UseTimeout::new(Duration::from_millis(50), Arc::new(TokioTimer), callback);

        let (second, replacement) = counter();
        timeout.set_callback(replacement);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }
}
