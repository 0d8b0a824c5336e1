//! Throttled value.

use std::time::Duration;

use tokio::time::Instant;

/// Holds a value that changes at most once per `delay`.
///
/// The window starts at construction, so an update arriving sooner than
/// `delay` after `new` is dropped as well.
#[derive(Debug, Clone)]
pub struct Throttled<T> {
    value: T,
    delay: Duration,
    last_accepted: Instant,
}

impl<T> Throttled<T> {
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            value: initial,
            delay,
            last_accepted: Instant::now(),
        }
    }

    /// Offer a new value. Returns whether it was accepted.
    pub fn update(&mut self, value: T) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last_accepted) < self.delay {
            return false;
        }
        self.value = value;
        self.last_accepted = now;
        true
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }
}
