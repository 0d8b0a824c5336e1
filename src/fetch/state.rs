use crate::store::HookState;

use super::error::FetchError;

/// Where an activation is in its request/retry cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPhase {
    /// No activation has started yet.
    #[default]
    Idle,
    /// A request is in flight.
    Requesting,
    /// The last attempt failed and a retry is scheduled.
    WaitingRetry,
    /// The last attempt decoded a body.
    Succeeded,
    /// Retry limit consumed.
    Exhausted,
}

/// Snapshot exposed by [`UseFetch`](super::UseFetch).
///
/// `loading` is true exactly while the phase is `Requesting` or
/// `WaitingRetry`. `data` and `error` are never both set.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    pub data: Option<T>,
    pub error: Option<FetchError>,
    pub loading: bool,
    /// Retry cycles consumed in the current activation.
    pub attempts: u32,
    /// Retry limit of the current activation.
    pub retries: u32,
    pub phase: FetchPhase,
    /// Activation this state belongs to. Zero before the first activation.
    pub generation: u64,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            loading: false,
            attempts: 0,
            retries: 0,
            phase: FetchPhase::Idle,
            generation: 0,
        }
    }
}

impl<T: Clone + Send + Sync + 'static> HookState for FetchState<T> {}

impl<T> FetchState<T> {
    /// Settled and no further network activity will happen on its own.
    pub fn is_settled(&self) -> bool {
        matches!(self.phase, FetchPhase::Succeeded | FetchPhase::Exhausted)
    }

    /// Retries still available to the current activation.
    pub fn retries_left(&self) -> u32 {
        self.retries.saturating_sub(self.attempts)
    }
}
