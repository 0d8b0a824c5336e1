use crate::store::Intent;

use super::error::FetchError;

/// Intents dispatched to [`FetchReducer`](super::FetchReducer).
#[derive(Debug)]
pub enum FetchIntent<T> {
    /// Start an activation: new input, manual retry or construction.
    Activate { generation: u64, retries: u32 },

    /// The in-flight request of `generation` resolved.
    Settled {
        generation: u64,
        outcome: Result<T, FetchError>,
    },

    /// The retry delay of `generation` elapsed.
    RetryDue { generation: u64 },
}

impl<T: Send + 'static> Intent for FetchIntent<T> {}

impl<T> FetchIntent<T> {
    pub fn generation(&self) -> u64 {
        match self {
            FetchIntent::Activate { generation, .. }
            | FetchIntent::Settled { generation, .. }
            | FetchIntent::RetryDue { generation } => *generation,
        }
    }
}
