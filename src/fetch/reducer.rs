use std::marker::PhantomData;

use crate::store::Reducer;

use super::error::FetchError;
use super::intent::FetchIntent;
use super::state::{FetchPhase, FetchState};

/// Transition function for [`FetchState`].
///
/// Intents from an older generation, or arriving in a phase that does not
/// expect them, leave the state untouched.
pub struct FetchReducer<T>(PhantomData<fn() -> T>);

impl<T: Clone + Send + Sync + 'static> Reducer for FetchReducer<T> {
    type State = FetchState<T>;
    type Intent = FetchIntent<T>;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            FetchIntent::Activate {
                generation,
                retries,
            } => {
                if generation <= state.generation {
                    return state;
                }
                FetchState {
                    data: None,
                    error: None,
                    loading: true,
                    attempts: 0,
                    retries,
                    phase: FetchPhase::Requesting,
                    generation,
                }
            }

            FetchIntent::Settled {
                generation,
                outcome,
            } => {
                if generation != state.generation || state.phase != FetchPhase::Requesting {
                    return state;
                }
                match outcome {
                    Ok(data) => FetchState {
                        data: Some(data),
                        error: None,
                        loading: false,
                        phase: FetchPhase::Succeeded,
                        ..state
                    },
                    Err(error) if state.attempts < state.retries => FetchState {
                        data: None,
                        error: Some(error),
                        loading: true,
                        phase: FetchPhase::WaitingRetry,
                        ..state
                    },
                    Err(_) => FetchState {
                        data: None,
                        error: Some(FetchError::Exhausted {
                            attempts: state.attempts,
                        }),
                        loading: false,
                        phase: FetchPhase::Exhausted,
                        ..state
                    },
                }
            }

            FetchIntent::RetryDue { generation } => {
                if generation != state.generation || state.phase != FetchPhase::WaitingRetry {
                    return state;
                }
                FetchState {
                    data: None,
                    error: None,
                    loading: true,
                    attempts: state.attempts + 1,
                    phase: FetchPhase::Requesting,
                    ..state
                }
            }
        }
    }
}
