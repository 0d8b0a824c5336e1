use super::intent::Intent;
use super::state::HookState;

/// Pure state transition for one adapter.
///
/// All side effects (issuing requests, arming timers, writing storage) live
/// in the adapter around the dispatch call. A reducer that receives an
/// intent it must ignore (wrong generation, wrong phase) returns the state
/// unchanged.
pub trait Reducer {
    type State: HookState;
    type Intent: Intent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State;
}
