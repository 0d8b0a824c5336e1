//! Reactive state primitive shared by every adapter.
//!
//! ```text
//! capability event ──→ Intent ──→ Reducer ──→ State ──→ subscribers
//!        ↑                                      │
//!        └──────────── driver task ─────────────┘
//! ```
//!
//! - **State**: snapshot of what an adapter exposes to its caller
//! - **Intent**: capability outcome or caller action, tagged with the
//!   generation it belongs to where staleness matters
//! - **Reducer**: pure `(State, Intent) -> State` transition
//! - **Store**: holds the current state and publishes each new snapshot

mod cell;
mod intent;
mod reducer;
mod state;

pub use cell::Store;
pub use intent::Intent;
pub use reducer::Reducer;
pub use state::HookState;
