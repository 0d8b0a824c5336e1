//! Retrying fetch adapter.
//!
//! [`UseFetch`] issues a request through a [`Requester`], decodes the JSON
//! body into `T` and exposes `{data, error, loading}` plus [`UseFetch::retry`].
//! Failed attempts are retried after a fixed delay until the configured
//! limit is consumed.
//!
//! Transitions are explicit:
//!
//! ```text
//! Idle ─→ Requesting ─→ Succeeded
//!              │
//!              ├─→ WaitingRetry ─→ Requesting     (attempts < retries)
//!              └─→ Exhausted                      (attempts = retries)
//! ```
//!
//! Every intent carries the generation of the activation that produced it;
//! the reducer drops intents from superseded activations.

mod adapter;
mod error;
mod intent;
mod options;
mod reducer;
mod request;
mod state;

pub use adapter::UseFetch;
pub use error::{FetchError, RequestError};
pub use intent::FetchIntent;
pub use options::{FetchOptions, Method, DEFAULT_RETRIES, DEFAULT_RETRY_DELAY};
pub use reducer::FetchReducer;
pub use request::{FetchRequest, FetchResponse, HttpRequester, Requester};
pub use state::{FetchPhase, FetchState};
