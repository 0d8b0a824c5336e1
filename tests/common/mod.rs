//! Shared test utilities and fake capabilities.

#![allow(dead_code, unused_imports)]

pub mod mock_backend;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::Instant;
use usekit::fetch::{FetchRequest, FetchResponse, RequestError, Requester};

/// Body on success, error message on failure.
pub type Outcome = Result<String, String>;

/// One scripted reply of a [`ScriptedRequester`].
pub enum Step {
    Ready(Outcome),
    /// Reply once the paired sender fires.
    Gated(oneshot::Receiver<Outcome>),
}

/// A request as seen by the fake, stamped on the tokio clock.
#[derive(Debug, Clone)]
pub struct Call {
    pub at: Instant,
    pub request: FetchRequest,
}

/// Fake [`Requester`] that replays a script, then repeats a fallback.
pub struct ScriptedRequester {
    script: Mutex<VecDeque<Step>>,
    fallback: Mutex<Outcome>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedRequester {
    pub fn new(script: Vec<Step>, fallback: Outcome) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: Mutex::new(fallback),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn always_ok(body: &str) -> Self {
        Self::new(Vec::new(), Ok(body.to_string()))
    }

    pub fn always_fail(message: &str) -> Self {
        Self::new(Vec::new(), Err(message.to_string()))
    }

    pub fn set_fallback(&self, fallback: Outcome) {
        *self.fallback.lock() = fallback;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Yield until at least `n` requests were issued.
    pub async fn wait_for_calls(&self, n: usize) {
        while self.call_count() < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl Requester for ScriptedRequester {
    async fn send(&self, request: &FetchRequest) -> Result<FetchResponse, RequestError> {
        self.calls.lock().push(Call {
            at: Instant::now(),
            request: request.clone(),
        });

        let step = self.script.lock().pop_front();
        let outcome = match step {
            Some(Step::Ready(outcome)) => outcome,
            Some(Step::Gated(gate)) => gate
                .await
                .unwrap_or_else(|_| Err("gate dropped".to_string())),
            None => self.fallback.lock().clone(),
        };

        match outcome {
            Ok(body) => Ok(FetchResponse {
                status: 200,
                content_type: Some("application/json".to_string()),
                body: body.into_bytes(),
            }),
            Err(message) => Err(RequestError::Invalid(message)),
        }
    }
}

/// Find a port with nothing listening on it.
pub fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind to free port");
    listener.local_addr().unwrap().port()
}
