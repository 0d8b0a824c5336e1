use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use tokio::sync::watch;

use crate::config::FetchConfig;
use crate::store::Store;
use crate::timer::{CancelToken, Cancellation, Timer, TokioTimer};

use super::error::{FetchError, RequestError};
use super::intent::FetchIntent;
use super::options::FetchOptions;
use super::reducer::FetchReducer;
use super::request::{FetchRequest, HttpRequester, Requester};
use super::state::{FetchPhase, FetchState};

/// Retrying fetch adapter.
///
/// Construction starts the first activation; [`set_input`](Self::set_input)
/// and [`retry`](Self::retry) start new ones. Each activation runs as one
/// spawned driver task, so these must be called inside a tokio runtime.
///
/// ```no_run
/// # async fn run() -> Result<(), usekit::fetch::RequestError> {
/// use usekit::config::FetchConfig;
/// use usekit::fetch::{FetchOptions, UseFetch};
///
/// let todos = UseFetch::<serde_json::Value>::http(
///     "https://example.com/todos/1",
///     FetchOptions::default(),
///     &FetchConfig::default(),
/// )?;
/// let state = todos.settled().await;
/// if let Some(error) = state.error {
///     eprintln!("{error}");
///     todos.retry();
/// }
/// # Ok(())
/// # }
/// ```
pub struct UseFetch<T>
where
    T: Clone + Send + Sync + 'static,
{
    store: Store<FetchReducer<T>>,
    requester: Arc<dyn Requester>,
    timer: Arc<dyn Timer>,
    activation: Mutex<Activation>,
}

struct Activation {
    generation: u64,
    url: String,
    options: FetchOptions,
    cancellation: Option<Cancellation>,
}

impl<T> UseFetch<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(
        url: impl Into<String>,
        options: FetchOptions,
        requester: Arc<dyn Requester>,
        timer: Arc<dyn Timer>,
    ) -> Self {
        let fetch = Self {
            store: Store::new(FetchState::default()),
            requester,
            timer,
            activation: Mutex::new(Activation {
                generation: 0,
                url: url.into(),
                options,
                cancellation: None,
            }),
        };
        fetch.activate();
        fetch
    }

    /// Adapter over [`HttpRequester`] and the tokio clock.
    pub fn http(
        url: impl Into<String>,
        options: FetchOptions,
        config: &FetchConfig,
    ) -> Result<Self, RequestError> {
        let requester = HttpRequester::new(config)?;
        Ok(Self::new(url, options, Arc::new(requester), Arc::new(TokioTimer)))
    }

    pub fn state(&self) -> FetchState<T> {
        self.store.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.store.subscribe()
    }

    /// Wait until nothing is outstanding and return that state.
    pub async fn settled(&self) -> FetchState<T> {
        self.store.wait_until(|state| !state.loading).await
    }

    /// Restart from the initial attempt with a fresh retry budget.
    ///
    /// Ignored while a request is in flight; attempts never overlap.
    pub fn retry(&self) {
        let mut activation = self.activation.lock();
        if self.store.state().phase == FetchPhase::Requesting {
            tracing::debug!(url = %activation.url, "Manual retry ignored, request in flight");
            return;
        }
        tracing::debug!(url = %activation.url, "Manual retry");
        self.start(&mut activation);
    }

    /// Replace the resource and options. Anything still pending for the
    /// previous input is discarded.
    pub fn set_input(&self, url: impl Into<String>, options: FetchOptions) {
        {
            let mut activation = self.activation.lock();
            activation.url = url.into();
            activation.options = options;
        }
        self.activate();
    }

    pub fn url(&self) -> String {
        self.activation.lock().url.clone()
    }

    fn activate(&self) {
        let mut activation = self.activation.lock();
        self.start(&mut activation);
    }

    fn start(&self, activation: &mut Activation) {
        if let Some(previous) = activation.cancellation.take() {
            previous.cancel();
        }

        activation.generation += 1;
        let generation = activation.generation;
        let (cancellation, token) = Cancellation::pair();
        activation.cancellation = Some(cancellation);

        // Dispatch under the lock so activations reach the store in
        // generation order.
        self.store.dispatch(FetchIntent::Activate {
            generation,
            retries: activation.options.retries,
        });

        let driver = Driver {
            store: self.store.clone(),
            requester: Arc::clone(&self.requester),
            timer: Arc::clone(&self.timer),
            request: FetchRequest::new(activation.url.clone(), &activation.options),
            retry_delay: activation.options.retry_delay,
            generation,
            token,
        };

        tracing::debug!(generation, url = %driver.request.url, "Fetch activated");
        tokio::spawn(driver.run());
    }
}

impl<T> Drop for UseFetch<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        let activation = self.activation.get_mut();
        if let Some(cancellation) = activation.cancellation.take() {
            cancellation.cancel();
        }
        tracing::debug!(generation = activation.generation, "Fetch torn down");
    }
}

/// Runs one activation until it settles or is superseded.
struct Driver<T>
where
    T: Clone + Send + Sync + 'static,
{
    store: Store<FetchReducer<T>>,
    requester: Arc<dyn Requester>,
    timer: Arc<dyn Timer>,
    request: FetchRequest,
    retry_delay: Duration,
    generation: u64,
    token: CancelToken,
}

impl<T> Driver<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    async fn run(mut self) {
        loop {
            let state = self.store.state();
            if state.generation != self.generation {
                return;
            }

            match state.phase {
                FetchPhase::Requesting => {
                    let outcome = self.attempt().await;
                    if self.token.is_cancelled() {
                        tracing::debug!(
                            generation = self.generation,
                            "Discarded response for cancelled activation"
                        );
                        return;
                    }
                    if let Err(err) = &outcome {
                        tracing::warn!(
                            url = %self.request.url,
                            attempt = state.attempts,
                            retries = state.retries,
                            kind = err.kind(),
                            "Fetch attempt failed: {}",
                            err
                        );
                    }

                    let next = self.store.dispatch(FetchIntent::Settled {
                        generation: self.generation,
                        outcome,
                    });
                    if next.generation != self.generation {
                        tracing::debug!(
                            generation = self.generation,
                            current = next.generation,
                            "Discarded stale response"
                        );
                        return;
                    }
                    if next.phase == FetchPhase::Exhausted {
                        tracing::warn!(
                            url = %self.request.url,
                            attempts = next.attempts,
                            "Fetch gave up"
                        );
                    }
                }
                FetchPhase::WaitingRetry => {
                    let fired = self
                        .token
                        .sleep(self.timer.as_ref(), self.retry_delay)
                        .await;
                    if !fired {
                        tracing::debug!(generation = self.generation, "Retry cancelled");
                        return;
                    }
                    self.store.dispatch(FetchIntent::RetryDue {
                        generation: self.generation,
                    });
                }
                FetchPhase::Idle | FetchPhase::Succeeded | FetchPhase::Exhausted => return,
            }
        }
    }

    async fn attempt(&self) -> Result<T, FetchError> {
        let response = self.requester.send(&self.request).await?;
        Ok(serde_json::from_slice(&response.body)?)
    }
}
