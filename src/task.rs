//! Async task adapter.
//!
//! Wraps a caller-supplied async function and tracks its status. A newer
//! [`UseAsync::execute`] supersedes any execution still running; the older
//! outcome is dropped when it arrives.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::store::{HookState, Intent, Reducer, Store};

type TaskFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send>>;
type TaskFn<T, E> = Arc<dyn Fn() -> TaskFuture<T, E> + Send + Sync>;

/// Lifecycle of the most recent execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Error,
}

/// Snapshot exposed by [`UseAsync`].
#[derive(Debug, Clone, PartialEq)]
pub struct TaskState<T, E> {
    pub status: TaskStatus,
    pub value: Option<T>,
    pub error: Option<E>,
    /// Execution this state belongs to. Zero before the first one.
    pub generation: u64,
}

impl<T, E> Default for TaskState<T, E> {
    fn default() -> Self {
        Self {
            status: TaskStatus::Idle,
            value: None,
            error: None,
            generation: 0,
        }
    }
}

impl<T, E> HookState for TaskState<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
}

/// Intents dispatched to [`TaskReducer`].
#[derive(Debug)]
pub enum TaskIntent<T, E> {
    Started { generation: u64 },
    Finished { generation: u64, outcome: Result<T, E> },
}

impl<T: Send + 'static, E: Send + 'static> Intent for TaskIntent<T, E> {}

/// Applies task intents; outcomes of superseded executions are dropped.
pub struct TaskReducer<T, E>(std::marker::PhantomData<fn() -> (T, E)>);

impl<T, E> Reducer for TaskReducer<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    type State = TaskState<T, E>;
    type Intent = TaskIntent<T, E>;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            TaskIntent::Started { generation } if generation > state.generation => TaskState {
                status: TaskStatus::Pending,
                value: None,
                error: None,
                generation,
            },
            TaskIntent::Finished {
                generation,
                outcome,
            } if generation == state.generation && state.status == TaskStatus::Pending => {
                match outcome {
                    Ok(value) => TaskState {
                        status: TaskStatus::Success,
                        value: Some(value),
                        ..state
                    },
                    Err(error) => TaskState {
                        status: TaskStatus::Error,
                        error: Some(error),
                        ..state
                    },
                }
            }
            _ => state,
        }
    }
}

/// Async function adapter with status tracking.
pub struct UseAsync<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    store: Store<TaskReducer<T, E>>,
    func: TaskFn<T, E>,
    generation: AtomicU64,
}

impl<T, E> UseAsync<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Wrap `func`. With `immediate`, the first execution starts right away
    /// (requires a tokio runtime); otherwise the state stays `Idle` until
    /// [`execute`](Self::execute).
    pub fn new<F, Fut>(func: F, immediate: bool) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let func: TaskFn<T, E> = Arc::new(move || Box::pin(func()) as TaskFuture<T, E>);
        let task = Self {
            store: Store::new(TaskState::default()),
            func,
            generation: AtomicU64::new(0),
        };
        if immediate {
            task.execute();
        }
        task
    }

    /// Run the function. The returned handle resolves once its outcome has
    /// been applied (or dropped as superseded).
    pub fn execute(&self) -> JoinHandle<()> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.store.dispatch(TaskIntent::Started { generation });

        let store = self.store.clone();
        let future = (self.func)();
        tokio::spawn(async move {
            let outcome = future.await;
            let next = store.dispatch(TaskIntent::Finished {
                generation,
                outcome,
            });
            if next.generation != generation {
                tracing::debug!(
                    generation,
                    current = next.generation,
                    "Dropped superseded task outcome"
                );
            }
        })
    }

    pub fn state(&self) -> TaskState<T, E> {
        self.store.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<TaskState<T, E>> {
        self.store.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[tokio::test]
    async fn not_immediate_stays_idle() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let task = UseAsync::<&'static str, String>::new(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok("test") }
            },
            false,
        );

        tokio::task::yield_now().await;
        let state = task.state();
        assert_eq!(state.status, TaskStatus::Idle);
        assert!(state.value.is_none());
        assert!(state.error.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn immediate_runs_and_succeeds() {
        let task = UseAsync::<&'static str, String>::new(|| async { Ok("test") }, true);
        assert_eq!(task.state().status, TaskStatus::Pending);

        let mut receiver = task.subscribe();
        let state = receiver
            .wait_for(|s| s.status != TaskStatus::Pending)
            .await
            .unwrap()
            .clone();
        assert_eq!(state.status, TaskStatus::Success);
        assert_eq!(state.value, Some("test"));
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn execute_records_error() {
        let task =
            UseAsync::<u32, String>::new(|| async { Err("boom".to_string()) }, false);

        task.execute().await.unwrap();

        let state = task.state();
        assert_eq!(state.status, TaskStatus::Error);
        assert!(state.value.is_none());
        assert_eq!(state.error.as_deref(), Some("boom"));
    }

    #[tokio::test(start_paused = true)]
    async fn newer_execution_wins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let task = UseAsync::<usize, String>::new(
            move || {
                let call = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    // First call is slow, second is fast.
                    let delay = if call == 0 { 500 } else { 10 };
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    Ok(call)
                }
            },
            false,
        );

        let slow = task.execute();
        let fast = task.execute();
        fast.await.unwrap();
        slow.await.unwrap();

        let state = task.state();
        assert_eq!(state.status, TaskStatus::Success);
        assert_eq!(state.value, Some(1));
        assert_eq!(state.generation, 2);
    }
}
