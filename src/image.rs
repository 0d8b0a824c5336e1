//! Fetch a resource and expose it as a `data:` URL.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::fetch::{FetchOptions, FetchRequest, FetchResponse, Requester};
use crate::store::{HookState, Intent, Reducer, Store};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageData {
    /// `data:<content-type>;base64,<payload>` once loaded.
    pub data_url: Option<String>,
    pub generation: u64,
}

impl HookState for ImageData {}

#[derive(Debug)]
enum ImageIntent {
    Load { generation: u64 },
    Loaded { generation: u64, data_url: String },
}

impl Intent for ImageIntent {}

struct ImageReducer;

impl Reducer for ImageReducer {
    type State = ImageData;
    type Intent = ImageIntent;

    fn reduce(state: ImageData, intent: ImageIntent) -> ImageData {
        match intent {
            ImageIntent::Load { generation } if generation > state.generation => ImageData {
                data_url: None,
                generation,
            },
            ImageIntent::Loaded {
                generation,
                data_url,
            } if generation == state.generation => ImageData {
                data_url: Some(data_url),
                generation,
            },
            _ => state,
        }
    }
}

/// Encode a response body as a base64 `data:` URL.
pub fn to_data_url(response: &FetchResponse) -> String {
    let content_type = response
        .content_type
        .as_deref()
        .filter(|ct| !ct.trim().is_empty())
        .unwrap_or(FALLBACK_CONTENT_TYPE);
    format!("data:{};base64,{}", content_type, STANDARD.encode(&response.body))
}

/// Loads `src` through a [`Requester`] and exposes it as a data URL.
///
/// The value stays `None` while loading and after a failure. Dropping the
/// adapter aborts any load still running.
pub struct UseImageData {
    store: Store<ImageReducer>,
    requester: Arc<dyn Requester>,
    generation: AtomicU64,
    loads: Mutex<Vec<JoinHandle<()>>>,
}

impl UseImageData {
    /// Start loading `src`. Must be called inside a tokio runtime.
    pub fn new(src: impl Into<String>, requester: Arc<dyn Requester>) -> Self {
        let image = Self {
            store: Store::new(ImageData::default()),
            requester,
            generation: AtomicU64::new(0),
            loads: Mutex::new(Vec::new()),
        };
        image.set_src(src);
        image
    }

    /// Load a different resource; a still-running load of the old one is
    /// discarded when it completes.
    pub fn set_src(&self, src: impl Into<String>) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.store.dispatch(ImageIntent::Load { generation });

        let request = FetchRequest::new(src, &FetchOptions::default());
        let store = self.store.clone();
        let requester = Arc::clone(&self.requester);
        let load = tokio::spawn(async move {
            match requester.send(&request).await {
                Ok(response) => {
                    let next = store.dispatch(ImageIntent::Loaded {
                        generation,
                        data_url: to_data_url(&response),
                    });
                    if next.generation != generation {
                        tracing::debug!(url = %request.url, "Discarded stale image");
                    }
                }
                Err(err) => {
                    tracing::warn!(url = %request.url, "Image load failed: {}", err);
                }
            }
        });

        let mut loads = self.loads.lock();
        loads.retain(|handle| !handle.is_finished());
        loads.push(load);
    }

    pub fn data_url(&self) -> Option<String> {
        self.store.state().data_url
    }

    pub fn subscribe(&self) -> watch::Receiver<ImageData> {
        self.store.subscribe()
    }
}

impl Drop for UseImageData {
    fn drop(&mut self) {
        for load in self.loads.get_mut().drain(..) {
            load.abort();
        }
    }
}
