//! Reactive state adapters ("hooks") over external capabilities.
//!
//! Every adapter follows the same shape: it owns a [`store::Store`],
//! drives it from one injected capability (a [`fetch::Requester`], a
//! [`timer::Timer`], a [`storage::StorageAccessor`], a
//! [`clipboard::ClipboardWriter`]) and stops touching it once torn down.

pub mod clipboard;
pub mod config;
pub mod fetch;
pub mod image;
pub mod logging;
pub mod storage;
pub mod store;
pub mod task;
pub mod throttle;
pub mod timeout;
pub mod timer;
