//! TOML configuration for the adapters and the CLI.

mod loader;
mod types;

pub use loader::ConfigError;
pub use types::{ClipboardConfig, Config, FetchConfig, StorageConfig};
