//! Configuration file loading for parley
//!
//! This module handles file I/O and merging of configuration from multiple
//! sources, then resolves the merged file config together with command-line
//! overrides into provider settings. The priority order (highest to lowest):
//!
//! 1. Command-line flags
//! 2. `PARLEY_*` environment variables
//! 3. `--config <path>` specified file
//! 4. Project root: `./parley.toml` or `./.parley.toml`
//! 5. Global: `$XDG_CONFIG_HOME/parley/config.toml`
//! 6. Default values

mod file_config;
mod loader;
mod resolve;

pub use file_config::{
    ConfigValidationError, FileChatConfig, FileConfig, FileProviderConfig, FileProvidersConfig,
};
pub use loader::{ConfigLoader, expand_home};
pub use resolve::{ChatOverrides, HistoryChoice, ResolvedChat, resolve_api_key};
