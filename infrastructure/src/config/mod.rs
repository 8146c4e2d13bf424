//! Configuration file loading for crosscheck
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. Environment: `CROSSCHECK_*` (nested keys separated by `__`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./crosscheck.toml` or `./.crosscheck.toml`
//! 4. Global: `$XDG_CONFIG_HOME/crosscheck/config.toml`
//! 5. Default values

mod error;
mod file_config;
mod loader;

pub use error::ConfigError;
pub use file_config::{
    FileBackendConfig, FileConfig, FileOrchestrationConfig, FileOutputConfig, FileOutputFormat,
    FileRetryConfig, FileRotationConfig, FileSelectorConfig, FileSelectorRule,
};
pub use loader::ConfigLoader;
