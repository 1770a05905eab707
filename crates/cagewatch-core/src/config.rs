//! Configuration loading and typed config structures for the Cagewatch
//! monitor.
//!
//! The canonical configuration lives in `cagewatch-config.yaml` at the
//! project root. Every section and field is optional; missing values take
//! the defaults below.

use std::path::{Path, PathBuf};

use cagewatch_types::Participant;
use serde::Deserialize;

use crate::scheduler::DEFAULT_FPS;

/// Environment variable that overrides the config file path.
pub const CONFIG_PATH_ENV: &str = "CAGEWATCH_CONFIG";

/// Config file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "cagewatch-config.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level monitor configuration. Mirrors `cagewatch-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MonitorConfig {
    /// Frame loop settings.
    #[serde(default)]
    pub display: DisplayConfig,

    /// The participant directory, in chart column order.
    #[serde(default)]
    pub players: Vec<Participant>,

    /// Event processor settings.
    #[serde(default)]
    pub processor: ProcessorConfig,

    /// Event stream replay settings.
    #[serde(default)]
    pub replay: ReplayConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MonitorConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yml::from_str(&contents)?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// The config path: [`CONFIG_PATH_ENV`] if set, else
    /// [`DEFAULT_CONFIG_PATH`].
    pub fn resolve_path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
    }
}

/// Frame loop configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DisplayConfig {
    /// Target frames per second. Has no effect on game play.
    #[serde(default = "default_fps")]
    pub fps: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { fps: default_fps() }
    }
}

/// Event processor configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProcessorConfig {
    /// Recount every table after each event.
    #[serde(default)]
    pub verify_counts: bool,
}

/// Event stream replay configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReplayConfig {
    /// JSON-lines event file. Standard input when absent.
    #[serde(default)]
    pub events_path: Option<PathBuf>,

    /// Pause between replayed events, in milliseconds.
    #[serde(default)]
    pub event_interval_ms: u64,

    /// Where to write the final chart tables as JSON. Standard output when
    /// absent.
    #[serde(default)]
    pub output_path: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes
    /// precedence when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines instead of the human-readable format.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_fps() -> u32 {
    DEFAULT_FPS
}

fn default_log_level() -> String {
    "info".to_owned()
}
