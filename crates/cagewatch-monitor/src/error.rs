//! Error types for the monitor binary.
//!
//! [`MonitorError`] is the top-level error type that wraps every failure
//! mode during startup, replay, and report export.

/// Top-level error for the monitor binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: cagewatch_core::config::ConfigError,
    },

    /// The visualization could not be built or its frame loop failed.
    #[error("visualization error: {source}")]
    Visualization {
        /// The underlying visualization error.
        #[from]
        source: cagewatch_core::visualization::VisualizationError,
    },

    /// An event line could not be decoded or enqueued.
    #[error("event stream error on line {line}: {source}")]
    EventStream {
        /// One-based line number in the event stream.
        line: usize,
        /// The underlying queue error.
        source: cagewatch_core::queue::QueueError,
    },

    /// Reading the event stream or writing the report failed.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The chart report could not be serialized.
    #[error("report serialization error: {source}")]
    Report {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// The replay task panicked.
    #[error("replay task failed: {source}")]
    Replay {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },
}
