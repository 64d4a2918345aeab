//! Error types for the inspector binary.

use comets_output::{ConfigError, OutputError};

/// Top-level error for the inspector.
#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// Loading the run's logs failed.
    #[error("output error: {source}")]
    Output {
        /// The underlying output error.
        #[from]
        source: OutputError,
    },

    /// The captured engine output could not be read.
    #[error("failed to read engine output {path}: {source}")]
    EngineOutput {
        /// The file named by `COMETS_ENGINE_STDOUT`.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The summary could not be encoded.
    #[error("failed to encode summary: {source}")]
    Encode {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
