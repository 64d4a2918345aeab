//! Error types for the `comets-output` crate.

use comets_logs::LogError;

use crate::config::ConfigError;

/// Errors that can occur while loading a run's output.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// The configuration could not be loaded or is invalid.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// A log could not be read, parsed, or demultiplexed.
    #[error("log error: {source}")]
    Log {
        /// The underlying log error.
        #[from]
        source: LogError,
    },

    /// The engine reported an error, so its logs are not trustworthy.
    #[error("simulation engine reported an error; logs were not read")]
    EngineFailed {
        /// The engine's captured output.
        output: String,
    },
}
