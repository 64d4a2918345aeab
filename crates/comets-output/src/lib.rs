//! Per-run result object for COMETS simulation output.
//!
//! A caller that has just run the engine builds an [`OutputConfig`] (or
//! loads one from YAML), then calls [`RunOutput::load`] to read every log
//! the run requested. The resulting [`RunOutput`] exposes the normalized
//! tables and reconstructs dense grids on demand.
//!
//! # Modules
//!
//! - [`config`] -- YAML configuration with environment overrides.
//! - [`paths`] -- Run-scoped log file names.
//! - [`output`] -- [`RunOutput`] and its summary.
//! - [`error`] -- The [`OutputError`] type.

pub mod config;
pub mod error;
pub mod output;
pub mod paths;

pub use config::{ConfigError, LayoutConfig, LogRequests, OutputConfig, PolicyConfig, RunConfig};
pub use error::OutputError;
pub use output::{LogSummary, RunOutput, RunSummary};
pub use paths::LogPaths;
