//! Error types for the `comets-logs` crate.
//!
//! All fallible operations in this crate return [`LogError`]. Every variant
//! is raised at the point of detection and propagated to the caller; a table
//! or grid that is returned is fully valid.

use std::path::PathBuf;

use comets_types::{Cycle, EntityKind, GridCoord, GridShape, LogKind};

/// Errors that can occur while reading, normalizing, or querying logs.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// A requested log's file does not exist.
    #[error("{kind} log file not found: {}", path.display())]
    MissingLogFile {
        /// Which log was expected.
        kind: LogKind,
        /// Where it was expected.
        path: PathBuf,
    },

    /// The log file exists but could not be read.
    #[error("failed to read {kind} log {}: {source}", path.display())]
    Io {
        /// Which log was being read.
        kind: LogKind,
        /// The file being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A row does not match the expected arity or types of its log kind.
    #[error("corrupt {kind} log line {line}: {reason} (raw: {raw:?})")]
    CorruptLine {
        /// Which log the row came from.
        kind: LogKind,
        /// 1-based line number in the log file.
        line: usize,
        /// The raw row, tokens joined by single spaces.
        raw: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A coordinate falls outside the declared grid shape.
    #[error("{kind} record at {coord} lies outside the {shape} grid")]
    OutOfGrid {
        /// Which log the record came from.
        kind: LogKind,
        /// The offending 1-based coordinate.
        coord: GridCoord,
        /// The declared grid shape.
        shape: GridShape,
    },

    /// The metabolite is not part of the layout's media.
    #[error("metabolite {0} is not allocated in the layout media")]
    UnallocatedMetabolite(String),

    /// A model, species, metabolite, or reaction name is not known.
    #[error("{kind} {name} is not known to the {log} log")]
    UnknownEntity {
        /// What kind of name was queried.
        kind: EntityKind,
        /// The queried name.
        name: String,
        /// The log the query targeted.
        log: LogKind,
    },

    /// The log holds no rows for the requested cycle.
    #[error("{kind} log was not saved at cycle {cycle}; try another recorded cycle")]
    CycleNotRecorded {
        /// The queried log.
        kind: LogKind,
        /// The requested cycle.
        cycle: Cycle,
    },

    /// The log kind was not requested for this run.
    #[error("{0} log was not recorded during the simulation")]
    LogNotRecorded(LogKind),
}
