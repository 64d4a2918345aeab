//! Raw log readers.
//!
//! A reader turns a log file into ordered rows of string tokens and nothing
//! more: arity and type checks belong to the normalizer, which knows the
//! schema. The file is read fully and closed before the rows are returned.

use std::io::ErrorKind;
use std::path::Path;

use comets_types::LogKind;
use tracing::debug;

use crate::error::LogError;

/// How tokens are separated within a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// One or more tab characters (the total-biomass log).
    Tab,
    /// One or more whitespace characters (every other log).
    Whitespace,
}

impl Delimiter {
    /// The delimiter the engine uses for `kind`.
    pub const fn for_kind(kind: LogKind) -> Self {
        match kind {
            LogKind::TotalBiomass => Self::Tab,
            LogKind::Biomass
            | LogKind::Flux
            | LogKind::Media
            | LogKind::SpecificMedia
            | LogKind::Genotypes => Self::Whitespace,
        }
    }

    fn split(self, line: &str) -> Vec<String> {
        match self {
            Self::Tab => line
                .split('\t')
                .filter(|t| !t.is_empty())
                .map(str::to_owned)
                .collect(),
            Self::Whitespace => line.split_whitespace().map(str::to_owned).collect(),
        }
    }
}

/// One non-blank line of a log, split into tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line number in the source text.
    pub line: usize,
    /// The line's tokens, in order.
    pub tokens: Vec<String>,
}

impl RawRow {
    /// The row's tokens joined by single spaces, for error context.
    pub fn joined(&self) -> String {
        self.tokens.join(" ")
    }
}

/// Split log text into rows.
///
/// Each line is trimmed first; blank lines are skipped but still counted so
/// that [`RawRow::line`] matches the file.
pub fn split_rows(text: &str, delimiter: Delimiter) -> Vec<RawRow> {
    text.lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return None;
            }
            Some(RawRow {
                line: idx.saturating_add(1),
                tokens: delimiter.split(trimmed),
            })
        })
        .collect()
}

/// Read the log of `kind` at `path` into rows.
///
/// # Errors
///
/// Returns [`LogError::MissingLogFile`] if the file does not exist, or
/// [`LogError::Io`] if it cannot be read.
pub fn read_rows(path: &Path, kind: LogKind) -> Result<Vec<RawRow>, LogError> {
    let text = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            LogError::MissingLogFile {
                kind,
                path: path.to_path_buf(),
            }
        } else {
            LogError::Io {
                kind,
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let rows = split_rows(&text, Delimiter::for_kind(kind));
    debug!(
        kind = %kind,
        path = %path.display(),
        rows = rows.len(),
        "log file read"
    );
    Ok(rows)
}
