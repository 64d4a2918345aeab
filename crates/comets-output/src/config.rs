//! Configuration loading and typed config structures for one run's output.
//!
//! The configuration lives in a YAML file (conventionally
//! `comets-output.yaml`) written by whoever launched the engine. It names
//! the models in registration order, the layout's grid shape and media, the
//! logs that were requested, and where the run wrote them.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use comets_logs::OutOfGridPolicy;
use comets_types::{GridShape, LogKind, Model, RunId};
use serde::Deserialize;

/// Environment variable overriding `run.working_dir`.
pub const WORKING_DIR_ENV: &str = "COMETS_WORKING_DIR";

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

    /// The configuration parsed but is not usable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level output configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OutputConfig {
    /// Run identity and file handling.
    #[serde(default)]
    pub run: RunConfig,

    /// Grid shape and media of the layout.
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Models in registration order.
    #[serde(default)]
    pub models: Vec<Model>,

    /// Which logs the engine was asked to write.
    #[serde(default)]
    pub logs: LogRequests,

    /// Handling of questionable records.
    #[serde(default)]
    pub policy: PolicyConfig,
}

impl OutputConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `COMETS_WORKING_DIR` overrides `run.working_dir`. The result is
    /// validated before it is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.run.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the output layer relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a missing run id, an empty grid
    /// dimension, duplicate model ids, or no models while a model-dependent
    /// log is requested.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.run.require_id()?;

        if !self.layout.grid.is_valid() {
            return Err(ConfigError::Invalid(format!(
                "grid dimensions must be positive, got {}",
                self.layout.grid
            )));
        }

        let mut seen = BTreeSet::new();
        for model in &self.models {
            if !seen.insert(model.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate model id {}",
                    model.id
                )));
            }
        }

        let logs = self.logs.effective();
        let needs_models = [LogKind::TotalBiomass, LogKind::Flux]
            .into_iter()
            .any(|kind| logs.is_requested(kind));
        if needs_models && self.models.is_empty() {
            return Err(ConfigError::Invalid(
                "total biomass and flux logs need at least one model".to_owned(),
            ));
        }

        Ok(())
    }

    /// Model ids in registration order.
    pub fn model_ids(&self) -> Vec<String> {
        self.models.iter().map(|m| m.id.clone()).collect()
    }
}

/// Run identity and file handling.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    /// Run id suffixing every log name. Required: it is the only way to
    /// find the run's logs.
    #[serde(default)]
    pub id: Option<RunId>,

    /// Directory the engine wrote its logs into.
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,

    /// Delete each log file once it has been read.
    #[serde(default = "default_true")]
    pub delete_files: bool,
}

impl RunConfig {
    /// The configured run id.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `id` is absent.
    pub fn require_id(&self) -> Result<RunId, ConfigError> {
        self.id.ok_or_else(|| {
            ConfigError::Invalid(
                "run.id is required to locate the run's log files".to_owned(),
            )
        })
    }

    /// Override fields from the environment.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var(WORKING_DIR_ENV) {
            self.working_dir = PathBuf::from(dir);
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            id: None,
            working_dir: default_working_dir(),
            delete_files: true,
        }
    }
}

/// The part of the layout the output layer reads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LayoutConfig {
    /// Grid shape as `[rows, columns]`.
    #[serde(default = "default_grid")]
    pub grid: GridShape,

    /// Metabolites allocated in the layout media.
    ///
    /// When empty, metabolite queries are checked against the names that
    /// appear in the media log instead.
    #[serde(default)]
    pub metabolites: Vec<String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            grid: default_grid(),
            metabolites: Vec::new(),
        }
    }
}

/// Which logs the engine was asked to write.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogRequests {
    /// Total biomass per model per cycle.
    #[serde(default = "default_true")]
    pub total_biomass: bool,

    /// Per-cell biomass.
    #[serde(default)]
    pub biomass: bool,

    /// Per-cell fluxes.
    #[serde(default)]
    pub flux: bool,

    /// Per-cell media concentrations.
    #[serde(default)]
    pub media: bool,

    /// Selected media values, header-bearing.
    #[serde(default)]
    pub specific_media: bool,

    /// File name of the specific-media log, when not the run default.
    #[serde(default)]
    pub specific_media_name: Option<String>,

    /// Whether the engine ran with evolution enabled.
    #[serde(default)]
    pub evolution: bool,
}

impl LogRequests {
    /// The requests the engine actually honors.
    ///
    /// With evolution on, the engine writes the per-cell biomass log
    /// instead of the total-biomass log, plus the genotypes log.
    pub fn effective(&self) -> Self {
        let mut logs = self.clone();
        if logs.evolution {
            logs.total_biomass = false;
            logs.biomass = true;
        }
        logs
    }

    /// Whether `kind` was requested.
    pub const fn is_requested(&self, kind: LogKind) -> bool {
        match kind {
            LogKind::TotalBiomass => self.total_biomass,
            LogKind::Biomass => self.biomass,
            LogKind::Flux => self.flux,
            LogKind::Media => self.media,
            LogKind::SpecificMedia => self.specific_media,
            LogKind::Genotypes => self.evolution,
        }
    }
}

impl Default for LogRequests {
    fn default() -> Self {
        Self {
            total_biomass: true,
            biomass: false,
            flux: false,
            media: false,
            specific_media: false,
            specific_media_name: None,
            evolution: false,
        }
    }
}

/// Handling of questionable records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PolicyConfig {
    /// What to do with a record outside the grid: reject the row alone
    /// (`collect`, the default) or fail the whole table (`abort`).
    #[serde(default)]
    pub out_of_grid: OutOfGridPolicy,
}

fn default_working_dir() -> PathBuf {
    PathBuf::from(".")
}

const fn default_true() -> bool {
    true
}

const fn default_grid() -> GridShape {
    GridShape::new(1, 1)
}
