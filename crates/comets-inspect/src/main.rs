//! Inspector for a finished COMETS run.
//!
//! Loads the run described by the output configuration, reads every log
//! it requested, and prints a JSON summary of the loaded tables to stdout.
//!
//! # Environment
//!
//! - `COMETS_OUTPUT_CONFIG` -- config path (default `comets-output.yaml`)
//! - `COMETS_ENGINE_STDOUT` -- optional file holding the engine's captured
//!   output; loading is refused if it reports an error
//! - `COMETS_WORKING_DIR` -- overrides `run.working_dir`
//! - `RUST_LOG` -- log filter (default `info`)

mod error;

use std::path::{Path, PathBuf};

use comets_output::{OutputConfig, RunOutput};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::InspectError;

/// Environment variable naming the config file.
const CONFIG_ENV: &str = "COMETS_OUTPUT_CONFIG";

/// Environment variable naming the captured engine output.
const ENGINE_STDOUT_ENV: &str = "COMETS_ENGINE_STDOUT";

const DEFAULT_CONFIG: &str = "comets-output.yaml";

fn main() -> Result<(), InspectError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let config_path =
        std::env::var(CONFIG_ENV).map_or_else(|_| PathBuf::from(DEFAULT_CONFIG), PathBuf::from);
    let config = OutputConfig::from_file(&config_path)?;
    info!(
        config = %config_path.display(),
        run = ?config.run.id,
        working_dir = %config.run.working_dir.display(),
        grid = %config.layout.grid,
        models = config.models.len(),
        "Configuration loaded"
    );

    let output = match std::env::var(ENGINE_STDOUT_ENV) {
        Ok(path) => {
            let engine_output = read_engine_output(Path::new(&path))?;
            RunOutput::load_after_engine(&config, &engine_output)?
        }
        Err(_) => RunOutput::load(&config)?,
    };

    for rejected in output.rejected_rows() {
        warn!(error = %rejected, "Row rejected");
    }
    let summary = output.summary();
    info!(
        run = %summary.run_id,
        logs = summary.logs.len(),
        rejected = output.rejected_rows().len(),
        "Run output loaded"
    );

    let json = serde_json::to_string_pretty(&summary)?;
    println!("{json}");
    Ok(())
}

fn read_engine_output(path: &Path) -> Result<String, InspectError> {
    std::fs::read_to_string(path).map_err(|source| InspectError::EngineOutput {
        path: path.display().to_string(),
        source,
    })
}
