//! Run-scoped log file names.
//!
//! Every log name carries the run id, so concurrent or successive runs in
//! one working directory never read each other's output. The genotypes log
//! name is derived by the engine from the biomass log name.

use std::path::{Path, PathBuf};

use comets_types::{LogKind, RunId};

/// Where each log of one run lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogPaths {
    total_biomass: PathBuf,
    biomass: PathBuf,
    flux: PathBuf,
    media: PathBuf,
    specific_media: PathBuf,
    genotypes: PathBuf,
}

impl LogPaths {
    /// Derive the log paths of run `run_id` inside `working_dir`.
    ///
    /// `specific_media_name` overrides the default specific-media file name.
    pub fn for_run(working_dir: &Path, run_id: RunId, specific_media_name: Option<&str>) -> Self {
        let suffix = run_id.log_suffix();
        let biomass_name = format!("biomass_log_{suffix}");
        let specific_media = specific_media_name
            .map_or_else(|| format!("specific_media_log_{suffix}"), str::to_owned);

        Self {
            total_biomass: working_dir.join(format!("total_biomass_log_{suffix}")),
            genotypes: working_dir.join(format!("GENOTYPES_{biomass_name}")),
            biomass: working_dir.join(biomass_name),
            flux: working_dir.join(format!("flux_log_{suffix}")),
            media: working_dir.join(format!("media_log_{suffix}")),
            specific_media: working_dir.join(specific_media),
        }
    }

    /// The path of the log of `kind`.
    pub fn path(&self, kind: LogKind) -> &Path {
        match kind {
            LogKind::TotalBiomass => &self.total_biomass,
            LogKind::Biomass => &self.biomass,
            LogKind::Flux => &self.flux,
            LogKind::Media => &self.media,
            LogKind::SpecificMedia => &self.specific_media,
            LogKind::Genotypes => &self.genotypes,
        }
    }
}
