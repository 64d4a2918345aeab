//! The per-run result object.
//!
//! [`RunOutput::load`] reads every log the run requested, normalizes it,
//! and demultiplexes the flux log. Only once every requested log has loaded
//! are the files (optionally) deleted, so a failed load leaves the run's
//! output on disk to be read again. The loaded tables stay in memory for
//! the lifetime of the [`RunOutput`]; nothing is persisted.
//!
//! Rows outside the grid are rejected one by one under the default policy
//! and kept as typed errors next to the tables, see
//! [`RunOutput::rejected_rows`].
//!
//! The image accessors check their arguments in a fixed order (log
//! recorded, entity known, cycle recorded) and raise the first failure, so
//! a bad query never yields an all-zero grid.

use std::collections::BTreeMap;
use std::path::Path;

use comets_logs::grid::{self, Grid};
use comets_logs::normalize::{self, NormalizeOptions, Normalized};
use comets_logs::{
    BiomassTable, FluxTable, FluxTables, GenotypeTable, LogError, MediaTable, RawFluxTable,
    RawRow, SpatialTable, SpecificMediaTable, TotalBiomassTable, flux, query, read_rows,
};
use comets_types::{Cycle, EntityKind, GridShape, LogKind, Model, RunId};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::OutputConfig;
use crate::error::OutputError;
use crate::paths::LogPaths;

/// Marker the engine prints when a simulation fails.
pub const ENGINE_ERROR_MARKER: &str = "Error";

/// Everything one simulation run produced.
#[derive(Debug)]
pub struct RunOutput {
    run_id: RunId,
    shape: GridShape,
    models: Vec<Model>,
    metabolites: Vec<String>,
    total_biomass: Option<TotalBiomassTable>,
    biomass: Option<BiomassTable>,
    raw_flux: Option<RawFluxTable>,
    fluxes: Option<FluxTables>,
    media: Option<MediaTable>,
    specific_media: Option<SpecificMediaTable>,
    genotypes: Option<GenotypeTable>,
    rejected: Vec<LogError>,
}

impl RunOutput {
    /// Load the logs of a finished run.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::Config`] if `run.id` is not set,
    /// [`OutputError::Log`] with [`LogError::MissingLogFile`] if a requested
    /// log is absent, or any normalization failure. On error no log file
    /// is deleted.
    pub fn load(config: &OutputConfig) -> Result<Self, OutputError> {
        let run_id = config.run.require_id()?;
        let paths = LogPaths::for_run(
            &config.run.working_dir,
            run_id,
            config.logs.specific_media_name.as_deref(),
        );
        let logs = config.logs.effective();
        let opts = NormalizeOptions {
            shape: config.layout.grid,
            out_of_grid: config.policy.out_of_grid,
        };

        let mut output = Self {
            run_id,
            shape: config.layout.grid,
            models: config.models.clone(),
            metabolites: config.layout.metabolites.clone(),
            total_biomass: None,
            biomass: None,
            raw_flux: None,
            fluxes: None,
            media: None,
            specific_media: None,
            genotypes: None,
            rejected: Vec::new(),
        };

        let mut consumed = Vec::new();
        for kind in LogKind::ALL {
            if !logs.is_requested(kind) {
                continue;
            }
            let path = paths.path(kind);
            let rows = read_rows(path, kind)?;
            output.ingest(kind, &rows, config, opts)?;
            consumed.push((kind, path));
        }

        if config.run.delete_files {
            for (kind, path) in consumed {
                remove_log(path, kind);
            }
        }

        Ok(output)
    }

    /// Normalize the rows of one log and store the resulting table.
    fn ingest(
        &mut self,
        kind: LogKind,
        rows: &[RawRow],
        config: &OutputConfig,
        opts: NormalizeOptions,
    ) -> Result<(), LogError> {
        let run = self.run_id;
        match kind {
            LogKind::TotalBiomass => {
                let table = normalize::total_biomass(rows, &config.model_ids())?;
                info!(run = %run, rows = table.len(), "total biomass log loaded");
                self.total_biomass = Some(table);
            }
            LogKind::Flux => {
                let normalized = normalize::raw_flux(rows, flux::max_cols(&self.models), opts)?;
                let raw = self.keep(normalized);
                let tables = flux::demultiplex(&raw, &self.models)?;
                info!(run = %run, rows = raw.len(), models = tables.len(), "flux log loaded");
                self.raw_flux = Some(raw);
                self.fluxes = Some(tables);
            }
            LogKind::Media => {
                let table = self.keep(normalize::media(rows, opts)?);
                info!(
                    run = %run,
                    rows = table.len(),
                    metabolites = table.metabolites().len(),
                    "media log loaded"
                );
                self.media = Some(table);
            }
            LogKind::Biomass => {
                let table = self.keep(normalize::biomass(rows, opts)?);
                info!(run = %run, rows = table.len(), "biomass log loaded");
                self.biomass = Some(table);
            }
            LogKind::Genotypes => {
                let table = normalize::genotypes(rows)?;
                info!(run = %run, mutants = table.len(), "genotypes log loaded");
                self.genotypes = Some(table);
            }
            LogKind::SpecificMedia => {
                let table = normalize::specific_media(rows)?;
                info!(
                    run = %run,
                    rows = table.len(),
                    columns = table.columns().len(),
                    "specific media log loaded"
                );
                self.specific_media = Some(table);
            }
        }
        Ok(())
    }

    /// Set aside the rejected rows of a normalized table and return the table.
    fn keep<T>(&mut self, normalized: Normalized<T>) -> T {
        if !normalized.rejected.is_empty() {
            info!(
                run = %self.run_id,
                rejected = normalized.rejected.len(),
                "rows outside the grid rejected"
            );
        }
        self.rejected.extend(normalized.rejected);
        normalized.table
    }

    /// Load the logs only if the engine's captured output reports success.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::EngineFailed`] if `engine_output` contains
    /// [`ENGINE_ERROR_MARKER`]; otherwise as [`RunOutput::load`].
    pub fn load_after_engine(
        config: &OutputConfig,
        engine_output: &str,
    ) -> Result<Self, OutputError> {
        if engine_output.contains(ENGINE_ERROR_MARKER) {
            return Err(OutputError::EngineFailed {
                output: engine_output.to_owned(),
            });
        }
        Self::load(config)
    }

    // -------------------------------------------------------------------
    // Tables
    // -------------------------------------------------------------------

    /// The id of the run these logs belong to.
    pub const fn run_id(&self) -> RunId {
        self.run_id
    }

    /// The layout's grid shape.
    pub const fn grid_shape(&self) -> GridShape {
        self.shape
    }

    /// The models, in registration order.
    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// The total-biomass table.
    pub fn total_biomass(&self) -> Result<&TotalBiomassTable, LogError> {
        query::require_recorded(self.total_biomass.as_ref(), LogKind::TotalBiomass)
    }

    /// The spatial biomass table.
    pub fn biomass(&self) -> Result<&BiomassTable, LogError> {
        query::require_recorded(self.biomass.as_ref(), LogKind::Biomass)
    }

    /// The flux log as written, before demultiplexing.
    pub fn raw_fluxes(&self) -> Result<&RawFluxTable, LogError> {
        query::require_recorded(self.raw_flux.as_ref(), LogKind::Flux)
    }

    /// Per-model flux tables keyed by model id.
    pub fn fluxes_by_model(&self) -> Result<&FluxTables, LogError> {
        query::require_recorded(self.fluxes.as_ref(), LogKind::Flux)
    }

    /// The flux table of one model.
    pub fn fluxes_of(&self, model_id: &str) -> Result<&FluxTable, LogError> {
        let tables = self.fluxes_by_model()?;
        tables.get(model_id).ok_or_else(|| LogError::UnknownEntity {
            kind: EntityKind::Model,
            name: model_id.to_owned(),
            log: LogKind::Flux,
        })
    }

    /// The media table.
    pub fn media(&self) -> Result<&MediaTable, LogError> {
        query::require_recorded(self.media.as_ref(), LogKind::Media)
    }

    /// The specific-media table.
    pub fn specific_media(&self) -> Result<&SpecificMediaTable, LogError> {
        query::require_recorded(self.specific_media.as_ref(), LogKind::SpecificMedia)
    }

    /// The genotypes table.
    pub fn genotypes(&self) -> Result<&GenotypeTable, LogError> {
        query::require_recorded(self.genotypes.as_ref(), LogKind::Genotypes)
    }

    /// Rows rejected while loading, one [`LogError::OutOfGrid`] each, in
    /// load order.
    pub fn rejected_rows(&self) -> &[LogError] {
        &self.rejected
    }

    /// Number of rejected rows of one log.
    pub fn rejected_count(&self, kind: LogKind) -> usize {
        self.rejected
            .iter()
            .filter(|e| matches!(e, LogError::OutOfGrid { kind: k, .. } if *k == kind))
            .count()
    }

    // -------------------------------------------------------------------
    // Images
    // -------------------------------------------------------------------

    /// Concentration grid of `metabolite` at `cycle`.
    ///
    /// # Errors
    ///
    /// [`LogError::LogNotRecorded`], then
    /// [`LogError::UnallocatedMetabolite`], then
    /// [`LogError::CycleNotRecorded`].
    pub fn metabolite_image(&self, metabolite: &str, cycle: Cycle) -> Result<Grid, LogError> {
        let media = self.media()?;
        if self.metabolites.is_empty() {
            if !media.has_entity(metabolite) {
                return Err(LogError::UnallocatedMetabolite(metabolite.to_owned()));
            }
        } else {
            query::require_metabolite(&self.metabolites, metabolite)?;
        }
        query::require_cycle(media.cycles(), LogKind::Media, cycle)?;
        grid::fill(media, cycle, metabolite, self.shape)
    }

    /// Biomass grid of `model_id` at `cycle`.
    ///
    /// Accepts configured model ids and any species id in the biomass log,
    /// which includes mutants under evolution.
    ///
    /// # Errors
    ///
    /// [`LogError::LogNotRecorded`], then [`LogError::UnknownEntity`], then
    /// [`LogError::CycleNotRecorded`].
    pub fn biomass_image(&self, model_id: &str, cycle: Cycle) -> Result<Grid, LogError> {
        let biomass = self.biomass()?;
        let known = self.models.iter().any(|m| m.id == model_id) || biomass.has_entity(model_id);
        if !known {
            return Err(LogError::UnknownEntity {
                kind: EntityKind::Model,
                name: model_id.to_owned(),
                log: LogKind::Biomass,
            });
        }
        query::require_cycle(biomass.cycles(), LogKind::Biomass, cycle)?;
        grid::fill(biomass, cycle, model_id, self.shape)
    }

    /// Flux grid of `reaction_id` of `model_id` at `cycle`.
    ///
    /// # Errors
    ///
    /// [`LogError::LogNotRecorded`], then [`LogError::UnknownEntity`] for
    /// the model, then [`LogError::CycleNotRecorded`] for that model's
    /// table, then [`LogError::UnknownEntity`] for the reaction.
    pub fn flux_image(
        &self,
        model_id: &str,
        reaction_id: &str,
        cycle: Cycle,
    ) -> Result<Grid, LogError> {
        self.fluxes_by_model()?;
        query::require_model(&self.models, model_id, LogKind::Flux)?;
        let table = self.fluxes_of(model_id)?;
        query::require_cycle(table.cycles(), LogKind::Flux, cycle)?;
        query::require_reaction(table, reaction_id)?;
        grid::fill(table, cycle, reaction_id, self.shape)
    }

    // -------------------------------------------------------------------
    // Summary
    // -------------------------------------------------------------------

    /// Row counts and recorded cycles of every loaded log.
    pub fn summary(&self) -> RunSummary {
        let mut logs = BTreeMap::new();
        if let Some(t) = &self.total_biomass {
            logs.insert(
                LogKind::TotalBiomass,
                LogSummary::new(t.len(), t.cycles().into_iter().collect()),
            );
        }
        if let Some(t) = &self.biomass {
            logs.insert(
                LogKind::Biomass,
                LogSummary::new(t.len(), t.cycles().iter().copied().collect()),
            );
        }
        if let Some(t) = &self.raw_flux {
            let cycles = t
                .records()
                .iter()
                .map(|r| r.cycle)
                .collect::<std::collections::BTreeSet<_>>();
            logs.insert(
                LogKind::Flux,
                LogSummary::new(t.len(), cycles.into_iter().collect()),
            );
        }
        if let Some(t) = &self.media {
            logs.insert(
                LogKind::Media,
                LogSummary::new(t.len(), t.cycles().iter().copied().collect()),
            );
        }
        if let Some(t) = &self.specific_media {
            logs.insert(LogKind::SpecificMedia, LogSummary::new(t.len(), Vec::new()));
        }
        if let Some(t) = &self.genotypes {
            logs.insert(LogKind::Genotypes, LogSummary::new(t.len(), Vec::new()));
        }

        for (kind, log) in &mut logs {
            log.rejected = self.rejected_count(*kind);
        }

        let flux_rows = self
            .fluxes
            .iter()
            .flat_map(FluxTables::iter)
            .map(|t| (t.model_id().to_owned(), t.len()))
            .collect();

        RunSummary {
            run_id: self.run_id,
            grid: self.shape,
            logs,
            flux_rows,
        }
    }
}

/// Overview of a loaded run, suitable for printing as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// The run the logs belong to.
    pub run_id: RunId,
    /// The layout's grid shape.
    pub grid: GridShape,
    /// One entry per loaded log.
    pub logs: BTreeMap<LogKind, LogSummary>,
    /// Rows per model after flux demultiplexing, in registration order.
    pub flux_rows: Vec<(String, usize)>,
}

/// Size of one loaded log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogSummary {
    /// Number of normalized rows.
    pub rows: usize,
    /// Distinct cycles, ascending; empty for logs without a cycle column.
    pub cycles: Vec<Cycle>,
    /// Rows rejected for lying outside the grid.
    pub rejected: usize,
}

impl LogSummary {
    const fn new(rows: usize, cycles: Vec<Cycle>) -> Self {
        Self {
            rows,
            cycles,
            rejected: 0,
        }
    }
}

/// Delete a consumed log; a failure here does not invalidate the tables.
fn remove_log(path: &Path, kind: LogKind) {
    if let Err(e) = std::fs::remove_file(path) {
        warn!(
            kind = %kind,
            path = %path.display(),
            error = %e,
            "failed to delete log file"
        );
    }
}
