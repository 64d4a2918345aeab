//! Typed rows produced by the schema normalizer.
//!
//! One struct per log format. Sparse formats carry a [`GridCoord`]; a
//! cell/cycle/entity combination absent from the log has value zero.

use serde::{Deserialize, Serialize};

use crate::model::{Cycle, GridCoord};

/// One row of the total-biomass log.
///
/// `biomass` is aligned with the table's model-id columns, in model
/// registration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalBiomassRow {
    /// The cycle this row reports.
    pub cycle: Cycle,
    /// Total biomass per model, in registration order.
    pub biomass: Vec<f64>,
}

/// One row of the spatial biomass log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomassRecord {
    /// The cycle this row reports.
    pub cycle: Cycle,
    /// The cell the biomass lives in.
    pub coord: GridCoord,
    /// Species (model or mutant) id.
    pub species: String,
    /// Biomass in grams.
    pub biomass: f64,
}

/// One row of the media log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    /// Metabolite name.
    pub metabolite: String,
    /// The cycle this row reports.
    pub cycle: Cycle,
    /// The cell the concentration was measured in.
    pub coord: GridCoord,
    /// Concentration in mmol.
    pub concentration: f64,
}

/// One row of the flux log before demultiplexing.
///
/// `values` holds every trailing column, including padding; which of them
/// are meaningful depends on the model `model_index` points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFluxRecord {
    /// 1-based line in the flux log, kept for error context.
    pub line: usize,
    /// The row as written, tokens joined by single spaces.
    pub raw: String,
    /// The cycle this row reports.
    pub cycle: Cycle,
    /// The cell the fluxes were computed in.
    pub coord: GridCoord,
    /// 1-based position of the model in the registration order.
    pub model_index: usize,
    /// Flux values, possibly zero-padded past the model's reaction count.
    pub values: Vec<f64>,
}

/// One row of a per-model flux table.
///
/// `fluxes` has exactly one entry per reaction of the owning model, in
/// reaction-name order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluxRecord {
    /// The cycle this row reports.
    pub cycle: Cycle,
    /// The cell the fluxes were computed in.
    pub coord: GridCoord,
    /// Flux per reaction, in the model's reaction order.
    pub fluxes: Vec<f64>,
}

/// One lineage event from the genotypes log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenotypeRecord {
    /// The species the mutant descends from.
    pub ancestor: String,
    /// Engine-defined mutation descriptor.
    pub mutation: String,
    /// The new species id.
    pub species: String,
}
