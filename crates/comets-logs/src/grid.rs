//! Sparse-to-dense spatial grid reconstruction.
//!
//! The spatial logs omit cells whose value is zero. A snapshot for one
//! cycle and one entity (species, metabolite, or reaction) is rebuilt in two
//! steps: the matching records are collected into a coordinate -> value map,
//! then a zeroed grid of the layout shape is filled from that map in a
//! single pass. Cost is linear in the number of records.
//!
//! Two records for the same cell, cycle, and entity should not occur. When
//! they do, the later record in the log wins; this mirrors the engine's
//! post-processing and most likely points at an upstream data problem.

use std::collections::{BTreeMap, BTreeSet};

use comets_types::{Cycle, EntityKind, GridCoord, GridShape, LogKind};
use ndarray::Array2;

use crate::error::LogError;
use crate::query;
use crate::tables::{BiomassTable, FluxTable, MediaTable};

/// A dense `rows x columns` snapshot, indexed `[x - 1, y - 1]`.
pub type Grid = Array2<f64>;

/// A sparse table that can be projected onto the grid.
pub trait SpatialTable {
    /// The log this table was read from.
    fn log_kind(&self) -> LogKind;

    /// What kind of name selects values in this table.
    fn entity_kind(&self) -> EntityKind;

    /// Distinct cycles with at least one record.
    fn recorded_cycles(&self) -> &BTreeSet<Cycle>;

    /// Whether `entity` names a real category or column of this table.
    fn has_entity(&self, entity: &str) -> bool;

    /// The `(coordinate, value)` pairs of `entity` at `cycle`, in log order.
    fn cells<'a>(
        &'a self,
        cycle: Cycle,
        entity: &'a str,
    ) -> impl Iterator<Item = (GridCoord, f64)> + 'a;
}

impl SpatialTable for BiomassTable {
    fn log_kind(&self) -> LogKind {
        LogKind::Biomass
    }

    fn entity_kind(&self) -> EntityKind {
        EntityKind::Species
    }

    fn recorded_cycles(&self) -> &BTreeSet<Cycle> {
        self.cycles()
    }

    fn has_entity(&self, entity: &str) -> bool {
        self.species().contains(entity)
    }

    fn cells<'a>(
        &'a self,
        cycle: Cycle,
        entity: &'a str,
    ) -> impl Iterator<Item = (GridCoord, f64)> + 'a {
        self.records()
            .iter()
            .filter(move |r| r.cycle == cycle && r.species == entity)
            .map(|r| (r.coord, r.biomass))
    }
}

impl SpatialTable for MediaTable {
    fn log_kind(&self) -> LogKind {
        LogKind::Media
    }

    fn entity_kind(&self) -> EntityKind {
        EntityKind::Metabolite
    }

    fn recorded_cycles(&self) -> &BTreeSet<Cycle> {
        self.cycles()
    }

    fn has_entity(&self, entity: &str) -> bool {
        self.metabolites().contains(entity)
    }

    fn cells<'a>(
        &'a self,
        cycle: Cycle,
        entity: &'a str,
    ) -> impl Iterator<Item = (GridCoord, f64)> + 'a {
        self.records()
            .iter()
            .filter(move |r| r.cycle == cycle && r.metabolite == entity)
            .map(|r| (r.coord, r.concentration))
    }
}

impl SpatialTable for FluxTable {
    fn log_kind(&self) -> LogKind {
        LogKind::Flux
    }

    fn entity_kind(&self) -> EntityKind {
        EntityKind::Reaction
    }

    fn recorded_cycles(&self) -> &BTreeSet<Cycle> {
        self.cycles()
    }

    fn has_entity(&self, entity: &str) -> bool {
        self.reaction_position(entity).is_some()
    }

    fn cells<'a>(
        &'a self,
        cycle: Cycle,
        entity: &'a str,
    ) -> impl Iterator<Item = (GridCoord, f64)> + 'a {
        let position = self.reaction_position(entity);
        self.records()
            .iter()
            .filter(move |r| r.cycle == cycle)
            .filter_map(move |r| {
                let value = r.fluxes.get(position?)?;
                Some((r.coord, *value))
            })
    }
}

/// Rebuild the dense grid of `entity` at `cycle`.
///
/// Cells without a record are zero.
///
/// # Errors
///
/// Returns [`LogError::CycleNotRecorded`] if `cycle` has no record in the
/// table, [`LogError::UnknownEntity`] if `entity` is not one of the table's
/// categories, and [`LogError::OutOfGrid`] if a matching record does not
/// fit `shape`.
pub fn reconstruct<T: SpatialTable>(
    table: &T,
    cycle: Cycle,
    entity: &str,
    shape: GridShape,
) -> Result<Grid, LogError> {
    query::require_cycle(table.recorded_cycles(), table.log_kind(), cycle)?;
    query::require_entity(table, entity)?;
    fill(table, cycle, entity, shape)
}

/// Rebuild the dense grid without the cycle and entity checks.
///
/// For callers that validated the query against a wider context first,
/// such as a configured model that never appears in the log.
///
/// # Errors
///
/// Returns [`LogError::OutOfGrid`] if a matching record does not fit
/// `shape`.
pub fn fill<T: SpatialTable>(
    table: &T,
    cycle: Cycle,
    entity: &str,
    shape: GridShape,
) -> Result<Grid, LogError> {
    let mut cells: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for (coord, value) in table.cells(cycle, entity) {
        let index = coord.to_index(shape).ok_or(LogError::OutOfGrid {
            kind: table.log_kind(),
            coord,
            shape,
        })?;
        cells.insert(index, value);
    }

    let mut grid = Grid::zeros(shape.dims());
    for (index, value) in cells {
        if let Some(cell) = grid.get_mut(index) {
            *cell = value;
        }
    }
    Ok(grid)
}
