//! Existence checks shared by grid reconstruction and the run output.
//!
//! Each check either passes or raises its own narrowly-scoped
//! [`LogError`]; none of them returns a sentinel. A missing log or a bad
//! query parameter therefore cannot turn into an all-zero grid that looks
//! valid.

use std::collections::BTreeSet;

use comets_types::{Cycle, EntityKind, LogKind, Model};

use crate::error::LogError;
use crate::grid::SpatialTable;
use crate::tables::FluxTable;

/// The table of a log kind, if that log was recorded.
///
/// # Errors
///
/// Returns [`LogError::LogNotRecorded`] when `table` is `None`.
pub fn require_recorded<T>(table: Option<&T>, kind: LogKind) -> Result<&T, LogError> {
    table.ok_or(LogError::LogNotRecorded(kind))
}

/// Check that `cycle` is among the cycles a log recorded.
///
/// # Errors
///
/// Returns [`LogError::CycleNotRecorded`] otherwise.
pub fn require_cycle(
    cycles: &BTreeSet<Cycle>,
    kind: LogKind,
    cycle: Cycle,
) -> Result<(), LogError> {
    if cycles.contains(&cycle) {
        Ok(())
    } else {
        Err(LogError::CycleNotRecorded { kind, cycle })
    }
}

/// Check that `entity` is one of a spatial table's categories.
///
/// # Errors
///
/// Returns [`LogError::UnknownEntity`] otherwise.
pub fn require_entity<T: SpatialTable>(table: &T, entity: &str) -> Result<(), LogError> {
    if table.has_entity(entity) {
        Ok(())
    } else {
        Err(LogError::UnknownEntity {
            kind: table.entity_kind(),
            name: entity.to_owned(),
            log: table.log_kind(),
        })
    }
}

/// Look up a configured model by id.
///
/// # Errors
///
/// Returns [`LogError::UnknownEntity`] if no model has that id.
pub fn require_model<'a>(
    models: &'a [Model],
    model_id: &str,
    log: LogKind,
) -> Result<&'a Model, LogError> {
    models
        .iter()
        .find(|m| m.id == model_id)
        .ok_or_else(|| LogError::UnknownEntity {
            kind: EntityKind::Model,
            name: model_id.to_owned(),
            log,
        })
}

/// Check that a metabolite is part of the layout's media.
///
/// # Errors
///
/// Returns [`LogError::UnallocatedMetabolite`] otherwise.
pub fn require_metabolite(allocated: &[String], metabolite: &str) -> Result<(), LogError> {
    if allocated.iter().any(|m| m == metabolite) {
        Ok(())
    } else {
        Err(LogError::UnallocatedMetabolite(metabolite.to_owned()))
    }
}

/// Check that a reaction belongs to a model's flux table.
///
/// # Errors
///
/// Returns [`LogError::UnknownEntity`] otherwise.
pub fn require_reaction(table: &FluxTable, reaction: &str) -> Result<(), LogError> {
    require_entity(table, reaction)
}
