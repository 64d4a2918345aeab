//! Flux log demultiplexing.
//!
//! The engine writes the fluxes of every model into one flat log. Each row
//! carries the 1-based index of its model, and the meaning of the trailing
//! value columns depends on that index: they are the model's reactions in
//! order, zero-padded up to the widest model. [`demultiplex`] splits the log
//! into one reaction-labeled [`FluxTable`] per model, keyed by model id in
//! registration order, and drops the padding and the index column.
//!
//! Demultiplexing happens once, when the flux log is loaded; the column
//! meaning of a raw row cannot be recovered without its model index.

use comets_types::{FluxRecord, LogKind, Model, RawFluxRecord};
use tracing::debug;

use crate::error::LogError;
use crate::tables::{FluxTable, FluxTables, RawFluxTable};

/// Key columns preceding the flux values: `cycle x y model_index`.
pub const FLUX_PREFIX_COLUMNS: usize = 4;

/// Full column width of the flux log for `models`.
///
/// Four key columns plus the largest reaction count of any model.
pub fn max_cols(models: &[Model]) -> usize {
    let widest = models.iter().map(Model::reaction_count).max().unwrap_or(0);
    FLUX_PREFIX_COLUMNS.saturating_add(widest)
}

/// Split the raw flux log into one table per model.
///
/// Every raw row lands in exactly one table: the one of the model its index
/// points at. A model with no reactions gets a table with no value columns.
///
/// # Errors
///
/// Returns [`LogError::CorruptLine`] if a row's model index does not name a
/// model, or if the row carries fewer values than its model has reactions.
pub fn demultiplex(raw: &RawFluxTable, models: &[Model]) -> Result<FluxTables, LogError> {
    let mut buckets: Vec<Vec<FluxRecord>> = models.iter().map(|_| Vec::new()).collect();

    for record in raw.records() {
        let slot = record
            .model_index
            .checked_sub(1)
            .and_then(|pos| models.get(pos).map(|model| (pos, model)));
        let Some((pos, model)) = slot else {
            return Err(corrupt(
                record,
                format!(
                    "model index {} does not name one of the {} models",
                    record.model_index,
                    models.len()
                ),
            ));
        };

        let count = model.reaction_count();
        let Some(fluxes) = record.values.get(..count) else {
            return Err(corrupt(
                record,
                format!(
                    "model {} has {count} reactions but the row carries {} values",
                    model.id,
                    record.values.len()
                ),
            ));
        };

        // One bucket per model, so `pos` is always in range here.
        if let Some(bucket) = buckets.get_mut(pos) {
            bucket.push(FluxRecord {
                cycle: record.cycle,
                coord: record.coord,
                fluxes: fluxes.to_vec(),
            });
        }
    }

    let tables: Vec<FluxTable> = models
        .iter()
        .zip(buckets)
        .map(|(model, records)| FluxTable::new(model.id.clone(), model.reactions.clone(), records))
        .collect();

    for table in &tables {
        debug!(
            model = table.model_id(),
            reactions = table.reactions().len(),
            rows = table.len(),
            "flux table demultiplexed"
        );
    }

    Ok(FluxTables::new(tables))
}

fn corrupt(record: &RawFluxRecord, reason: String) -> LogError {
    LogError::CorruptLine {
        kind: LogKind::Flux,
        line: record.line,
        raw: record.raw.clone(),
        reason,
    }
}
