//! Normalized tables, one per log kind.
//!
//! Tables are built once by the normalizer (or the flux demultiplexer) and
//! are read-only afterwards. Sparse tables index their distinct cycles and
//! entity names at construction so that existence checks are lookups.

use std::collections::BTreeSet;

use comets_types::{
    BiomassRecord, Cycle, EntityKind, FluxRecord, GenotypeRecord, LogKind, MediaRecord,
    RawFluxRecord, TotalBiomassRow,
};
use serde::Serialize;

use crate::error::LogError;

/// Leading columns shared by every per-model flux table.
pub const FLUX_KEY_COLUMNS: [&str; 3] = ["cycle", "x", "y"];

// ---------------------------------------------------------------------------
// Total biomass
// ---------------------------------------------------------------------------

/// The total-biomass log: one row per cycle, one column per model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalBiomassTable {
    model_ids: Vec<String>,
    rows: Vec<TotalBiomassRow>,
}

impl TotalBiomassTable {
    pub(crate) const fn new(model_ids: Vec<String>, rows: Vec<TotalBiomassRow>) -> Self {
        Self { model_ids, rows }
    }

    /// Model ids in registration order (the value columns).
    pub fn model_ids(&self) -> &[String] {
        &self.model_ids
    }

    /// All rows in file order.
    pub fn rows(&self) -> &[TotalBiomassRow] {
        &self.rows
    }

    /// Column names: `cycle` followed by the model ids.
    pub fn columns(&self) -> Vec<String> {
        std::iter::once("cycle".to_owned())
            .chain(self.model_ids.iter().cloned())
            .collect()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the log had no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct cycles reported.
    pub fn cycles(&self) -> BTreeSet<Cycle> {
        self.rows.iter().map(|r| r.cycle).collect()
    }

    /// Total biomass of `model_id` at `cycle`, if both exist.
    pub fn value(&self, cycle: Cycle, model_id: &str) -> Option<f64> {
        let column = self.model_ids.iter().position(|id| id == model_id)?;
        self.rows
            .iter()
            .rev()
            .find(|r| r.cycle == cycle)
            .and_then(|r| r.biomass.get(column).copied())
    }

    /// The `(cycle, biomass)` series of one model, in file order.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::UnknownEntity`] if `model_id` is not a column.
    pub fn series(&self, model_id: &str) -> Result<Vec<(Cycle, f64)>, LogError> {
        let column = self
            .model_ids
            .iter()
            .position(|id| id == model_id)
            .ok_or_else(|| LogError::UnknownEntity {
                kind: EntityKind::Model,
                name: model_id.to_owned(),
                log: LogKind::TotalBiomass,
            })?;
        Ok(self
            .rows
            .iter()
            .filter_map(|r| r.biomass.get(column).map(|v| (r.cycle, *v)))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Spatial biomass
// ---------------------------------------------------------------------------

/// The sparse spatial biomass log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BiomassTable {
    records: Vec<BiomassRecord>,
    cycles: BTreeSet<Cycle>,
    species: BTreeSet<String>,
}

impl BiomassTable {
    /// Build a table and index its cycles and species.
    pub fn from_records(records: Vec<BiomassRecord>) -> Self {
        let cycles = records.iter().map(|r| r.cycle).collect();
        let species = records.iter().map(|r| r.species.clone()).collect();
        Self {
            records,
            cycles,
            species,
        }
    }

    /// All records in file order.
    pub fn records(&self) -> &[BiomassRecord] {
        &self.records
    }

    /// Distinct cycles reported.
    pub const fn cycles(&self) -> &BTreeSet<Cycle> {
        &self.cycles
    }

    /// Distinct species ids reported.
    pub const fn species(&self) -> &BTreeSet<String> {
        &self.species
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log had no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

/// The sparse media concentration log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaTable {
    records: Vec<MediaRecord>,
    cycles: BTreeSet<Cycle>,
    metabolites: BTreeSet<String>,
}

impl MediaTable {
    /// Build a table and index its cycles and metabolites.
    pub fn from_records(records: Vec<MediaRecord>) -> Self {
        let cycles = records.iter().map(|r| r.cycle).collect();
        let metabolites = records.iter().map(|r| r.metabolite.clone()).collect();
        Self {
            records,
            cycles,
            metabolites,
        }
    }

    /// All records in file order.
    pub fn records(&self) -> &[MediaRecord] {
        &self.records
    }

    /// Distinct cycles reported.
    pub const fn cycles(&self) -> &BTreeSet<Cycle> {
        &self.cycles
    }

    /// Distinct metabolite names reported.
    pub const fn metabolites(&self) -> &BTreeSet<String> {
        &self.metabolites
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log had no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Flux
// ---------------------------------------------------------------------------

/// The flux log as written, before demultiplexing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawFluxTable {
    records: Vec<RawFluxRecord>,
    max_cols: usize,
}

impl RawFluxTable {
    pub(crate) const fn new(records: Vec<RawFluxRecord>, max_cols: usize) -> Self {
        Self { records, max_cols }
    }

    /// All records in file order.
    pub fn records(&self) -> &[RawFluxRecord] {
        &self.records
    }

    /// Total column width of the log, including the four key columns.
    pub const fn max_cols(&self) -> usize {
        self.max_cols
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log had no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The flux rows of one model, labeled with its reaction names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FluxTable {
    model_id: String,
    reactions: Vec<String>,
    records: Vec<FluxRecord>,
    cycles: BTreeSet<Cycle>,
}

impl FluxTable {
    pub(crate) fn new(model_id: String, reactions: Vec<String>, records: Vec<FluxRecord>) -> Self {
        let cycles = records.iter().map(|r| r.cycle).collect();
        Self {
            model_id,
            reactions,
            records,
            cycles,
        }
    }

    /// The owning model's id.
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Reaction names, one per value column.
    pub fn reactions(&self) -> &[String] {
        &self.reactions
    }

    /// Column names: `cycle, x, y` followed by the reaction names.
    pub fn columns(&self) -> Vec<String> {
        FLUX_KEY_COLUMNS
            .iter()
            .map(|c| (*c).to_owned())
            .chain(self.reactions.iter().cloned())
            .collect()
    }

    /// Position of `reaction` among the value columns.
    pub fn reaction_position(&self, reaction: &str) -> Option<usize> {
        self.reactions.iter().position(|r| r == reaction)
    }

    /// All records in file order.
    pub fn records(&self) -> &[FluxRecord] {
        &self.records
    }

    /// Distinct cycles reported for this model.
    pub const fn cycles(&self) -> &BTreeSet<Cycle> {
        &self.cycles
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no row of the flux log belonged to this model.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Per-model flux tables keyed by model id, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FluxTables {
    tables: Vec<FluxTable>,
}

impl FluxTables {
    pub(crate) const fn new(tables: Vec<FluxTable>) -> Self {
        Self { tables }
    }

    /// The table of `model_id`.
    pub fn get(&self, model_id: &str) -> Option<&FluxTable> {
        self.tables.iter().find(|t| t.model_id == model_id)
    }

    /// Model ids in registration order.
    pub fn model_ids(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.model_id.as_str())
    }

    /// Iterate over the tables in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &FluxTable> {
        self.tables.iter()
    }

    /// Number of models.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether there are no models.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Genotypes
// ---------------------------------------------------------------------------

/// Lineage events from the genotypes log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenotypeTable {
    records: Vec<GenotypeRecord>,
}

impl GenotypeTable {
    pub(crate) const fn new(records: Vec<GenotypeRecord>) -> Self {
        Self { records }
    }

    /// All lineage events in file order.
    pub fn records(&self) -> &[GenotypeRecord] {
        &self.records
    }

    /// Species that arose directly from `ancestor`.
    pub fn descendants_of<'a>(&'a self, ancestor: &'a str) -> impl Iterator<Item = &'a str> {
        self.records
            .iter()
            .filter(move |r| r.ancestor == ancestor)
            .map(|r| r.species.as_str())
    }

    /// Number of lineage events.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no mutant arose.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Specific media
// ---------------------------------------------------------------------------

/// A cell of the specific-media table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MediaCell {
    /// A token that parses as a number.
    Number(f64),
    /// Any other token, kept verbatim.
    Text(String),
}

impl MediaCell {
    pub(crate) fn from_token(token: &str) -> Self {
        token
            .parse::<f64>()
            .map_or_else(|_| Self::Text(token.to_owned()), Self::Number)
    }

    /// The numeric value, if the cell is a number.
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Text(_) => None,
        }
    }
}

/// The header-bearing specific-media log, passed through as written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecificMediaTable {
    columns: Vec<String>,
    rows: Vec<Vec<MediaCell>>,
}

impl SpecificMediaTable {
    pub(crate) const fn new(columns: Vec<String>, rows: Vec<Vec<MediaCell>>) -> Self {
        Self { columns, rows }
    }

    /// Column names from the header line.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Data rows, each as wide as the header.
    pub fn rows(&self) -> &[Vec<MediaCell>] {
        &self.rows
    }

    /// All cells of the column named `name`, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&MediaCell>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        self.rows.iter().map(|row| row.get(idx)).collect()
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the log had a header but no data.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total() -> TotalBiomassTable {
        TotalBiomassTable::new(
            vec!["a".to_owned(), "b".to_owned()],
            vec![
                TotalBiomassRow {
                    cycle: 0,
                    biomass: vec![1.0, 2.0],
                },
                TotalBiomassRow {
                    cycle: 1,
                    biomass: vec![1.5, 2.5],
                },
            ],
        )
    }

    #[test]
    fn total_biomass_series_follows_file_order() {
        let series = total().series("b");
        assert!(matches!(series, Ok(ref s) if s.len() == 2));
        assert_eq!(
            series.ok().and_then(|s| s.last().copied()).map(|(c, v)| (c, v.to_bits())),
            Some((1, 2.5_f64.to_bits()))
        );
    }

    #[test]
    fn total_biomass_series_of_unknown_model_fails() {
        assert!(matches!(
            total().series("c"),
            Err(LogError::UnknownEntity {
                kind: EntityKind::Model,
                log: LogKind::TotalBiomass,
                ..
            })
        ));
        assert!(total().value(0, "c").is_none());
    }

    #[test]
    fn media_cells_serialize_untagged() {
        let cells = vec![MediaCell::from_token("0.5"), MediaCell::from_token("n/a")];
        let json = serde_json::to_string(&cells);
        assert!(matches!(json, Ok(ref s) if s == r#"[0.5,"n/a"]"#));
    }

    #[test]
    fn specific_media_column_lookup() {
        let table = SpecificMediaTable::new(
            vec!["cycle".to_owned(), "glc".to_owned()],
            vec![vec![MediaCell::from_token("0"), MediaCell::from_token("7")]],
        );
        assert_eq!(table.column("glc").as_deref().map(<[_]>::len), Some(1));
        assert!(table.column("o2").is_none());
    }
}
