//! Schema normalization: raw token rows into typed tables.
//!
//! Each log kind has a fixed schema. A row that does not match it (wrong
//! number of tokens, a non-numeric value, a negative cycle) fails the whole
//! table with [`LogError::CorruptLine`]. Coordinates are checked against
//! the grid shape here so that every record in a returned table satisfies
//! `1 <= x <= rows` and `1 <= y <= columns`. A row outside the grid is
//! rejected on its own: it comes back as a [`LogError::OutOfGrid`] in
//! [`Normalized::rejected`] and the rest of the table is kept, unless the
//! caller asked for [`OutOfGridPolicy::Abort`].
//!
//! Cycle and coordinate tokens are integers, but an integral float such as
//! `3.0` is accepted too, since some engine versions print them that way.

use comets_types::{
    BiomassRecord, Cycle, GenotypeRecord, GridCoord, GridShape, LogKind, MediaRecord,
    RawFluxRecord, TotalBiomassRow,
};
use serde::{Deserialize, Serialize};

use crate::error::LogError;
use crate::flux::FLUX_PREFIX_COLUMNS;
use crate::reader::RawRow;
use crate::tables::{
    BiomassTable, GenotypeTable, MediaCell, MediaTable, RawFluxTable, SpecificMediaTable,
    TotalBiomassTable,
};

/// What to do with a record whose coordinate falls outside the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfGridPolicy {
    /// Reject the row alone and return it with the table.
    #[default]
    Collect,
    /// Fail the whole table with [`LogError::OutOfGrid`].
    Abort,
}

/// Grid context for normalizing the sparse spatial logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// The declared layout shape.
    pub shape: GridShape,
    /// Handling of coordinates outside `shape`.
    pub out_of_grid: OutOfGridPolicy,
}

impl NormalizeOptions {
    /// Options that reject out-of-grid rows one by one.
    pub const fn new(shape: GridShape) -> Self {
        Self {
            shape,
            out_of_grid: OutOfGridPolicy::Collect,
        }
    }

    /// Options that fail the table on the first out-of-grid row.
    pub const fn strict(shape: GridShape) -> Self {
        Self {
            shape,
            out_of_grid: OutOfGridPolicy::Abort,
        }
    }
}

/// A sparse table and the rows rejected while building it.
#[derive(Debug)]
pub struct Normalized<T> {
    /// The table of admitted rows.
    pub table: T,
    /// One [`LogError::OutOfGrid`] per row outside the grid, in log order.
    pub rejected: Vec<LogError>,
}

impl<T> Normalized<T> {
    /// Drop the rejections and keep the table.
    pub fn into_table(self) -> T {
        self.table
    }
}

// ---------------------------------------------------------------------------
// Per-kind normalizers
// ---------------------------------------------------------------------------

/// Normalize the total-biomass log.
///
/// Columns are `cycle` followed by `model_ids` in registration order.
pub fn total_biomass(
    rows: &[RawRow],
    model_ids: &[String],
) -> Result<TotalBiomassTable, LogError> {
    const KIND: LogKind = LogKind::TotalBiomass;
    let width = model_ids.len().saturating_add(1);

    let parsed = rows
        .iter()
        .map(|row| {
            expect_arity(KIND, row, width)?;
            let (cycle_token, values) = split_first(KIND, row)?;
            let cycle = parse_cycle(KIND, row, cycle_token)?;
            let biomass = values
                .iter()
                .map(|t| parse_value(KIND, row, t))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(TotalBiomassRow { cycle, biomass })
        })
        .collect::<Result<Vec<_>, LogError>>()?;

    Ok(TotalBiomassTable::new(model_ids.to_vec(), parsed))
}

/// Normalize the spatial biomass log: `cycle x y species biomass`.
pub fn biomass(
    rows: &[RawRow],
    opts: NormalizeOptions,
) -> Result<Normalized<BiomassTable>, LogError> {
    const KIND: LogKind = LogKind::Biomass;
    let mut records = Vec::with_capacity(rows.len());
    let mut rejected = Vec::new();

    for row in rows {
        let [cycle, x, y, species, value] = fixed_tokens(KIND, row)?;
        let coord = parse_coord(KIND, row, x, y)?;
        if !admit_coord(KIND, coord, opts, &mut rejected)? {
            continue;
        }
        records.push(BiomassRecord {
            cycle: parse_cycle(KIND, row, cycle)?,
            coord,
            species: species.clone(),
            biomass: parse_value(KIND, row, value)?,
        });
    }

    Ok(Normalized {
        table: BiomassTable::from_records(records),
        rejected,
    })
}

/// Normalize the media log: `metabolite cycle x y concentration`.
pub fn media(rows: &[RawRow], opts: NormalizeOptions) -> Result<Normalized<MediaTable>, LogError> {
    const KIND: LogKind = LogKind::Media;
    let mut records = Vec::with_capacity(rows.len());
    let mut rejected = Vec::new();

    for row in rows {
        let [metabolite, cycle, x, y, value] = fixed_tokens(KIND, row)?;
        let coord = parse_coord(KIND, row, x, y)?;
        if !admit_coord(KIND, coord, opts, &mut rejected)? {
            continue;
        }
        records.push(MediaRecord {
            metabolite: metabolite.clone(),
            cycle: parse_cycle(KIND, row, cycle)?,
            coord,
            concentration: parse_value(KIND, row, value)?,
        });
    }

    Ok(Normalized {
        table: MediaTable::from_records(records),
        rejected,
    })
}

/// Normalize the flux log into raw, still-multiplexed records.
///
/// `max_cols` is the full column width (four key columns plus the widest
/// model's reaction count); a row wider than that is corrupt. Narrower rows
/// are accepted here and checked against their own model by the
/// demultiplexer.
pub fn raw_flux(
    rows: &[RawRow],
    max_cols: usize,
    opts: NormalizeOptions,
) -> Result<Normalized<RawFluxTable>, LogError> {
    const KIND: LogKind = LogKind::Flux;
    let mut records = Vec::with_capacity(rows.len());
    let mut rejected = Vec::new();

    for row in rows {
        if row.tokens.len() > max_cols {
            return Err(corrupt(
                KIND,
                row,
                format!(
                    "expected at most {max_cols} columns, found {}",
                    row.tokens.len()
                ),
            ));
        }
        let Some((key, values)) = row.tokens.split_at_checked(FLUX_PREFIX_COLUMNS) else {
            return Err(corrupt(
                KIND,
                row,
                format!(
                    "expected at least {FLUX_PREFIX_COLUMNS} columns, found {}",
                    row.tokens.len()
                ),
            ));
        };
        let [cycle, x, y, model_index] = key else {
            return Err(corrupt(KIND, row, "malformed key columns"));
        };

        let coord = parse_coord(KIND, row, x, y)?;
        if !admit_coord(KIND, coord, opts, &mut rejected)? {
            continue;
        }
        let model_index = parse_ordinal(model_index)
            .and_then(|v| usize::try_from(v).ok())
            .ok_or_else(|| corrupt(KIND, row, format!("invalid model index {model_index:?}")))?;

        records.push(RawFluxRecord {
            line: row.line,
            raw: row.joined(),
            cycle: parse_cycle(KIND, row, cycle)?,
            coord,
            model_index,
            values: values
                .iter()
                .map(|t| parse_value(KIND, row, t))
                .collect::<Result<Vec<_>, _>>()?,
        });
    }

    Ok(Normalized {
        table: RawFluxTable::new(records, max_cols),
        rejected,
    })
}

/// Normalize the genotypes log: `ancestor mutation species`.
pub fn genotypes(rows: &[RawRow]) -> Result<GenotypeTable, LogError> {
    const KIND: LogKind = LogKind::Genotypes;
    let records = rows
        .iter()
        .map(|row| {
            let [ancestor, mutation, species] = fixed_tokens(KIND, row)?;
            Ok(GenotypeRecord {
                ancestor: ancestor.clone(),
                mutation: mutation.clone(),
                species: species.clone(),
            })
        })
        .collect::<Result<Vec<_>, LogError>>()?;
    Ok(GenotypeTable::new(records))
}

/// Normalize the specific-media log: a header row, then data rows.
///
/// Column names come from the header verbatim. Numeric-looking cells are
/// kept as numbers, everything else as text.
pub fn specific_media(rows: &[RawRow]) -> Result<SpecificMediaTable, LogError> {
    const KIND: LogKind = LogKind::SpecificMedia;
    let Some((header, data)) = rows.split_first() else {
        return Err(LogError::CorruptLine {
            kind: KIND,
            line: 1,
            raw: String::new(),
            reason: "missing header row".to_owned(),
        });
    };

    let width = header.tokens.len();
    let parsed = data
        .iter()
        .map(|row| {
            expect_arity(KIND, row, width)?;
            Ok(row.tokens.iter().map(|t| MediaCell::from_token(t)).collect())
        })
        .collect::<Result<Vec<_>, LogError>>()?;

    Ok(SpecificMediaTable::new(header.tokens.clone(), parsed))
}

// ---------------------------------------------------------------------------
// Token helpers
// ---------------------------------------------------------------------------

fn corrupt(kind: LogKind, row: &RawRow, reason: impl Into<String>) -> LogError {
    LogError::CorruptLine {
        kind,
        line: row.line,
        raw: row.joined(),
        reason: reason.into(),
    }
}

fn expect_arity(kind: LogKind, row: &RawRow, expected: usize) -> Result<(), LogError> {
    if row.tokens.len() == expected {
        Ok(())
    } else {
        Err(corrupt(
            kind,
            row,
            format!("expected {expected} columns, found {}", row.tokens.len()),
        ))
    }
}

fn fixed_tokens<'a, const N: usize>(
    kind: LogKind,
    row: &'a RawRow,
) -> Result<&'a [String; N], LogError> {
    <&[String; N]>::try_from(row.tokens.as_slice())
        .ok()
        .ok_or_else(|| {
            corrupt(
                kind,
                row,
                format!("expected {N} columns, found {}", row.tokens.len()),
            )
        })
}

fn split_first(kind: LogKind, row: &RawRow) -> Result<(&String, &[String]), LogError> {
    row.tokens
        .split_first()
        .ok_or_else(|| corrupt(kind, row, "empty row"))
}

fn parse_cycle(kind: LogKind, row: &RawRow, token: &str) -> Result<Cycle, LogError> {
    parse_ordinal(token).ok_or_else(|| corrupt(kind, row, format!("invalid cycle {token:?}")))
}

fn parse_coord(kind: LogKind, row: &RawRow, x: &str, y: &str) -> Result<GridCoord, LogError> {
    let component = |token: &str| {
        parse_ordinal(token)
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| corrupt(kind, row, format!("invalid coordinate {token:?}")))
    };
    Ok(GridCoord::new(component(x)?, component(y)?))
}

fn parse_value(kind: LogKind, row: &RawRow, token: &str) -> Result<f64, LogError> {
    token
        .parse::<f64>()
        .map_err(|e| corrupt(kind, row, format!("non-numeric value {token:?}: {e}")))
}

/// Parse a non-negative integer, accepting integral floats like `3.0`.
fn parse_ordinal(token: &str) -> Option<u64> {
    if let Ok(v) = token.parse::<u64>() {
        return Some(v);
    }
    let v = token.parse::<f64>().ok()?;
    // 2^64, exactly representable.
    let in_range = v.is_finite() && v >= 0.0 && v < 18_446_744_073_709_551_616.0;
    if !in_range || v.fract() != 0.0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let ordinal = v as u64;
    Some(ordinal)
}

/// Apply the out-of-grid policy; `Ok(false)` means the row was rejected.
fn admit_coord(
    kind: LogKind,
    coord: GridCoord,
    opts: NormalizeOptions,
    rejected: &mut Vec<LogError>,
) -> Result<bool, LogError> {
    if coord.fits(opts.shape) {
        return Ok(true);
    }
    let error = LogError::OutOfGrid {
        kind,
        coord,
        shape: opts.shape,
    };
    match opts.out_of_grid {
        OutOfGridPolicy::Abort => Err(error),
        OutOfGridPolicy::Collect => {
            rejected.push(error);
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{Delimiter, split_rows};

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_owned()).collect()
    }

    fn opts(rows: usize, columns: usize) -> NormalizeOptions {
        NormalizeOptions::new(GridShape::new(rows, columns))
    }

    // ------------------------------------------------------------------
    // Total biomass
    // ------------------------------------------------------------------

    #[test]
    fn total_biomass_rows_match_cycles() {
        let rows = split_rows("0\t1e-3\t2e-3\n1\t1.5e-3\t2.5e-3\n2\t2e-3\t3e-3\n", Delimiter::Tab);
        let table = total_biomass(&rows, &ids(&["a", "b"]));
        assert!(table.is_ok());
        let Ok(table) = table else { return };

        assert_eq!(table.len(), 3);
        assert_eq!(table.cycles().len(), 3);
        assert_eq!(table.columns(), ids(&["cycle", "a", "b"]));
    }

    #[test]
    fn total_biomass_values_round_trip_exactly() {
        let token = "0.123456789012345678";
        let rows = split_rows(&format!("4\t{token}\n"), Delimiter::Tab);
        let table = total_biomass(&rows, &ids(&["a"]));
        let expected = token.parse::<f64>().map(f64::to_bits).ok();
        let actual = table
            .ok()
            .and_then(|t| t.value(4, "a"))
            .map(f64::to_bits);
        assert_eq!(actual, expected);
    }

    #[test]
    fn total_biomass_accepts_float_cycle() {
        let rows = split_rows("3.0\t1.0\n", Delimiter::Tab);
        let table = total_biomass(&rows, &ids(&["a"]));
        assert!(matches!(table, Ok(ref t) if t.cycles().contains(&3)));
    }

    #[test]
    fn total_biomass_wrong_arity_is_corrupt() {
        let rows = split_rows("0\t1.0\n", Delimiter::Tab);
        let table = total_biomass(&rows, &ids(&["a", "b"]));
        assert!(matches!(
            table,
            Err(LogError::CorruptLine { kind: LogKind::TotalBiomass, line: 1, .. })
        ));
    }

    #[test]
    fn total_biomass_non_numeric_is_corrupt() {
        let rows = split_rows("0\t1.0\n1\tabc\n", Delimiter::Tab);
        let table = total_biomass(&rows, &ids(&["a"]));
        assert!(matches!(table, Err(LogError::CorruptLine { line: 2, .. })));
    }

    // ------------------------------------------------------------------
    // Spatial biomass and media
    // ------------------------------------------------------------------

    #[test]
    fn biomass_indexes_species_and_cycles() {
        let rows = split_rows("0 1 1 a 0.1\n0 2 2 b 0.2\n5 1 2 a 0.3\n", Delimiter::Whitespace);
        let table = biomass(&rows, opts(3, 3)).map(Normalized::into_table);
        assert!(table.is_ok());
        let Ok(table) = table else { return };
        assert_eq!(table.len(), 3);
        assert!(table.species().contains("b"));
        assert_eq!(table.cycles().iter().copied().collect::<Vec<_>>(), vec![0, 5]);
    }

    #[test]
    fn out_of_grid_row_is_rejected_alone_by_default() {
        let rows = split_rows("0 1 1 a 0.1\n0 4 1 a 0.2\n0 3 3 b 0.3\n", Delimiter::Whitespace);
        let normalized = biomass(&rows, opts(3, 3));
        assert!(normalized.is_ok());
        let Ok(normalized) = normalized else { return };

        assert_eq!(normalized.table.len(), 2);
        assert_eq!(normalized.rejected.len(), 1);
        assert!(matches!(
            normalized.rejected.first(),
            Some(LogError::OutOfGrid {
                kind: LogKind::Biomass,
                coord: GridCoord { x: 4, y: 1 },
                ..
            })
        ));
    }

    #[test]
    fn media_rejections_keep_log_order() {
        let rows = split_rows("glc 0 1 1 1.0\nglc 0 0 1 2.0\nglc 0 9 9 3.0\n", Delimiter::Whitespace);
        let normalized = media(&rows, opts(2, 2));
        assert!(normalized.is_ok());
        let Ok(normalized) = normalized else { return };

        assert_eq!(normalized.table.len(), 1);
        let coords: Vec<GridCoord> = normalized
            .rejected
            .iter()
            .filter_map(|e| match e {
                LogError::OutOfGrid { coord, .. } => Some(*coord),
                _ => None,
            })
            .collect();
        assert_eq!(coords, vec![GridCoord::new(0, 1), GridCoord::new(9, 9)]);
    }

    #[test]
    fn abort_policy_fails_the_whole_table() {
        let rows = split_rows("glc 0 1 1 1.0\nglc 0 3 1 2.0\n", Delimiter::Whitespace);
        let result = media(&rows, NormalizeOptions::strict(GridShape::new(2, 2)));
        assert!(matches!(
            result,
            Err(LogError::OutOfGrid {
                kind: LogKind::Media,
                coord: GridCoord { x: 3, y: 1 },
                ..
            })
        ));
    }

    #[test]
    fn media_negative_cycle_is_corrupt() {
        let rows = split_rows("glc -1 1 1 1.0\n", Delimiter::Whitespace);
        assert!(matches!(media(&rows, opts(2, 2)), Err(LogError::CorruptLine { .. })));
    }

    #[test]
    fn media_fractional_coordinate_is_corrupt() {
        let rows = split_rows("glc 0 1.5 1 1.0\n", Delimiter::Whitespace);
        assert!(matches!(media(&rows, opts(2, 2)), Err(LogError::CorruptLine { .. })));
    }

    // ------------------------------------------------------------------
    // Flux
    // ------------------------------------------------------------------

    #[test]
    fn raw_flux_keeps_padding() {
        let rows = split_rows("1 1 1 1 0.1 0.2 0.0\n", Delimiter::Whitespace);
        let table = raw_flux(&rows, 7, opts(2, 2)).map(Normalized::into_table);
        assert!(matches!(
            table,
            Ok(ref t) if t.records().first().map(|r| r.values.len()) == Some(3)
        ));
    }

    #[test]
    fn raw_flux_wider_than_max_cols_is_corrupt() {
        let rows = split_rows("1 1 1 1 0.1 0.2 0.3\n", Delimiter::Whitespace);
        assert!(matches!(
            raw_flux(&rows, 6, opts(2, 2)),
            Err(LogError::CorruptLine { kind: LogKind::Flux, .. })
        ));
    }

    #[test]
    fn raw_flux_missing_key_columns_is_corrupt() {
        let rows = split_rows("1 1 1\n", Delimiter::Whitespace);
        assert!(matches!(
            raw_flux(&rows, 6, opts(2, 2)),
            Err(LogError::CorruptLine { .. })
        ));
    }

    // ------------------------------------------------------------------
    // Genotypes and specific media
    // ------------------------------------------------------------------

    #[test]
    fn genotypes_parse_three_columns() {
        let rows = split_rows("ecoli del_pgi ecoli_0x1\necoli add_x ecoli_0x2\n", Delimiter::Whitespace);
        let table = genotypes(&rows);
        assert!(table.is_ok());
        let Ok(table) = table else { return };
        assert_eq!(table.descendants_of("ecoli").count(), 2);
    }

    #[test]
    fn genotypes_wrong_arity_is_corrupt() {
        let rows = split_rows("ecoli del_pgi\n", Delimiter::Whitespace);
        assert!(matches!(genotypes(&rows), Err(LogError::CorruptLine { .. })));
    }

    #[test]
    fn specific_media_passes_columns_through() {
        let rows = split_rows("cycle x y glc__D_e\n0 1 1 10.0\n1 1 1 9.5\n", Delimiter::Whitespace);
        let table = specific_media(&rows);
        assert!(table.is_ok());
        let Ok(table) = table else { return };
        assert_eq!(table.columns(), ids(&["cycle", "x", "y", "glc__D_e"]).as_slice());
        let glc: Option<Vec<Option<f64>>> = table
            .column("glc__D_e")
            .map(|cells| cells.into_iter().map(MediaCell::as_f64).collect());
        assert_eq!(glc, Some(vec![Some(10.0), Some(9.5)]));
    }

    #[test]
    fn specific_media_without_header_is_corrupt() {
        assert!(matches!(specific_media(&[]), Err(LogError::CorruptLine { .. })));
    }

    #[test]
    fn ordinal_parsing() {
        assert_eq!(parse_ordinal("12"), Some(12));
        assert_eq!(parse_ordinal("12.0"), Some(12));
        assert_eq!(parse_ordinal("12.5"), None);
        assert_eq!(parse_ordinal("-1"), None);
        assert_eq!(parse_ordinal("nan"), None);
    }
}
