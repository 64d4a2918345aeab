//! Log ingestion and spatial reconstruction for COMETS simulation output.
//!
//! The simulation engine writes up to six loosely-structured text logs per
//! run. This crate turns them into typed tables and dense grids:
//!
//! ```text
//! raw text -> reader -> normalize -> (flux::demultiplex) -> tables
//!                                                             |
//!                                      grid::reconstruct <----+----> query
//! ```
//!
//! # Modules
//!
//! - [`reader`] -- Splits a log file into rows of tokens.
//! - [`normalize`] -- Maps token rows to typed records, one schema per log.
//! - [`flux`] -- Splits the shared flux log into per-model tables.
//! - [`grid`] -- Rebuilds zero-filled dense grids from sparse records.
//! - [`query`] -- Existence checks for logs, cycles, and entity names.
//! - [`tables`] -- The normalized table types.
//! - [`error`] -- The [`LogError`] taxonomy.
//!
//! Everything here is synchronous and free of shared state.

pub mod error;
pub mod flux;
pub mod grid;
pub mod normalize;
pub mod query;
pub mod reader;
pub mod tables;

// Re-export primary types at crate root.
pub use error::LogError;
pub use grid::{Grid, SpatialTable, reconstruct};
pub use normalize::{NormalizeOptions, Normalized, OutOfGridPolicy};
pub use reader::{Delimiter, RawRow, read_rows};
pub use tables::{
    BiomassTable, FluxTable, FluxTables, GenotypeTable, MediaCell, MediaTable, RawFluxTable,
    SpecificMediaTable, TotalBiomassTable,
};
