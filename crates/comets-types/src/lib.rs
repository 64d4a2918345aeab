//! Shared type definitions for COMETS simulation output.
//!
//! This crate is the single source of truth for the entities that flow
//! between the log parsing layer (`comets-logs`) and the per-run result
//! object (`comets-output`).
//!
//! # Modules
//!
//! - [`ids`] -- The run-scoped identifier used to name log files
//! - [`enums`] -- Log kinds and queryable entity kinds
//! - [`model`] -- Models, grid shape, grid coordinates, cycles
//! - [`records`] -- Typed rows produced by the schema normalizer

pub mod enums;
pub mod ids;
pub mod model;
pub mod records;

// Re-export all public types at crate root for convenience.
pub use enums::{EntityKind, LogKind};
pub use ids::RunId;
pub use model::{Cycle, GridCoord, GridShape, Model};
pub use records::{
    BiomassRecord, FluxRecord, GenotypeRecord, MediaRecord, RawFluxRecord, TotalBiomassRow,
};
