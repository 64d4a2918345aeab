//! Models, the spatial grid, and simulation cycles.
//!
//! Grid coordinates in every log are 1-based `(x, y)` pairs where `x`
//! indexes rows and `y` indexes columns. [`GridCoord::to_index`] is the one
//! place that converts them to 0-based dense-grid indices.

use serde::{Deserialize, Serialize};

/// A discrete simulation time step.
pub type Cycle = u64;

/// A metabolic model participating in the simulation.
///
/// Only the id and the ordered reaction names matter to the output layer:
/// the reaction order defines the meaning of the flux log's value columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Model identifier, unique within a run.
    pub id: String,
    /// Reaction names in the order the engine writes their fluxes.
    #[serde(default)]
    pub reactions: Vec<String>,
}

impl Model {
    /// Create a model from an id and its ordered reaction names.
    pub fn new<I, S>(id: impl Into<String>, reactions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            reactions: reactions.into_iter().map(Into::into).collect(),
        }
    }

    /// Number of reactions (flux value columns) this model owns.
    pub fn reaction_count(&self) -> usize {
        self.reactions.len()
    }
}

/// The fixed 2-D shape of the simulation layout.
///
/// Serialized as a `[rows, columns]` pair, matching how layouts declare it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct GridShape {
    /// Number of rows (the range of `x`).
    pub rows: usize,
    /// Number of columns (the range of `y`).
    pub columns: usize,
}

impl GridShape {
    /// Create a grid shape.
    pub const fn new(rows: usize, columns: usize) -> Self {
        Self { rows, columns }
    }

    /// Whether both dimensions are positive.
    pub const fn is_valid(self) -> bool {
        self.rows > 0 && self.columns > 0
    }

    /// The shape as a `(rows, columns)` tuple, as dense arrays expect it.
    pub const fn dims(self) -> (usize, usize) {
        (self.rows, self.columns)
    }
}

impl From<(usize, usize)> for GridShape {
    fn from((rows, columns): (usize, usize)) -> Self {
        Self { rows, columns }
    }
}

impl From<GridShape> for (usize, usize) {
    fn from(shape: GridShape) -> Self {
        (shape.rows, shape.columns)
    }
}

impl core::fmt::Display for GridShape {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}x{}", self.rows, self.columns)
    }
}

/// A 1-based cell coordinate as written by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridCoord {
    /// 1-based row.
    pub x: u32,
    /// 1-based column.
    pub y: u32,
}

impl GridCoord {
    /// Create a coordinate from 1-based row and column.
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Convert to a 0-based `(row, column)` index inside `shape`.
    ///
    /// Returns `None` when either component is zero or exceeds the shape.
    pub fn to_index(self, shape: GridShape) -> Option<(usize, usize)> {
        let row = usize::try_from(self.x).ok()?.checked_sub(1)?;
        let col = usize::try_from(self.y).ok()?.checked_sub(1)?;
        (row < shape.rows && col < shape.columns).then_some((row, col))
    }

    /// Whether the coordinate lies inside `shape`.
    pub fn fits(self, shape: GridShape) -> bool {
        self.to_index(shape).is_some()
    }
}

impl core::fmt::Display for GridCoord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
