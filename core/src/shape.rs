//! Square block-occupancy matrices and the geometric transforms applied to them.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a block matrix cannot be turned into a [`Shape`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum InvalidShapeError {
    /// The matrix contained no rows at all.
    #[error("block matrix has no rows")]
    Empty,
    /// One of the rows contained no cells.
    #[error("block matrix row {row} is empty")]
    EmptyRow {
        /// Zero-based index of the offending row.
        row: usize,
    },
    /// A row length differs from the number of rows.
    #[error("block matrix is not square: {rows} rows but row {row} has {len} cells")]
    NotSquare {
        /// Number of rows in the matrix.
        rows: usize,
        /// Zero-based index of the first row with a mismatched length.
        row: usize,
        /// Number of cells found in that row.
        len: usize,
    },
    /// Every cell of the matrix was empty.
    #[error("block matrix contains no blocks")]
    NoBlocks,
}

/// Number of clockwise quarter turns, always normalized to `0..4`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuarterTurns(u8);

impl QuarterTurns {
    /// The identity rotation.
    pub const ZERO: Self = Self(0);

    /// Wraps a raw quarter turn count, reducing it modulo four.
    #[must_use]
    pub const fn new(turns: u8) -> Self {
        Self(turns % 4)
    }

    /// Rounds an arbitrary angle to the nearest quarter turn.
    ///
    /// The angle is first normalized into `[0, 360)`. Halfway cases such as
    /// 45° or 135° round to the even step, so 45° becomes 0° and 135° becomes
    /// 180°. Non-finite input is treated as no rotation.
    #[must_use]
    pub fn from_degrees(degrees: f32) -> Self {
        if !degrees.is_finite() {
            return Self::ZERO;
        }
        let normalized = degrees.rem_euclid(360.0);
        let steps = (normalized / 90.0).round_ties_even() as i64;
        Self(steps.rem_euclid(4) as u8)
    }

    /// Raw number of quarter turns in `0..4`.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Angle represented by the turn count, one of 0, 90, 180 or 270.
    #[must_use]
    pub const fn degrees(self) -> u16 {
        self.0 as u16 * 90
    }

    /// Reports whether the value is the identity rotation.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Composes two rotations.
    #[must_use]
    pub const fn then(self, other: Self) -> Self {
        Self((self.0 + other.0) % 4)
    }
}

/// Immutable square matrix describing which cells of an entity hold a block.
///
/// A shape always has a positive side length and at least one block. Every
/// transform returns a new value; the original is never modified.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>", into = "Vec<Vec<u8>>")]
pub struct Shape {
    side: usize,
    cells: Vec<bool>,
}

impl Shape {
    /// Builds a shape from boolean rows, validating squareness and occupancy.
    pub fn from_rows(rows: Vec<Vec<bool>>) -> Result<Self, InvalidShapeError> {
        let side = rows.len();
        if side == 0 {
            return Err(InvalidShapeError::Empty);
        }

        let mut cells = Vec::with_capacity(side * side);
        for (index, row) in rows.into_iter().enumerate() {
            if row.is_empty() {
                return Err(InvalidShapeError::EmptyRow { row: index });
            }
            if row.len() != side {
                return Err(InvalidShapeError::NotSquare {
                    rows: side,
                    row: index,
                    len: row.len(),
                });
            }
            cells.extend(row);
        }

        if !cells.iter().any(|cell| *cell) {
            return Err(InvalidShapeError::NoBlocks);
        }

        Ok(Self { side, cells })
    }

    /// Builds a shape from a 0/1 matrix. Any non-zero entry counts as a block.
    pub fn from_matrix(matrix: &[Vec<u8>]) -> Result<Self, InvalidShapeError> {
        Self::from_rows(
            matrix
                .iter()
                .map(|row| row.iter().map(|cell| *cell != 0).collect())
                .collect(),
        )
    }

    /// The 1×1 shape consisting of a single block.
    #[must_use]
    pub fn unit() -> Self {
        Self {
            side: 1,
            cells: vec![true],
        }
    }

    /// Side length of the square matrix.
    #[must_use]
    pub const fn side(&self) -> usize {
        self.side
    }

    /// Reports whether the cell at `row`, `column` holds a block.
    ///
    /// Coordinates outside the matrix are reported as empty.
    #[must_use]
    pub fn is_filled(&self, row: usize, column: usize) -> bool {
        row < self.side && column < self.side && self.cells[row * self.side + column]
    }

    /// Number of blocks present in the shape.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.cells.iter().filter(|cell| **cell).count()
    }

    /// Copies the shape out as a 0/1 matrix, the format clients exchange.
    #[must_use]
    pub fn to_matrix(&self) -> Vec<Vec<u8>> {
        self.cells
            .chunks(self.side)
            .map(|row| row.iter().map(|cell| u8::from(*cell)).collect())
            .collect()
    }

    /// Rotates clockwise by `delta_degrees`, rounded to the nearest quarter turn.
    #[must_use]
    pub fn rotate(&self, delta_degrees: f32) -> Self {
        self.rotate_quarter_turns(QuarterTurns::from_degrees(delta_degrees))
    }

    /// Rotates clockwise by an exact number of quarter turns.
    #[must_use]
    pub fn rotate_quarter_turns(&self, turns: QuarterTurns) -> Self {
        let n = self.side;
        let source = |row: usize, column: usize| -> (usize, usize) {
            match turns.get() {
                1 => (n - 1 - column, row),
                2 => (n - 1 - row, n - 1 - column),
                3 => (column, n - 1 - row),
                _ => (row, column),
            }
        };

        if turns.is_zero() {
            return self.clone();
        }

        let cells = (0..n)
            .flat_map(|row| (0..n).map(move |column| (row, column)))
            .map(|(row, column)| {
                let (old_row, old_column) = source(row, column);
                self.cells[old_row * n + old_column]
            })
            .collect();

        Self { side: n, cells }
    }

    /// Reflects across the horizontal axis by reversing the row order.
    #[must_use]
    pub fn mirror(&self) -> Self {
        let cells = self
            .cells
            .chunks(self.side)
            .rev()
            .flatten()
            .copied()
            .collect();
        Self {
            side: self.side,
            cells,
        }
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Shape").field(&self.to_matrix()).finish()
    }
}

impl TryFrom<Vec<Vec<u8>>> for Shape {
    type Error = InvalidShapeError;

    fn try_from(matrix: Vec<Vec<u8>>) -> Result<Self, Self::Error> {
        Self::from_matrix(&matrix)
    }
}

impl From<Shape> for Vec<Vec<u8>> {
    fn from(shape: Shape) -> Self {
        shape.to_matrix()
    }
}
