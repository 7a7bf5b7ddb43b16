//! Weight cell storage.
//!
//! A [`CrossbarArray`] is the immutable R×C grid of stored operands. Each
//! element is validated and decomposed into nibble digits exactly once, at
//! build time — the compute path only ever touches cached digits, the same
//! way the physical tile only ever sees its columns.

use crate::error::{DomainError, Result};
use tracing::info;
use xbar_chip::nibble::{decompose, reassemble, NibbleVector, NIBBLES_PER_WORD};
use xbar_chip::ArrayGeometry;

/// One stored operand plus its cached digit decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightCell {
    word: u16,
    digits: NibbleVector,
}

impl WeightCell {
    /// Store a word, decomposing it once.
    #[must_use]
    pub fn new(word: u16) -> Self {
        Self {
            word,
            digits: decompose(word),
        }
    }

    /// The stored word.
    #[must_use]
    pub const fn word(&self) -> u16 {
        self.word
    }

    /// The cached digit decomposition.
    #[must_use]
    pub const fn digits(&self) -> &NibbleVector {
        &self.digits
    }

    /// Assemble a cell from its four column digits, most significant first
    /// — the entry point for data arriving in the physical column layout.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::DigitOutOfRange`] if any digit is wider than
    /// 4 bits.
    pub fn from_digits(digits: [u8; NIBBLES_PER_WORD]) -> Result<Self> {
        match NibbleVector::from_digits(digits) {
            Some(vector) => Ok(Self {
                word: reassemble(&vector),
                digits: vector,
            }),
            None => {
                // The widest digit is the offender worth reporting.
                let value = digits.into_iter().max().unwrap_or(u8::MAX);
                Err(DomainError::DigitOutOfRange { value })
            }
        }
    }
}

/// Immutable R×C grid of weight cells, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossbarArray {
    geometry: ArrayGeometry,
    cells: Vec<WeightCell>,
}

impl CrossbarArray {
    /// Build an array from a rectangular matrix of words.
    ///
    /// Validates shape first; nothing is stored until the whole matrix has
    /// been checked.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::EmptyArray`] for a matrix with no rows or no
    /// cells, [`DomainError::RaggedRow`] if row lengths differ, and
    /// [`DomainError::AccumulatorOverflow`] if the geometry exceeds what an
    /// `i64` accumulator can hold.
    pub fn from_rows(rows: &[Vec<u16>]) -> Result<Self> {
        let row_count = rows.len();
        let cell_count = rows.first().map_or(0, Vec::len);
        if row_count == 0 || cell_count == 0 {
            return Err(DomainError::EmptyArray);
        }
        for (r, row) in rows.iter().enumerate() {
            if row.len() != cell_count {
                return Err(DomainError::ragged_row(r, row.len(), cell_count));
            }
        }

        let geometry = ArrayGeometry {
            rows: row_count,
            cells: cell_count,
        };
        if !geometry.fits_i64_accumulator() {
            return Err(DomainError::AccumulatorOverflow {
                rows: geometry.rows,
                cells: geometry.cells,
                bits: geometry.accumulator_bits(),
            });
        }

        let cells = rows
            .iter()
            .flat_map(|row| row.iter().copied().map(WeightCell::new))
            .collect();

        info!("Crossbar array loaded: {geometry} ({} nibble columns)", geometry.nibble_columns());
        Ok(Self { geometry, cells })
    }

    /// Array geometry.
    #[must_use]
    pub const fn geometry(&self) -> ArrayGeometry {
        self.geometry
    }

    /// Cell at `(row, cell)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is outside the grid.
    #[must_use]
    pub fn cell(&self, row: usize, cell: usize) -> &WeightCell {
        assert!(row < self.geometry.rows && cell < self.geometry.cells);
        &self.cells[row * self.geometry.cells + cell]
    }

    /// One row of cells.
    #[must_use]
    pub fn row(&self, row: usize) -> &[WeightCell] {
        let c = self.geometry.cells;
        &self.cells[row * c..(row + 1) * c]
    }

    /// The R×(C·4) physical column view: nibble at column `col` of `row`.
    ///
    /// Column `col` maps to digit `col % 4` of cell `col / 4` — each weight
    /// cell occupies four consecutive physical columns.
    #[must_use]
    pub fn nibble_column(&self, row: usize, col: usize) -> u8 {
        let cell = col / xbar_chip::NIBBLES_PER_WORD;
        let digit = col % xbar_chip::NIBBLES_PER_WORD;
        self.cell(row, cell).digits().digit(digit)
    }
}
