//! Error types for crossbar engine operations

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, DomainError>;

/// Data-domain violations: values outside the declared bit-width, or shapes
/// that do not match the loaded array. Always raised before any partial
/// work is committed.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Weight matrix has no rows or no cells
    #[error("Weight matrix is empty")]
    EmptyArray,

    /// Weight matrix rows have inconsistent lengths
    #[error("Ragged weight matrix: row {row} has {got} cells, expected {expected}")]
    RaggedRow {
        /// Offending row index
        row: usize,
        /// Cells found in that row
        got: usize,
        /// Cells in row 0
        expected: usize,
    },

    /// Input vector length does not match the array's row count
    #[error("Input length mismatch: got {got} operands, array has {expected} rows")]
    InputLengthMismatch {
        /// Operands supplied
        got: usize,
        /// Rows in the loaded array
        expected: usize,
    },

    /// A raw digit does not fit in 4 bits
    #[error("Nibble digit out of range: {value} (digits are 4-bit, 0..=15)")]
    DigitOutOfRange {
        /// Offending digit value
        value: u8,
    },

    /// Weight blob shorter than its fixed header
    #[error("Weight blob too short: {got} bytes, need at least {expected}")]
    BlobTooShort {
        /// Bytes supplied
        got: usize,
        /// Minimum bytes required
        expected: usize,
    },

    /// Weight blob payload does not match its declared geometry
    #[error("Weight blob size mismatch: {got} bytes for a {rows}x{cells} array, expected {expected}")]
    BlobSizeMismatch {
        /// Bytes supplied
        got: usize,
        /// Declared rows
        rows: usize,
        /// Declared cells
        cells: usize,
        /// Bytes required for the declared geometry
        expected: usize,
    },

    /// Geometry too large for the i64 accumulator
    #[error("Geometry {rows}x{cells} needs a {bits}-bit accumulator, i64 holds at most 63")]
    AccumulatorOverflow {
        /// Declared rows
        rows: usize,
        /// Declared cells
        cells: usize,
        /// Required accumulator width
        bits: u32,
    },
}

impl DomainError {
    /// Create a ragged-row error
    pub const fn ragged_row(row: usize, got: usize, expected: usize) -> Self {
        Self::RaggedRow { row, got, expected }
    }

    /// Create an input-length mismatch error
    pub const fn input_length_mismatch(got: usize, expected: usize) -> Self {
        Self::InputLengthMismatch { got, expected }
    }
}
