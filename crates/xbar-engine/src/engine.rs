//! Nibble cross-term multiply-accumulate.
//!
//! The modeled tile multiplies 4-bit × 4-bit per cell and nothing wider. A
//! full 16×16 product is therefore the schoolbook expansion over digit
//! pairs,
//!
//! ```text
//! a · b = Σ_{i=0..3} Σ_{j=0..3} a[i] · b[j] · 2^(4·((3−i)+(3−j)))
//! ```
//!
//! with digit 0 most significant. [`MacEngine::compute`] runs that expansion
//! for every (row, cell) pair and accumulates per cell — deliberately *not*
//! a native wide multiply, so the simulation exercises the same
//! route/shift/accumulate path the hardware is constrained to. The result is
//! still bit-exact against `a as u64 * b as u64`; the parity tests hold the
//! two paths together.

use crate::array::CrossbarArray;
use crate::error::{DomainError, Result};
use tracing::debug;
use xbar_chip::nibble::{decompose, NibbleVector, NIBBLES_PER_WORD, NIBBLE_BITS};
use xbar_chip::ArrayGeometry;

/// Sum of shifted digit cross terms for one operand pair.
///
/// This is the per-cell work: 16 narrow multiplies, each routed to its
/// weight `2^(4·((3−i)+(3−j)))` and accumulated.
#[must_use]
pub fn cross_term_sum(a: &NibbleVector, b: &NibbleVector) -> u64 {
    let top = NIBBLES_PER_WORD - 1;
    let mut sum = 0u64;
    for i in 0..NIBBLES_PER_WORD {
        for j in 0..NIBBLES_PER_WORD {
            let shift = NIBBLE_BITS * ((top - i) + (top - j)) as u32;
            sum += (u64::from(a.digit(i)) * u64::from(b.digit(j))) << shift;
        }
    }
    sum
}

/// Full-precision product of two words via the digit expansion.
///
/// Equals `u64::from(a) * u64::from(b)` exactly; exists so tests and tools
/// can cross-check the constrained path against the native one.
#[must_use]
pub fn nibble_mul(a: u16, b: u16) -> u64 {
    cross_term_sum(&decompose(a), &decompose(b))
}

/// Crossbar MAC engine: a loaded weight array plus the compute step.
#[derive(Debug, Clone)]
pub struct MacEngine {
    array: CrossbarArray,
}

impl MacEngine {
    /// Wrap an already-built array.
    #[must_use]
    pub const fn new(array: CrossbarArray) -> Self {
        Self { array }
    }

    /// Build an engine directly from a weight matrix.
    ///
    /// # Errors
    ///
    /// Same validation as [`CrossbarArray::from_rows`].
    pub fn from_rows(rows: &[Vec<u16>]) -> Result<Self> {
        Ok(Self::new(CrossbarArray::from_rows(rows)?))
    }

    /// Replace the loaded array atomically.
    ///
    /// The replacement is fully built and validated before the old array is
    /// dropped; on error the previous array stays active.
    ///
    /// # Errors
    ///
    /// Same validation as [`CrossbarArray::from_rows`].
    pub fn load(&mut self, rows: &[Vec<u16>]) -> Result<()> {
        self.array = CrossbarArray::from_rows(rows)?;
        Ok(())
    }

    /// The loaded array.
    #[must_use]
    pub const fn array(&self) -> &CrossbarArray {
        &self.array
    }

    /// Geometry of the loaded array.
    #[must_use]
    pub const fn geometry(&self) -> ArrayGeometry {
        self.array.geometry()
    }

    /// One MAC invocation: accumulate every input row against every cell.
    ///
    /// `inputs` supplies one operand per row. Each cell's accumulator sums
    /// the digit cross-term expansion of `input[r] × weight[r][c]` over all
    /// rows; accumulators are `i64`, wide enough for the loaded geometry by
    /// construction.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InputLengthMismatch`] before any accumulation
    /// if `inputs.len()` differs from the array's row count.
    pub fn compute(&self, inputs: &[u16]) -> Result<Vec<i64>> {
        let geometry = self.array.geometry();
        if inputs.len() != geometry.rows {
            return Err(DomainError::input_length_mismatch(
                inputs.len(),
                geometry.rows,
            ));
        }

        debug!("MAC compute: {geometry} array, {} inputs", inputs.len());

        let mut accumulators = vec![0i64; geometry.cells];
        for (r, &input) in inputs.iter().enumerate() {
            let input_digits = decompose(input);
            for (acc, cell) in accumulators.iter_mut().zip(self.array.row(r)) {
                #[allow(clippy::cast_possible_wrap)]
                {
                    *acc += cross_term_sum(&input_digits, cell.digits()) as i64;
                }
            }
        }
        Ok(accumulators)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_term_matches_native_product() {
        for &(a, b) in &[
            (0u16, 0u16),
            (0, 0xFFFF),
            (1, 0x1234),
            (0x8000, 2),
            (0xFFFF, 0xFFFF),
            (0x0F0F, 0xF0F0),
        ] {
            assert_eq!(nibble_mul(a, b), u64::from(a) * u64::from(b), "{a:#06x} * {b:#06x}");
        }
    }

    #[test]
    fn unit_input_reads_back_weight() {
        // weight 0x1234 × input 1 in a 1×1 array ⇒ 4660
        let engine = MacEngine::from_rows(&[vec![0x1234]]).unwrap();
        assert_eq!(engine.compute(&[1]).unwrap(), vec![0x1234]);
        assert_eq!(engine.compute(&[1]).unwrap(), vec![4660]);
    }

    #[test]
    fn compute_rejects_wrong_input_length() {
        let engine = MacEngine::from_rows(&[vec![1, 2], vec![3, 4]]).unwrap();
        match engine.compute(&[1]) {
            Err(DomainError::InputLengthMismatch { got, expected }) => {
                assert_eq!((got, expected), (1, 2));
            }
            other => panic!("expected InputLengthMismatch, got {other:?}"),
        }
    }

    #[test]
    fn accumulation_is_linear_over_rows() {
        let rows = vec![
            vec![0x1111, 0xFFFF],
            vec![0x2222, 0x0001],
            vec![0xABCD, 0x8000],
        ];
        let inputs = [0x0101u16, 0xFFFF, 0x00FF];

        let engine = MacEngine::from_rows(&rows).unwrap();
        let combined = engine.compute(&inputs).unwrap();

        let mut summed = vec![0i64; 2];
        for (row, &input) in rows.iter().zip(inputs.iter()) {
            let single = MacEngine::from_rows(&[row.clone()]).unwrap();
            for (s, v) in summed.iter_mut().zip(single.compute(&[input]).unwrap()) {
                *s += v;
            }
        }
        assert_eq!(combined, summed);
    }

    #[test]
    fn failed_load_keeps_previous_array() {
        let mut engine = MacEngine::from_rows(&[vec![7]]).unwrap();
        let err = engine.load(&[vec![1, 2], vec![3]]);
        assert!(err.is_err());
        assert_eq!(engine.compute(&[1]).unwrap(), vec![7]);
    }

    #[test]
    fn max_geometry_does_not_overflow() {
        // Worst case for the reference geometry: every operand 0xFFFF.
        let rows = vec![vec![u16::MAX; 8]; 32];
        let engine = MacEngine::from_rows(&rows).unwrap();
        let inputs = vec![u16::MAX; 32];
        let out = engine.compute(&inputs).unwrap();
        let expected = 32 * i64::from(u16::MAX) * i64::from(u16::MAX);
        assert!(out.iter().all(|&v| v == expected));
    }
}
