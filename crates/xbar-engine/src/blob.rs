//! Compact weight blob format.
//!
//! Lets a weight array travel as a single byte payload (fixtures, CLI,
//! future transports):
//!
//! ```text
//! [rows u32 LE][cells u32 LE][rows·cells × u16 LE, row-major]
//! ```

use crate::array::CrossbarArray;
use crate::error::{DomainError, Result};
use bytes::Bytes;
use tracing::debug;

/// Fixed header size: two little-endian u32 dimensions.
pub const BLOB_HEADER_BYTES: usize = 8;

impl CrossbarArray {
    /// Serialize the array into the blob format.
    #[must_use]
    pub fn to_blob(&self) -> Bytes {
        let geometry = self.geometry();
        let mut blob = Vec::with_capacity(BLOB_HEADER_BYTES + geometry.cell_count() * 2);
        #[allow(clippy::cast_possible_truncation)]
        {
            blob.extend_from_slice(&(geometry.rows as u32).to_le_bytes());
            blob.extend_from_slice(&(geometry.cells as u32).to_le_bytes());
        }
        for r in 0..geometry.rows {
            for cell in self.row(r) {
                blob.extend_from_slice(&cell.word().to_le_bytes());
            }
        }
        Bytes::from(blob)
    }

    /// Parse an array from the blob format.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::BlobTooShort`] if the header is truncated,
    /// [`DomainError::BlobSizeMismatch`] if the payload does not match the
    /// declared geometry, and the usual shape errors for a degenerate
    /// declared geometry.
    pub fn from_blob(data: &[u8]) -> Result<Self> {
        if data.len() < BLOB_HEADER_BYTES {
            return Err(DomainError::BlobTooShort {
                got: data.len(),
                expected: BLOB_HEADER_BYTES,
            });
        }
        let rows = u32::from_le_bytes(data[0..4].try_into().expect("4-byte slice")) as usize;
        let cells = u32::from_le_bytes(data[4..8].try_into().expect("4-byte slice")) as usize;

        let expected = BLOB_HEADER_BYTES + rows * cells * 2;
        if data.len() != expected {
            return Err(DomainError::BlobSizeMismatch {
                got: data.len(),
                rows,
                cells,
                expected,
            });
        }

        debug!("Parsing weight blob: {rows}x{cells}, {} bytes", data.len());

        let mut matrix = Vec::with_capacity(rows);
        let mut words = data[BLOB_HEADER_BYTES..]
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes(pair.try_into().expect("2-byte chunk")));
        for _ in 0..rows {
            matrix.push(words.by_ref().take(cells).collect::<Vec<u16>>());
        }
        Self::from_rows(&matrix)
    }
}

/// Pack a weight matrix straight into blob bytes.
///
/// Convenience wrapper validating through [`CrossbarArray::from_rows`].
///
/// # Errors
///
/// Same validation as [`CrossbarArray::from_rows`].
pub fn pack_weights(rows: &[Vec<u16>]) -> Result<Bytes> {
    Ok(CrossbarArray::from_rows(rows)?.to_blob())
}
