//! Tile sources.
//!
//! Where input tiles come from is an external collaborator's concern; the
//! simulator only needs one length-R operand vector per (image, chunk).
//! The trait seam lets tests inject fixtures and tools generate data.

use crate::error::SimError;

/// Supplies the Stage-0 input tile for each (image, chunk).
pub trait TileSource {
    /// Fetch the tile for `image`, `chunk`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::SourceExhausted`] (or a domain error) if the
    /// source cannot produce the requested tile.
    fn fetch_tile(&mut self, image: usize, chunk: usize) -> Result<Vec<u16>, SimError>;
}

/// Explicit per-image, per-chunk tiles — the test fixture source.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    tiles: Vec<Vec<Vec<u16>>>,
}

impl FixtureSource {
    /// Wrap `tiles[image][chunk]` vectors.
    #[must_use]
    pub fn new(tiles: Vec<Vec<Vec<u16>>>) -> Self {
        Self { tiles }
    }
}

impl TileSource for FixtureSource {
    fn fetch_tile(&mut self, image: usize, chunk: usize) -> Result<Vec<u16>, SimError> {
        self.tiles
            .get(image)
            .and_then(|chunks| chunks.get(chunk))
            .cloned()
            .ok_or(SimError::SourceExhausted { image, chunk })
    }
}

/// Deterministic arithmetic tile generator for tools and benchmarks.
///
/// Values are a fixed linear mix of (image, chunk, row) — reproducible
/// across runs by construction, no randomness involved.
#[derive(Debug, Clone, Copy)]
pub struct RampSource {
    rows: usize,
}

impl RampSource {
    /// Generator producing length-`rows` tiles.
    #[must_use]
    pub const fn new(rows: usize) -> Self {
        Self { rows }
    }
}

impl TileSource for RampSource {
    fn fetch_tile(&mut self, image: usize, chunk: usize) -> Result<Vec<u16>, SimError> {
        #[allow(clippy::cast_possible_truncation)]
        let tile = (0..self.rows)
            .map(|r| (image.wrapping_mul(4969) ^ chunk.wrapping_mul(1013) ^ r.wrapping_mul(389)) as u16)
            .collect();
        Ok(tile)
    }
}
