//! Crossbar MAC engine.
//!
//! Simulates the arithmetic of a crossbar compute tile whose cells can only
//! multiply 4-bit × 4-bit operands. Wide weights are stored decomposed into
//! nibble digits ([`CrossbarArray`]), and a full-precision multiply-
//! accumulate is reconstructed by shifting and summing the digit cross
//! terms ([`MacEngine::compute`]) — bit-exact against native wide
//! multiplication, which is the whole point of the model.
//!
//! # Quick start
//!
//! ```
//! use xbar_engine::MacEngine;
//!
//! # fn main() -> xbar_engine::Result<()> {
//! let engine = MacEngine::from_rows(&[vec![0x1234]])?;
//! assert_eq!(engine.compute(&[1])?, vec![0x1234]);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

mod array;
mod blob;
mod engine;
mod error;

pub use array::{CrossbarArray, WeightCell};
pub use blob::{pack_weights, BLOB_HEADER_BYTES};
pub use engine::{cross_term_sum, nibble_mul, MacEngine};
pub use error::{DomainError, Result};

/// Commonly used types.
pub mod prelude {
    pub use crate::{CrossbarArray, DomainError, MacEngine, Result};
}
