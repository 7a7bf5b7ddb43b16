//! Error types for pipeline configuration and simulation

use std::path::PathBuf;
use thiserror::Error;
use xbar_engine::DomainError;

/// Configuration violations, validated once at simulator construction and
/// never mid-run.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No logical layers configured
    #[error("At least one logical layer is required")]
    NoLayers,

    /// chunks_per_image must be positive
    #[error("chunks_per_image must be positive")]
    NonPositiveChunks,

    /// images must be positive
    #[error("images must be positive")]
    NonPositiveImages,

    /// buffer_slots must be positive
    #[error("buffer_slots must be positive (1 models the reference double buffer)")]
    ZeroBufferSlots,

    /// Activation variant not recognized
    #[error("Unrecognized activation variant: {name:?} (expected \"relu\" or \"leaky\")")]
    UnknownActivation {
        /// Name supplied
        name: String,
    },

    /// IoU threshold outside the unit interval
    #[error("iou_threshold {value} outside [0, 1]")]
    IouOutOfRange {
        /// Value supplied
        value: f32,
    },

    /// Config file could not be read
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// Path that was attempted
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Config file could not be parsed
    #[error("Failed to parse config: {reason}")]
    Parse {
        /// Reason from the TOML parser
        reason: String,
    },
}

impl ConfigError {
    /// Create an unknown-activation error
    pub fn unknown_activation(name: impl Into<String>) -> Self {
        Self::UnknownActivation { name: name.into() }
    }

    /// Create a parse error
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    /// Configuration rejected at construction
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Data-domain violation from the MAC engine
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Tile source had no tile for the requested position
    #[error("Tile source exhausted at image {image}, chunk {chunk}")]
    SourceExhausted {
        /// Image index requested
        image: usize,
        /// Chunk index requested
        chunk: usize,
    },
}
