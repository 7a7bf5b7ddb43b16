//! Simulation configuration, with an optional TOML file layer.
//!
//! All knobs are validated once, at simulator construction — a run never
//! fails on configuration mid-flight.

use crate::activation::Activation;
use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;

/// Fixed service time per stage, in timeline ticks.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct StageDurations {
    /// Stage 0: tile fetch.
    pub fetch: u64,
    /// Crossbar MAC invocation.
    pub compute: u64,
    /// Elementwise activation.
    pub activate: u64,
    /// Data-movement slot (identity pass-through).
    pub transfer: u64,
    /// Per-image detection post-processing.
    pub detect: u64,
}

impl Default for StageDurations {
    fn default() -> Self {
        // Reference instance timings.
        Self {
            fetch: 2,
            compute: 5,
            activate: 1,
            transfer: 1,
            detect: 4,
        }
    }
}

/// One logical layer: a compute/activate/transfer pass over the chunk.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct LayerSpec {
    /// Activation variant for this layer.
    pub activation: Activation,
}

impl Default for LayerSpec {
    fn default() -> Self {
        Self {
            activation: Activation::Relu,
        }
    }
}

/// Full simulation configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Per-stage service durations.
    pub stage_durations: StageDurations,
    /// Ordered logical layers; all reuse the same physical stage timelines.
    pub layers: Vec<LayerSpec>,
    /// Chunks per image.
    pub chunks_per_image: usize,
    /// Images per run.
    pub images: usize,
    /// Fetch→compute buffer slots (1 = the reference double buffer).
    pub buffer_slots: usize,
    /// IoU threshold for detection suppression.
    pub iou_threshold: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        // Reference instance: two logical layers, double-buffered fetch.
        Self {
            stage_durations: StageDurations::default(),
            layers: vec![LayerSpec::default(), LayerSpec::default()],
            chunks_per_image: 4,
            images: 1,
            buffer_slots: 1,
            iou_threshold: 0.3,
        }
    }
}

impl SimConfig {
    /// Validate every knob.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found; the error carries the
    /// offending value where one exists.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layers.is_empty() {
            return Err(ConfigError::NoLayers);
        }
        if self.chunks_per_image == 0 {
            return Err(ConfigError::NonPositiveChunks);
        }
        if self.images == 0 {
            return Err(ConfigError::NonPositiveImages);
        }
        if self.buffer_slots == 0 {
            return Err(ConfigError::ZeroBufferSlots);
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(ConfigError::IouOutOfRange {
                value: self.iou_threshold,
            });
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and any
    /// [`validate`](Self::validate) error afterwards.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, plus the
    /// parse/validate errors of [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimConfig::default();
        config.validate().unwrap();
        assert_eq!(config.layers.len(), 2);
        assert_eq!(config.buffer_slots, 1);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = SimConfig::from_toml_str("").unwrap();
        assert_eq!(config.chunks_per_image, 4);
        assert_eq!(config.stage_durations.compute, 5);
    }

    #[test]
    fn full_toml_round() {
        let toml_str = r#"
chunks_per_image = 16
images = 3
buffer_slots = 2
iou_threshold = 0.5

[stage_durations]
fetch = 1
compute = 10
activate = 2
transfer = 3
detect = 8

[[layers]]
activation = "relu"

[[layers]]
activation = "leaky"

[[layers]]
activation = "relu"
"#;
        let config = SimConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.chunks_per_image, 16);
        assert_eq!(config.stage_durations.compute, 10);
        assert_eq!(config.layers.len(), 3);
        assert_eq!(config.layers[1].activation, Activation::Leaky);
    }

    #[test]
    fn unknown_activation_rejected_at_parse() {
        let toml_str = r#"
[[layers]]
activation = "swish"
"#;
        assert!(matches!(
            SimConfig::from_toml_str(toml_str),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn validation_catches_each_knob() {
        let mut config = SimConfig::default();
        config.layers.clear();
        assert!(matches!(config.validate(), Err(ConfigError::NoLayers)));

        let mut config = SimConfig::default();
        config.chunks_per_image = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveChunks)
        ));

        let mut config = SimConfig::default();
        config.images = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveImages)
        ));

        let mut config = SimConfig::default();
        config.buffer_slots = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroBufferSlots)));

        let mut config = SimConfig::default();
        config.iou_threshold = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::IouOutOfRange { .. })
        ));
    }
}
