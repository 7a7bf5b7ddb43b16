//! The pipeline simulator.
//!
//! Logical-time discrete-event model: no threads, no blocking. The whole
//! schedule for a run is computed in one pass because stage `s` of chunk
//! `k` depends only on stage `s−1` of chunk `k` and stage `s` of chunk
//! `k−1` — a strict acyclic chain in submission order. All timeline state
//! lives in per-run [`Stage`] values owned here, so concurrent runs of
//! different simulators cannot interfere.

use crate::config::SimConfig;
use crate::error::{ConfigError, SimError};
use crate::event::{peak_buffer_occupancy, ScheduleEvent, SimReport};
use crate::nms::{suppress, ScoredBox};
use crate::source::TileSource;
use crate::stage::{Stage, StageId, TileBuffer};
use tracing::{debug, info};
use xbar_engine::MacEngine;

/// Multi-stage pipeline simulator around one crossbar MAC engine.
#[derive(Debug)]
pub struct PipelineSimulator {
    config: SimConfig,
    engine: MacEngine,
}

impl PipelineSimulator {
    /// Create a simulator, validating the configuration once.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] the configuration violates.
    pub fn new(config: SimConfig, engine: MacEngine) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, engine })
    }

    /// The validated configuration.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// The MAC engine used by the compute stage.
    #[must_use]
    pub const fn engine(&self) -> &MacEngine {
        &self.engine
    }

    /// Run the full schedule: every chunk of every image through
    /// fetch → (compute → activate → transfer) per layer, then one detect
    /// pass per image over its candidate boxes.
    ///
    /// Events are emitted in submission order and the same inputs always
    /// produce the same report.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Domain`] if a tile does not match the loaded
    /// array, or the source's own error for a missing tile. Validation
    /// happens before the corresponding work is committed to the timeline
    /// state visible in the report — a failed run yields no report at all.
    pub fn run(
        &self,
        source: &mut dyn TileSource,
        candidates: &[Vec<ScoredBox>],
    ) -> Result<SimReport, SimError> {
        let durations = self.config.stage_durations;
        let mut fetch = Stage::new(StageId::Fetch, durations.fetch);
        let mut compute = Stage::new(StageId::Compute, durations.compute);
        let mut activate = Stage::new(StageId::Activate, durations.activate);
        let mut transfer = Stage::new(StageId::Transfer, durations.transfer);
        let mut detect = Stage::new(StageId::Detect, durations.detect);
        let mut buffer = TileBuffer::new(self.config.buffer_slots);

        let rows = self.engine.geometry().rows;
        let mut events = Vec::new();
        let mut detections = Vec::with_capacity(self.config.images);
        let mut tile_outputs = Vec::with_capacity(self.config.images);

        info!(
            "Pipeline run: {} image(s) x {} chunk(s), {} layer(s), {} buffer slot(s)",
            self.config.images,
            self.config.chunks_per_image,
            self.config.layers.len(),
            self.config.buffer_slots
        );

        for image in 0..self.config.images {
            let mut image_outputs = Vec::with_capacity(self.config.chunks_per_image);
            let mut last_transfer_end = 0u64;

            for chunk in 0..self.config.chunks_per_image {
                let tile = source.fetch_tile(image, chunk)?;

                let (fetch_start, fetch_end) = fetch.occupy(buffer.slot_ready());
                events.push(ScheduleEvent {
                    stage: StageId::Fetch,
                    image,
                    chunk: Some(chunk),
                    layer: None,
                    start: fetch_start,
                    end: fetch_end,
                });

                let mut ready = fetch_end;
                let mut layer_input = tile;
                let mut activated = Vec::new();

                for (layer, spec) in self.config.layers.iter().enumerate() {
                    // Compute result first: a domain error must abort the
                    // run before the stage timeline advances.
                    let mut outputs = self.engine.compute(&layer_input)?;

                    let (start, end) = compute.occupy(ready);
                    if layer == 0 {
                        buffer.admit(start);
                    }
                    events.push(ScheduleEvent {
                        stage: StageId::Compute,
                        image,
                        chunk: Some(chunk),
                        layer: Some(layer),
                        start,
                        end,
                    });

                    let (start, end) = activate.occupy(end);
                    spec.activation.apply_all(&mut outputs);
                    events.push(ScheduleEvent {
                        stage: StageId::Activate,
                        image,
                        chunk: Some(chunk),
                        layer: Some(layer),
                        start,
                        end,
                    });

                    // Transfer is an identity pass-through; it only holds a
                    // timeline slot for the data movement.
                    let (start, end) = transfer.occupy(end);
                    events.push(ScheduleEvent {
                        stage: StageId::Transfer,
                        image,
                        chunk: Some(chunk),
                        layer: Some(layer),
                        start,
                        end,
                    });

                    ready = end;
                    layer_input = fold_to_tile(&outputs, rows);
                    activated = outputs;
                }

                last_transfer_end = last_transfer_end.max(ready);
                image_outputs.push(activated);
            }

            let (start, end) = detect.occupy(last_transfer_end);
            events.push(ScheduleEvent {
                stage: StageId::Detect,
                image,
                chunk: None,
                layer: None,
                start,
                end,
            });

            let image_boxes = candidates.get(image).map_or(&[][..], Vec::as_slice);
            let kept = suppress(image_boxes, self.config.iou_threshold);
            debug!("Image {image}: detect [{start}, {end}), {} box(es) kept", kept.len());
            detections.push(kept);
            tile_outputs.push(image_outputs);
        }

        let peak = peak_buffer_occupancy(&events);
        debug_assert!(peak <= self.config.buffer_slots);

        Ok(SimReport {
            events,
            detections,
            tile_outputs,
            peak_buffer_occupancy: peak,
        })
    }
}

/// Derive the next layer's input tile from activated outputs: saturate each
/// value into the operand range, then zero-pad or truncate to `rows`.
fn fold_to_tile(activated: &[i64], rows: usize) -> Vec<u16> {
    let mut tile: Vec<u16> = activated
        .iter()
        .map(|&v| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                v.clamp(0, i64::from(u16::MAX)) as u16
            }
        })
        .collect();
    tile.resize(rows, 0);
    tile
}
