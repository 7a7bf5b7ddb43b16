//! Discrete-event timing model of the crossbar processing pipeline.
//!
//! Simulates a chain of heterogeneous-latency stages — fetch, crossbar MAC
//! compute, activation, transfer, per-image detect — as single-server FIFO
//! resources in logical time, with a bounded fetch→compute buffer (double
//! buffering) capping in-flight tiles. The emitted schedule is
//! deterministic and reproducible; it is the model's primary artifact.
//!
//! # Quick start
//!
//! ```
//! use xbar_engine::MacEngine;
//! use xbar_pipeline::{PipelineSimulator, RampSource, SimConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = MacEngine::from_rows(&[vec![0x1234; 8]; 32])?;
//! let sim = PipelineSimulator::new(SimConfig::default(), engine)?;
//! let mut source = RampSource::new(32);
//! let report = sim.run(&mut source, &[])?;
//! println!("makespan: {} ticks", report.makespan());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

mod activation;
mod config;
mod error;
mod event;
mod nms;
mod simulator;
mod source;
mod stage;

pub use activation::Activation;
pub use config::{LayerSpec, SimConfig, StageDurations};
pub use error::{ConfigError, SimError};
pub use event::{peak_buffer_occupancy, ScheduleEvent, SimReport};
pub use nms::{suppress, ScoredBox};
pub use simulator::PipelineSimulator;
pub use source::{FixtureSource, RampSource, TileSource};
pub use stage::StageId;

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        Activation, ConfigError, PipelineSimulator, ScoredBox, SimConfig, SimError, SimReport,
        StageId, TileSource,
    };
}
