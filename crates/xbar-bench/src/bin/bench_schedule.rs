//! Schedule construction throughput across a chunk-count sweep.
//!
//! The whole schedule is computed in one pass, so wall time should scale
//! linearly with event count; this benchmark watches for regressions and
//! reports makespan alongside.
//!
//! Usage:
//!   cargo run -r --bin bench_schedule

use anyhow::Result;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use xbar_engine::MacEngine;
use xbar_pipeline::{PipelineSimulator, RampSource, SimConfig};

const ROWS: usize = 32;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    println!("Pipeline schedule benchmark");
    println!("===========================");
    println!("Geometry: {ROWS}x8, 2 layers, 1 buffer slot");
    println!();
    println!(
        "  {:>7}  {:>8}  {:>12}  {:>10}  {:>12}",
        "chunks", "events", "build time", "makespan", "events/ms"
    );

    for &chunks in &[1usize, 8, 64, 256, 1024] {
        let weights: Vec<Vec<u16>> = (0..ROWS)
            .map(|r| (0..8).map(|c| ((r * 257 + c * 4099) & 0xFFFF) as u16).collect())
            .collect();
        let engine = MacEngine::from_rows(&weights)?;

        let config = SimConfig {
            chunks_per_image: chunks,
            ..SimConfig::default()
        };
        let sim = PipelineSimulator::new(config, engine)?;
        let mut source = RampSource::new(ROWS);

        let t0 = Instant::now();
        let report = sim.run(&mut source, &[])?;
        let elapsed = t0.elapsed();

        let ms = elapsed.as_secs_f64() * 1e3;
        println!(
            "  {:>7}  {:>8}  {:>9.2} ms  {:>10}  {:>12.0}",
            chunks,
            report.events.len(),
            ms,
            report.makespan(),
            report.events.len() as f64 / ms.max(1e-9)
        );
    }

    Ok(())
}
