//! `xbar` — command-line interface for the crossbar pipeline simulator.
//!
//! ```text
//! USAGE:
//!   xbar simulate [--config sim.toml]    Run the pipeline, print the schedule
//!   xbar mac --weight W --input X        Single-cell MAC parity check
//!   xbar decompose <value>               Print a word's nibble digits
//!   xbar suppress --boxes boxes.toml     NMS over a TOML box list
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use xbar_chip::nibble;
use xbar_engine::{nibble_mul, MacEngine};
use xbar_pipeline::{suppress, PipelineSimulator, RampSource, ScoredBox, SimConfig, StageId};

#[derive(Parser)]
#[command(name = "xbar", about = "Nibble-serial crossbar pipeline simulator", version)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Run the full pipeline on generated tiles and print the schedule.
    Simulate {
        /// TOML configuration file (defaults apply if omitted).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the number of images.
        #[arg(long)]
        images: Option<usize>,
        /// Override the number of chunks per image.
        #[arg(long)]
        chunks: Option<usize>,
    },
    /// Compute one weight × input product through the nibble path.
    Mac {
        /// Stored weight (decimal or 0x-prefixed hex).
        #[arg(long)]
        weight: String,
        /// Input operand (decimal or 0x-prefixed hex).
        #[arg(long)]
        input: String,
    },
    /// Print a word's nibble digits and the reassembled word.
    Decompose {
        /// Word to decompose (decimal or 0x-prefixed hex).
        value: String,
    },
    /// Suppress overlapping boxes from a TOML file.
    Suppress {
        /// TOML file with a [[boxes]] list.
        #[arg(long)]
        boxes: PathBuf,
        /// IoU threshold.
        #[arg(long, default_value = "0.3")]
        iou_threshold: f32,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Cmd::Simulate { config, images, chunks } => cmd_simulate(config, images, chunks)?,
        Cmd::Mac { weight, input } => cmd_mac(&weight, &input)?,
        Cmd::Decompose { value } => cmd_decompose(&value)?,
        Cmd::Suppress { boxes, iou_threshold } => cmd_suppress(&boxes, iou_threshold)?,
    }

    Ok(())
}

fn cmd_simulate(config: Option<PathBuf>, images: Option<usize>, chunks: Option<usize>) -> Result<()> {
    let mut config = match config {
        Some(path) => SimConfig::load(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SimConfig::default(),
    };
    if let Some(images) = images {
        config.images = images;
    }
    if let Some(chunks) = chunks {
        config.chunks_per_image = chunks;
    }

    // Deterministic demo weights on the reference 32×8 geometry.
    let weights: Vec<Vec<u16>> = (0..32)
        .map(|r| (0..8).map(|c| ((r * 257 + c * 4099) & 0xFFFF) as u16).collect())
        .collect();
    let engine = MacEngine::from_rows(&weights)?;
    let rows = engine.geometry().rows;

    let sim = PipelineSimulator::new(config, engine)?;
    let candidates = demo_candidates(sim.config().images);
    let report = sim.run(&mut RampSource::new(rows), &candidates)?;

    println!("Schedule ({} events)", report.events.len());
    println!("-----------------------------------------");
    for event in &report.events {
        println!("  {event}");
    }
    println!();

    println!("Stage utilization");
    println!("-----------------");
    for stage in [
        StageId::Fetch,
        StageId::Compute,
        StageId::Activate,
        StageId::Transfer,
        StageId::Detect,
    ] {
        let busy = report.busy_ticks(stage);
        #[allow(clippy::cast_precision_loss)]
        let pct = 100.0 * busy as f64 / report.makespan().max(1) as f64;
        println!("  {:>8}  {:>6} ticks  {:>5.1}%", stage.label(), busy, pct);
    }
    println!();

    for (image, kept) in report.detections.iter().enumerate() {
        println!("Image {image}: {} box(es) kept", kept.len());
        for b in kept {
            println!(
                "  class {:>3}  score {:.3}  ({:.0},{:.0})..({:.0},{:.0})",
                b.class_id, b.score, b.x1, b.y1, b.x2, b.y2
            );
        }
    }
    println!();
    println!(
        "Makespan {} ticks, peak buffer occupancy {}",
        report.makespan(),
        report.peak_buffer_occupancy
    );

    Ok(())
}

fn cmd_mac(weight: &str, input: &str) -> Result<()> {
    let weight = parse_word(weight)?;
    let input = parse_word(input)?;

    let engine = MacEngine::from_rows(&[vec![weight]])?;
    let out = engine.compute(&[input])?;
    let native = u64::from(weight) * u64::from(input);

    println!("weight    : {weight:#06x} ({weight})");
    println!("input     : {input:#06x} ({input})");
    println!("nibble MAC: {}", out[0]);
    println!("native    : {native}");
    println!("cross-sum : {}", nibble_mul(weight, input));
    anyhow::ensure!(out[0] == i64::try_from(native)?, "nibble path diverged from native product");
    println!("parity    : ok");
    Ok(())
}

fn cmd_decompose(value: &str) -> Result<()> {
    let word = parse_word(value)?;
    let v = nibble::decompose(word);
    let digits = v.digits();
    println!("word   : {word:#06x} ({word})");
    println!(
        "digits : [{:#x}, {:#x}, {:#x}, {:#x}]  (msb first)",
        digits[0], digits[1], digits[2], digits[3]
    );
    println!("rejoin : {:#06x}", nibble::reassemble(&v));
    Ok(())
}

/// Box list file: `[[boxes]]` entries with x1/y1/x2/y2/score/class_id.
#[derive(Debug, Deserialize)]
struct BoxFile {
    boxes: Vec<ScoredBox>,
}

fn cmd_suppress(path: &PathBuf, iou_threshold: f32) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let file: BoxFile = toml::from_str(&content)
        .with_context(|| format!("parsing {}", path.display()))?;

    let kept = suppress(&file.boxes, iou_threshold);
    println!("{} candidate(s), {} kept at IoU ≤ {iou_threshold}", file.boxes.len(), kept.len());
    for b in &kept {
        println!(
            "  class {:>3}  score {:.3}  ({:.0},{:.0})..({:.0},{:.0})",
            b.class_id, b.score, b.x1, b.y1, b.x2, b.y2
        );
    }
    Ok(())
}

/// Accept decimal or 0x-prefixed hex, range-checked into a 16-bit word.
fn parse_word(s: &str) -> Result<u16> {
    let s = s.trim();
    let value = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)?
    } else {
        s.parse::<u32>()?
    };
    u16::try_from(value).with_context(|| format!("{s} does not fit in 16 bits (max 0xFFFF)"))
}

/// Fixed demo candidate set, recycled across images.
fn demo_candidates(images: usize) -> Vec<Vec<ScoredBox>> {
    let demo = vec![
        ScoredBox { x1: 0.0, y1: 0.0, x2: 10.0, y2: 10.0, score: 0.9, class_id: 1 },
        ScoredBox { x1: 5.0, y1: 5.0, x2: 15.0, y2: 15.0, score: 0.8, class_id: 1 },
        ScoredBox { x1: 1.0, y1: 1.0, x2: 11.0, y2: 11.0, score: 0.85, class_id: 2 },
        ScoredBox { x1: 40.0, y1: 40.0, x2: 52.0, y2: 52.0, score: 0.6, class_id: 1 },
    ];
    (0..images).map(|_| demo.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_word_accepts_hex_and_decimal() {
        assert_eq!(parse_word("0x1234").unwrap(), 0x1234);
        assert_eq!(parse_word("4660").unwrap(), 4660);
        assert_eq!(parse_word("0xFFFF").unwrap(), 0xFFFF);
        assert!(parse_word("0x10000").is_err());
        assert!(parse_word("bogus").is_err());
    }
}
