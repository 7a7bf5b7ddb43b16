//! MAC engine throughput — nibble cross-term path vs native multiply.
//!
//! The nibble path does 16 narrow multiplies plus shifts per operand pair
//! where the native path does one wide multiply; this benchmark puts a
//! number on that simulation overhead.
//!
//! Usage:
//!   cargo run -r --bin bench_mac
//!   cargo run -r --bin bench_mac -- --iterations 5000

use anyhow::Result;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use xbar_engine::MacEngine;

const DEFAULT_ITERATIONS: usize = 2000;
const ROWS: usize = 32;
const CELLS: usize = 8;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let iterations = parse_arg(&args, "--iterations", DEFAULT_ITERATIONS);

    println!("MAC engine benchmark");
    println!("====================");
    println!("Array      : {ROWS}x{CELLS} (reference geometry)");
    println!("Iterations : {iterations}");
    println!();

    let weights: Vec<Vec<u16>> = (0..ROWS)
        .map(|r| (0..CELLS).map(|c| ((r * 257 + c * 4099) & 0xFFFF) as u16).collect())
        .collect();
    let engine = MacEngine::from_rows(&weights)?;
    let inputs: Vec<u16> = (0..ROWS).map(|r| ((r * 641) & 0xFFFF) as u16).collect();

    // Warmup
    for _ in 0..50 {
        let _ = engine.compute(&inputs)?;
    }

    let mut latencies_ns = Vec::with_capacity(iterations);
    for _ in 0..iterations {
        let t0 = Instant::now();
        let out = engine.compute(&inputs)?;
        latencies_ns.push(t0.elapsed().as_nanos() as f64);
        std::hint::black_box(out);
    }

    // Native baseline: one wide multiply per (row, cell) pair.
    let mut native_ns = Vec::with_capacity(iterations);
    for _ in 0..iterations {
        let t0 = Instant::now();
        let mut acc = vec![0i64; CELLS];
        for (row, &input) in weights.iter().zip(inputs.iter()) {
            for (a, &w) in acc.iter_mut().zip(row.iter()) {
                *a += i64::from(input) * i64::from(w);
            }
        }
        native_ns.push(t0.elapsed().as_nanos() as f64);
        std::hint::black_box(acc);
    }

    print_stats("nibble path", &mut latencies_ns);
    print_stats("native mul ", &mut native_ns);

    let nibble_mean = mean(&latencies_ns);
    let native_mean = mean(&native_ns);
    println!();
    println!(
        "Overhead   : {:.1}x (modeled 4-bit constraint vs native 16-bit multiply)",
        nibble_mean / native_mean.max(1.0)
    );

    Ok(())
}

fn print_stats(label: &str, samples: &mut [f64]) {
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = samples.len();
    println!("{label}");
    println!("  mean : {:>8.0} ns   ({:.2} M MAC/s)", mean(samples), mac_rate(mean(samples)));
    println!("  p50  : {:>8.0} ns", samples[n / 2]);
    println!("  p95  : {:>8.0} ns", samples[(n as f64 * 0.95) as usize]);
    println!("  p99  : {:>8.0} ns", samples[(n as f64 * 0.99) as usize]);
}

fn mean(samples: &[f64]) -> f64 {
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Million row×cell MACs per second for one invocation latency.
fn mac_rate(ns: f64) -> f64 {
    (ROWS * CELLS) as f64 / ns * 1e3
}

fn parse_arg(args: &[String], name: &str, default: usize) -> usize {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
