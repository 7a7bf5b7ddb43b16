//! Integration tests for the emitted schedule: monotonicity, the
//! double-buffer bound, layer sharing, and reproducibility.

use std::collections::HashMap;
use xbar_engine::MacEngine;
use xbar_pipeline::{
    peak_buffer_occupancy, Activation, LayerSpec, PipelineSimulator, RampSource, ScoredBox,
    SimConfig, StageDurations, StageId,
};

fn engine(rows: usize) -> MacEngine {
    let weights: Vec<Vec<u16>> = (0..rows)
        .map(|r| (0..4).map(|c| ((r * 7 + c * 3) & 0xFFFF) as u16).collect())
        .collect();
    MacEngine::from_rows(&weights).unwrap()
}

fn config(chunks: usize, images: usize, layers: usize) -> SimConfig {
    SimConfig {
        stage_durations: StageDurations::default(),
        layers: vec![LayerSpec::default(); layers],
        chunks_per_image: chunks,
        images,
        buffer_slots: 1,
        iou_threshold: 0.3,
    }
}

#[test]
fn stage_frees_are_monotonic_and_starts_feasible() {
    let sim = PipelineSimulator::new(config(6, 2, 2), engine(16)).unwrap();
    let report = sim.run(&mut RampSource::new(16), &[]).unwrap();

    // Per stage, end times never regress in submission order.
    let mut last_end: HashMap<StageId, u64> = HashMap::new();
    for e in &report.events {
        assert!(e.end >= e.start);
        let prev = last_end.entry(e.stage).or_insert(0);
        assert!(
            e.start >= *prev,
            "{} starts at {} before prior work ends at {}",
            e.stage,
            e.start,
            prev
        );
        *prev = e.end;
    }
}

#[test]
fn compute_waits_for_fetch_and_activation_for_compute() {
    let sim = PipelineSimulator::new(config(4, 1, 2), engine(8)).unwrap();
    let report = sim.run(&mut RampSource::new(8), &[]).unwrap();

    // Group events by (chunk, layer) and check the dependency chain.
    for e in &report.events {
        let Some(chunk) = e.chunk else { continue };
        if e.stage == StageId::Compute && e.layer == Some(0) {
            let fetch = report
                .events
                .iter()
                .find(|f| f.stage == StageId::Fetch && f.chunk == Some(chunk) && f.image == e.image)
                .unwrap();
            assert!(e.start >= fetch.end);
        }
        if e.stage == StageId::Activate {
            let compute = report
                .events
                .iter()
                .find(|c| {
                    c.stage == StageId::Compute
                        && c.chunk == Some(chunk)
                        && c.layer == e.layer
                        && c.image == e.image
                })
                .unwrap();
            assert!(e.start >= compute.end);
        }
    }
}

#[test]
fn double_buffer_caps_in_flight_tiles() {
    // Slow compute forces fetch to throttle: without the bound, fetch would
    // run far ahead of compute.
    let mut cfg = config(8, 1, 1);
    cfg.stage_durations = StageDurations {
        fetch: 1,
        compute: 10,
        activate: 1,
        transfer: 1,
        detect: 1,
    };
    let sim = PipelineSimulator::new(cfg, engine(8)).unwrap();
    let report = sim.run(&mut RampSource::new(8), &[]).unwrap();

    assert_eq!(peak_buffer_occupancy(&report.events), 1);
    assert_eq!(report.peak_buffer_occupancy, 1);

    // Fetch k+1 may not start before compute k starts.
    let fetches: Vec<_> = report.events_for(StageId::Fetch).collect();
    let computes: Vec<_> = report.events_for(StageId::Compute).collect();
    for k in 1..fetches.len() {
        assert!(
            fetches[k].start >= computes[k - 1].start,
            "fetch {k} started at {} before compute {} was accepted at {}",
            fetches[k].start,
            k - 1,
            computes[k - 1].start
        );
    }
}

#[test]
fn wider_buffer_allows_deeper_prefetch() {
    let mut cfg = config(8, 1, 1);
    cfg.stage_durations = StageDurations {
        fetch: 1,
        compute: 10,
        activate: 1,
        transfer: 1,
        detect: 1,
    };
    cfg.buffer_slots = 2;
    let sim = PipelineSimulator::new(cfg, engine(8)).unwrap();
    let report = sim.run(&mut RampSource::new(8), &[]).unwrap();
    assert_eq!(report.peak_buffer_occupancy, 2);
}

#[test]
fn layers_share_stage_timelines() {
    // Two layers per chunk: the compute stage serves 2×chunks invocations,
    // strictly serialized.
    let sim = PipelineSimulator::new(config(3, 1, 2), engine(8)).unwrap();
    let report = sim.run(&mut RampSource::new(8), &[]).unwrap();

    let computes: Vec<_> = report.events_for(StageId::Compute).collect();
    assert_eq!(computes.len(), 6);
    for pair in computes.windows(2) {
        assert!(pair[1].start >= pair[0].end);
    }
}

#[test]
fn detect_runs_once_per_image_after_last_transfer() {
    let sim = PipelineSimulator::new(config(4, 3, 2), engine(8)).unwrap();
    let report = sim.run(&mut RampSource::new(8), &[]).unwrap();

    let detects: Vec<_> = report.events_for(StageId::Detect).collect();
    assert_eq!(detects.len(), 3);
    for d in &detects {
        assert_eq!(d.chunk, None);
        let last_transfer = report
            .events
            .iter()
            .filter(|e| e.stage == StageId::Transfer && e.image == d.image)
            .map(|e| e.end)
            .max()
            .unwrap();
        assert!(d.start >= last_transfer);
    }
}

#[test]
fn schedule_is_reproducible() {
    let run = || {
        let sim = PipelineSimulator::new(config(5, 2, 2), engine(12)).unwrap();
        sim.run(&mut RampSource::new(12), &[]).unwrap()
    };
    let a = run();
    let b = run();
    assert_eq!(a.events, b.events);
    assert_eq!(a.tile_outputs, b.tile_outputs);
}

#[test]
fn detect_consumes_candidate_boxes() {
    let sim = PipelineSimulator::new(config(1, 1, 1), engine(8)).unwrap();
    let candidates = vec![vec![
        ScoredBox { x1: 0.0, y1: 0.0, x2: 10.0, y2: 10.0, score: 0.9, class_id: 1 },
        ScoredBox { x1: 1.0, y1: 1.0, x2: 11.0, y2: 11.0, score: 0.8, class_id: 1 },
        ScoredBox { x1: 40.0, y1: 40.0, x2: 50.0, y2: 50.0, score: 0.7, class_id: 2 },
    ]];
    let report = sim.run(&mut RampSource::new(8), &candidates).unwrap();

    let kept = &report.detections[0];
    assert_eq!(kept.len(), 2);
    assert!((kept[0].score - 0.9).abs() < f32::EPSILON);
    assert!((kept[1].score - 0.7).abs() < f32::EPSILON);
}

#[test]
fn leaky_layer_propagates_shifted_values() {
    // All-zero weights give zero accumulators; relu and leaky agree there.
    // Use a weight pattern and check the final outputs went through the
    // configured activation (non-negative under relu).
    let mut cfg = config(2, 1, 2);
    cfg.layers = vec![
        LayerSpec { activation: Activation::Leaky },
        LayerSpec { activation: Activation::Relu },
    ];
    let sim = PipelineSimulator::new(cfg, engine(8)).unwrap();
    let report = sim.run(&mut RampSource::new(8), &[]).unwrap();
    for chunk_out in &report.tile_outputs[0] {
        assert!(chunk_out.iter().all(|&v| v >= 0));
    }
}
