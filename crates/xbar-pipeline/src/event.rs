//! Schedule events and the run report.
//!
//! The ordered event log is the primary observable artifact: byte-for-byte
//! reproducible given the same configuration and sources.

use crate::nms::ScoredBox;
use crate::stage::StageId;
use std::fmt;

/// One stage occupancy interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleEvent {
    /// Which stage.
    pub stage: StageId,
    /// Image the work belongs to.
    pub image: usize,
    /// Chunk index; `None` for per-image detect events.
    pub chunk: Option<usize>,
    /// Logical layer index for compute/activate/transfer events.
    pub layer: Option<usize>,
    /// Interval start tick.
    pub start: u64,
    /// Interval end tick.
    pub end: u64,
}

impl fmt::Display for ScheduleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8}  img {}", self.stage.label(), self.image)?;
        match self.chunk {
            Some(chunk) => write!(f, " chunk {chunk}")?,
            None => write!(f, "        ")?,
        }
        if let Some(layer) = self.layer {
            write!(f, " L{layer}")?;
        }
        write!(f, "  [{:>5}, {:>5})", self.start, self.end)
    }
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct SimReport {
    /// Ordered event log (submission order).
    pub events: Vec<ScheduleEvent>,
    /// Suppressed box survivors per image, in selection order.
    pub detections: Vec<Vec<ScoredBox>>,
    /// Final-layer activated outputs per image, per chunk.
    pub tile_outputs: Vec<Vec<Vec<i64>>>,
    /// Observed peak fetch→compute buffer occupancy.
    pub peak_buffer_occupancy: usize,
}

impl SimReport {
    /// Completion time of the whole schedule.
    #[must_use]
    pub fn makespan(&self) -> u64 {
        self.events.iter().map(|e| e.end).max().unwrap_or(0)
    }

    /// Events of one stage, in submission order.
    pub fn events_for(&self, stage: StageId) -> impl Iterator<Item = &ScheduleEvent> {
        self.events.iter().filter(move |e| e.stage == stage)
    }

    /// Total busy ticks of one stage.
    #[must_use]
    pub fn busy_ticks(&self, stage: StageId) -> u64 {
        self.events_for(stage).map(|e| e.end - e.start).sum()
    }
}

/// Peak concurrent occupancy of the fetch→compute buffer, replayed from the
/// event log: +1 at each fetch completion, −1 at the chunk's first compute
/// start (release happens before a simultaneous claim).
#[must_use]
pub fn peak_buffer_occupancy(events: &[ScheduleEvent]) -> usize {
    let mut edges: Vec<(u64, i32)> = Vec::new();
    for e in events {
        match (e.stage, e.layer) {
            (StageId::Fetch, _) => edges.push((e.end, 1)),
            (StageId::Compute, Some(0)) => edges.push((e.start, -1)),
            _ => {}
        }
    }
    edges.sort_by_key(|&(t, delta)| (t, delta));

    let mut occupancy = 0i32;
    let mut peak = 0i32;
    for (_, delta) in edges {
        occupancy += delta;
        peak = peak.max(occupancy);
    }
    usize::try_from(peak.max(0)).unwrap_or(0)
}
