//! Stage timelines and the bounded fetch→compute buffer.
//!
//! Each stage is a single-server FIFO resource with a fixed service time
//! and a monotonically non-decreasing `free` timestamp. The greedy
//! earliest-feasible-start rule
//!
//! ```text
//! start = max(free, ready)
//! end   = start + duration
//! free  = end
//! ```
//!
//! applied strictly in chunk-submission order is optimal for this topology:
//! FIFO plus monotonic resource availability leaves nothing to reorder.

use std::collections::VecDeque;
use std::fmt;

/// Stage identity within the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    /// Stage 0: tile fetch.
    Fetch,
    /// Crossbar MAC invocation.
    Compute,
    /// Elementwise activation.
    Activate,
    /// Data-movement slot.
    Transfer,
    /// Per-image detection post-processing.
    Detect,
}

impl StageId {
    /// Short fixed-width label for event tables.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Compute => "compute",
            Self::Activate => "activate",
            Self::Transfer => "transfer",
            Self::Detect => "detect",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One stage's timeline state for a single run.
#[derive(Debug)]
pub(crate) struct Stage {
    pub(crate) id: StageId,
    duration: u64,
    free: u64,
}

impl Stage {
    pub(crate) const fn new(id: StageId, duration: u64) -> Self {
        Self {
            id,
            duration,
            free: 0,
        }
    }

    /// Book the stage for one unit of work that becomes ready at `ready`.
    /// Returns the `[start, end)` interval and advances `free` to `end`.
    pub(crate) fn occupy(&mut self, ready: u64) -> (u64, u64) {
        let start = self.free.max(ready);
        let end = start + self.duration;
        self.free = end;
        tracing::trace!("{} occupied [{start}, {end})", self.id);
        (start, end)
    }
}

/// Bounded-occupancy buffer between fetch completion and compute start.
///
/// A slot is claimed when a fetch completes and released when that chunk's
/// first compute starts. With one slot this is the reference double buffer:
/// fetch of chunk k+1 cannot begin until chunk k has been accepted by the
/// compute stage, capping in-flight tiles at one.
#[derive(Debug)]
pub(crate) struct TileBuffer {
    /// Release times (first-compute starts) of the chunks currently
    /// occupying slots, oldest first.
    releases: VecDeque<u64>,
    capacity: usize,
}

impl TileBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            releases: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Earliest time a fetch may *start* so that a slot is free by then.
    pub(crate) fn slot_ready(&self) -> u64 {
        if self.releases.len() < self.capacity {
            0
        } else {
            self.releases[self.releases.len() - self.capacity]
        }
    }

    /// Record that the chunk fetched into the slot starts compute at
    /// `compute_start`, releasing the slot at that instant.
    pub(crate) fn admit(&mut self, compute_start: u64) {
        self.releases.push_back(compute_start);
        if self.releases.len() > self.capacity {
            self.releases.pop_front();
        }
    }
}
