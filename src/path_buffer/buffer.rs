// Live return-path buffer: spatially throttled ingestion, the compaction
// policy, and non-destructive flyback computation.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::PathConfig;
use crate::models::PathError;
use crate::path_buffer::geometry::Point3;
use crate::path_buffer::pruning::{DetectedLoop, LoopDetector};
use crate::path_buffer::simplification::RdpSimplifier;

/// Slots kept free below capacity; cleanup fires once the path grows into
/// this band.
pub const CLEANUP_HEADROOM: usize = 10;
/// Simplification is applied only when it frees more than this many points.
const SIMPLIFY_MIN_YIELD: usize = 10;
/// Pruning applies loops in discovery order until at least this many points
/// are removed.
const PRUNE_TARGET: usize = 10;
/// Combined yield below which the aggressive pass is not worth the shape
/// damage and the buffer is declared exhausted.
const AGGRESSIVE_MIN_YIELD: usize = 5;
/// Quantum handed to each anytime pass; keeps a surrounding control loop
/// responsive while cleanup runs to completion.
const CLEANUP_SLICE: Duration = Duration::from_micros(500);

/// Lifecycle of the live buffer. `Exhausted` is terminal: ingestion fails
/// fast, but the stored path stays readable for a best-effort flyback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BufferState {
    Growing,
    Compacting,
    Exhausted,
}

/// Monitoring snapshot of the live buffer.
#[derive(Debug, Clone, Serialize)]
pub struct BufferStats {
    pub len: usize,
    pub worst_length: usize,
    pub max_path_len: usize,
    pub state: BufferState,
}

/// The breadcrumb trail. Owns an ordered point sequence whose head is the
/// launch position; the head is never removed, and the sequence is kept
/// below `max_path_len` by `routine_cleanup`.
#[derive(Debug, Clone)]
pub struct ReturnPath {
    points: Vec<Point3>,
    config: PathConfig,
    worst_length: usize,
    state: BufferState,
}

impl ReturnPath {
    /// A fresh buffer holding exactly the launch position.
    pub fn new(home: Point3, config: PathConfig) -> Self {
        ReturnPath {
            points: vec![home],
            config,
            worst_length: 1,
            state: BufferState::Growing,
        }
    }

    /// Record a position sample if it is at least `position_delta` away
    /// from the current tail. Returns whether the sample was appended.
    ///
    /// Non-finite samples are dropped (estimators glitch; one bad sample
    /// must not poison the trail). Once the buffer is exhausted every call
    /// fails fast with `OutOfMemory`.
    pub fn append_if_far_enough(&mut self, p: Point3) -> Result<bool, PathError> {
        if self.state == BufferState::Exhausted {
            return Err(PathError::OutOfMemory);
        }
        if !p.is_finite() {
            warn!(x = p.x, y = p.y, z = p.z, "dropping non-finite position sample");
            self.worst_length = self.worst_length.max(self.points.len());
            return Ok(false);
        }

        // Squared comparison: no square root per sample.
        let delta_sq = self.config.position_delta * self.config.position_delta;
        let appended = match self.points.last() {
            Some(tail) => tail.dist_sq(&p) >= delta_sq,
            None => true,
        };
        if appended {
            self.points.push(p);
        }
        self.worst_length = self.worst_length.max(self.points.len());
        Ok(appended)
    }

    /// Compact the buffer if it has grown into the capacity headroom.
    ///
    /// Runs loop detection and simplification to completion (in small
    /// time slices), then applies the cheapest reduction that pays:
    /// simplification first, pruning second, the aggressive combined pass
    /// as a last resort. When nothing pays the buffer transitions to
    /// `Exhausted` and `OutOfMemory` is returned.
    ///
    /// Pruning assumes the straight line between two near-passing segments
    /// is clear of obstacles; that assumption is owned by upstream safety
    /// reasoning, not this buffer.
    pub fn routine_cleanup(&mut self) -> Result<(), PathError> {
        if self.state == BufferState::Exhausted {
            return Err(PathError::OutOfMemory);
        }
        let gate = self.config.max_path_len.saturating_sub(CLEANUP_HEADROOM);
        if self.points.len() < gate {
            return Ok(());
        }
        self.state = BufferState::Compacting;

        let mut detector = LoopDetector::new();
        while !detector.run(&self.points, self.config.pruning_delta, CLEANUP_SLICE) {}
        let prunable = detector.prunable();

        let mut rdp = RdpSimplifier::new(self.points.len());
        while !rdp.run(&self.points, self.config.rdp_epsilon, CLEANUP_SLICE) {}
        let simplifiable = rdp.dropped_count();

        let before = self.points.len();
        if simplifiable > SIMPLIFY_MIN_YIELD {
            let kept: Vec<Point3> = self
                .points
                .iter()
                .zip(rdp.keep_mask())
                .filter(|(_, kept)| **kept)
                .map(|(p, _)| *p)
                .collect();
            self.points = kept;
            debug!(before, after = self.points.len(), "cleanup: simplified");
        } else if prunable > 0 {
            let mut removed = 0;
            let mut applied = 0;
            for excursion in detector.loops() {
                removed += excursion.pruned_count();
                applied += 1;
                if removed >= PRUNE_TARGET {
                    break;
                }
            }
            let keep_all = vec![true; self.points.len()];
            self.points = apply_reductions(&self.points, &detector.loops()[..applied], &keep_all);
            debug!(
                before,
                after = self.points.len(),
                loops = applied,
                "cleanup: pruned excursions"
            );
        } else if simplifiable + prunable > AGGRESSIVE_MIN_YIELD {
            self.points = apply_reductions(&self.points, detector.loops(), rdp.keep_mask());
            warn!(
                before,
                after = self.points.len(),
                "cleanup: aggressive flyback replacement"
            );
        } else {
            self.state = BufferState::Exhausted;
            warn!(
                len = before,
                simplifiable, prunable, "cleanup: buffer exhausted, RTL trail frozen"
            );
            return Err(PathError::OutOfMemory);
        }

        self.state = BufferState::Growing;
        Ok(())
    }

    /// The path the vehicle would fly if RTL were activated now: every
    /// detected excursion bridged and the remainder simplified. Read-only;
    /// the live buffer is untouched.
    pub fn get_flyback_path(&self) -> Vec<Point3> {
        if self.points.len() < 2 {
            return self.points.clone();
        }

        let mut detector = LoopDetector::new();
        while !detector.run(&self.points, self.config.pruning_delta, CLEANUP_SLICE) {}

        let mut rdp = RdpSimplifier::new(self.points.len());
        while !rdp.run(&self.points, self.config.rdp_epsilon, CLEANUP_SLICE) {}

        apply_reductions(&self.points, detector.loops(), rdp.keep_mask())
    }

    /// The stored breadcrumb trail, launch position first.
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Largest point count ever observed; the memory high-water mark.
    pub fn worst_length(&self) -> usize {
        self.worst_length
    }

    pub fn state(&self) -> BufferState {
        self.state
    }

    pub fn stats(&self) -> BufferStats {
        BufferStats {
            len: self.points.len(),
            worst_length: self.worst_length,
            max_path_len: self.config.max_path_len,
            state: self.state,
        }
    }
}

/// Apply loop removals and a keep-bitmap to a copy of `points`.
///
/// Every index inside a loop's `[start, end)` range is blanked, then each
/// loop's bridge point is written into the middle slot of its range,
/// resurrecting it. Loops must be disjoint and ordered, which the detector
/// guarantees.
fn apply_reductions(points: &[Point3], loops: &[DetectedLoop], keep: &[bool]) -> Vec<Point3> {
    let mut keep = keep.to_vec();
    let mut scratch = points.to_vec();
    for excursion in loops {
        for flag in &mut keep[excursion.start..excursion.end] {
            *flag = false;
        }
    }
    for excursion in loops {
        let slot = (excursion.start + excursion.end) / 2;
        scratch[slot] = excursion.bridge;
        keep[slot] = true;
    }
    scratch
        .iter()
        .zip(&keep)
        .filter(|(_, kept)| **kept)
        .map(|(p, _)| *p)
        .collect()
}
