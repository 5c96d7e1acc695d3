// Loop detection for the return-path buffer
//
// A loop is a place where the outbound trajectory came close to itself: two
// non-adjacent segments pass within pruning_delta of each other. Everything
// flown between them is an excursion the return flight can skip, replaced by
// a single bridge point where the segments nearly touch.
//
// The detector assumes the straight line between two near-passing segments
// is clear of obstacles; that assumption is owned by upstream safety logic.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::path_buffer::geometry::{segment_segment_dist, Point3};

/// One prunable excursion: remove indices `[start, end)` from the path and
/// insert `bridge` in their place.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedLoop {
    pub start: usize,
    pub end: usize,
    pub bridge: Point3,
}

impl DetectedLoop {
    /// Points the path sheds when this loop is applied (removed minus the
    /// inserted bridge).
    pub fn pruned_count(&self) -> usize {
        self.end - self.start - 1
    }
}

/// Resumable scan over ordered pairs of non-adjacent segments.
///
/// Segments are `(i, i+1)` and `(j, j+1)` with `j >= i + 2`; the outer index
/// ascends so earlier and smaller excursions are found first. After a hit at
/// `(i, j)` the outer scan continues from the closing segment `j`, and
/// `j_min` floors every later inner scan, so recorded loops are disjoint,
/// ordered, and never nested.
#[derive(Debug, Clone)]
pub struct LoopDetector {
    i: usize,
    j_min: usize,
    done: bool,
    loops: Vec<DetectedLoop>,
}

impl Default for LoopDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopDetector {
    pub fn new() -> Self {
        // The launch-adjacent segment (0, 1) is never an excursion boundary.
        LoopDetector {
            i: 1,
            j_min: 0,
            done: false,
            loops: Vec::new(),
        }
    }

    /// Advance the scan for at most `budget`. Returns `true` once every
    /// pair has been examined; `false` means paused, call again.
    ///
    /// The deadline is checked at the top of each outer iteration, so the
    /// worst-case overshoot is one inner sweep.
    pub fn run(&mut self, points: &[Point3], pruning_delta: f64, budget: Duration) -> bool {
        if self.done {
            return true;
        }
        let deadline = Instant::now() + budget;
        let n = points.len();

        let mut i = self.i.max(1);
        while i + 3 < n {
            if Instant::now() >= deadline {
                self.i = i;
                return false;
            }

            let mut hit = None;
            for j in self.j_min.max(i + 2)..n - 1 {
                let (dist, bridge) =
                    segment_segment_dist(&points[i], &points[i + 1], &points[j], &points[j + 1]);
                if dist <= pruning_delta {
                    hit = Some((j, bridge));
                    break;
                }
            }

            match hit {
                Some((j, bridge)) => {
                    debug!(start = i + 1, end = j + 1, "detected prunable excursion");
                    self.loops.push(DetectedLoop {
                        start: i + 1,
                        end: j + 1,
                        bridge,
                    });
                    self.j_min = j + 1;
                    // Resume from the closing segment; anything before it is
                    // inside an already-recorded excursion.
                    i = j;
                }
                None => i += 1,
            }
        }

        self.done = true;
        true
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Loops in discovery order.
    pub fn loops(&self) -> &[DetectedLoop] {
        &self.loops
    }

    /// Total points the path would shed if every recorded loop were applied.
    pub fn prunable(&self) -> usize {
        self.loops.iter().map(DetectedLoop::pruned_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    const FOREVER: Duration = Duration::from_secs(60);

    /// A track that flies east, detours north, and crosses back over its
    /// own outbound leg before continuing: one prunable excursion.
    fn path_with_excursion() -> Vec<Point3> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(20.0, 0.0, 0.0),
            Point3::new(25.0, 10.0, 0.0),
            Point3::new(15.0, 15.0, 0.0),
            Point3::new(10.0, 5.0, 0.0),
            Point3::new(18.0, -2.0, 0.0),
            Point3::new(30.0, 0.0, 0.0),
            Point3::new(40.0, 0.0, 0.0),
        ]
    }

    fn detect(points: &[Point3], pruning_delta: f64) -> LoopDetector {
        let mut detector = LoopDetector::new();
        assert!(detector.run(points, pruning_delta, FOREVER));
        detector
    }

    #[test]
    fn test_detects_excursion() {
        let points = path_with_excursion();
        let detector = detect(&points, 3.0);
        assert_eq!(detector.loops().len(), 1);
        let excursion = &detector.loops()[0];
        // Segment (5,6) crosses the outbound segment (1,2) at y = 0.
        assert_eq!(excursion.start, 2);
        assert_eq!(excursion.end, 6);
        assert_eq!(excursion.pruned_count(), 3);
        // The bridge sits at the crossing point.
        assert_approx_eq!(excursion.bridge.x, 110.0 / 7.0, 1e-9);
        assert_approx_eq!(excursion.bridge.y, 0.0, 1e-9);
        assert_approx_eq!(excursion.bridge.z, 0.0, 1e-12);
    }

    #[test]
    fn test_straight_path_has_no_loops() {
        let points: Vec<Point3> = (0..20)
            .map(|i| Point3::new(i as f64 * 5.0, 0.0, 0.0))
            .collect();
        let detector = detect(&points, 3.0);
        assert!(detector.loops().is_empty());
        assert_eq!(detector.prunable(), 0);
    }

    #[test]
    fn test_tiny_paths_are_inert() {
        for n in 0..5 {
            let points: Vec<Point3> = (0..n).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect();
            let detector = detect(&points, 3.0);
            assert!(detector.loops().is_empty());
        }
    }

    #[test]
    fn test_loops_are_disjoint_and_ordered() {
        // Two excursions, each crossing back over an earlier segment.
        let mut points = path_with_excursion();
        points.extend([
            Point3::new(42.0, 8.0, 0.0),
            Point3::new(35.0, 12.0, 0.0),
            Point3::new(33.0, -1.0, 0.0),
            Point3::new(45.0, -1.0, 0.0),
        ]);
        let detector = detect(&points, 3.0);
        assert_eq!(detector.loops().len(), 2);
        for pair in detector.loops().windows(2) {
            // Disjoint and ordered; in particular no later loop is contained
            // in an earlier one.
            assert!(pair[0].end <= pair[1].start);
        }
        assert_eq!(detector.prunable(), 5);
    }

    #[test]
    fn test_zero_budget_pauses_and_resumes() {
        let points = path_with_excursion();
        let mut detector = LoopDetector::new();
        assert!(!detector.run(&points, 3.0, Duration::ZERO));
        assert!(!detector.is_done());

        let mut slices = 0;
        while !detector.run(&points, 3.0, Duration::from_micros(50)) {
            slices += 1;
            assert!(slices < 1_000_000, "loop detector failed to converge");
        }

        let fresh = detect(&points, 3.0);
        assert_eq!(detector.loops(), fresh.loops());
    }

    #[test]
    fn test_adjacent_segments_never_pair() {
        // Consecutive segments always touch; without the j >= i + 2 rule
        // this sharp corner would register as a zero-length excursion.
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(20.0, 0.0, 0.0),
            Point3::new(10.0, 1.0, 0.0),
            Point3::new(0.0, 5.0, 0.0),
            Point3::new(-10.0, 10.0, 0.0),
        ];
        let detector = detect(&points, 0.1);
        for excursion in detector.loops() {
            assert!(excursion.end >= excursion.start + 2);
        }
    }
}
