//! The return-path engine: geometric primitives, the anytime simplifier and
//! loop detector, and the live breadcrumb buffer they keep compact.

pub mod buffer;
pub mod geometry;
pub mod pruning;
pub mod simplification;

pub use buffer::{BufferState, BufferStats, ReturnPath, CLEANUP_HEADROOM};
pub use geometry::{point_line_dist, segment_segment_dist, Point3, PARALLEL_EPSILON};
pub use pruning::{DetectedLoop, LoopDetector};
pub use simplification::RdpSimplifier;
