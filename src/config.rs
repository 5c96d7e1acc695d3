// Tuning surface for the return-path buffer
// All four constants are fixed at construction; defaults can be overridden
// from the environment for field experiments without a rebuild.

use crate::path_buffer::buffer::CLEANUP_HEADROOM;

/// Minimum displacement between stored samples, meters.
pub const DEFAULT_POSITION_DELTA_M: f64 = 2.0;
/// Hard capacity of the breadcrumb trail, points.
pub const DEFAULT_MAX_PATH_LEN: usize = 100;

/// `pruning_delta` as a multiple of `position_delta`.
const PRUNING_DELTA_FACTOR: f64 = 1.5;
/// `rdp_epsilon` as a multiple of `position_delta`.
const RDP_EPSILON_FACTOR: f64 = 0.5;

/// Construction-time tuning for a `ReturnPath`.
#[derive(Debug, Clone)]
pub struct PathConfig {
    /// Minimum step between appended samples, meters.
    pub position_delta: f64,
    /// Segment proximity below which an excursion is considered closed.
    pub pruning_delta: f64,
    /// Simplification tolerance.
    pub rdp_epsilon: f64,
    /// Hard capacity of the stored path.
    pub max_path_len: usize,
}

impl Default for PathConfig {
    fn default() -> Self {
        PathConfig::new(
            get_env_f64("BREADCRUMB_POSITION_DELTA", DEFAULT_POSITION_DELTA_M),
            get_env_usize("BREADCRUMB_MAX_PATH_LEN", DEFAULT_MAX_PATH_LEN),
        )
    }
}

impl PathConfig {
    /// Derive the full tuning set from the spatial throttle and capacity.
    ///
    /// A capacity at or below the cleanup headroom would leave the
    /// compaction gate degenerate, so it is clamped to headroom + 2.
    pub fn new(position_delta: f64, max_path_len: usize) -> Self {
        PathConfig {
            position_delta,
            pruning_delta: PRUNING_DELTA_FACTOR * position_delta,
            rdp_epsilon: RDP_EPSILON_FACTOR * position_delta,
            max_path_len: max_path_len.max(CLEANUP_HEADROOM + 2),
        }
    }
}

/// Helper function to get environment variable as f64 with default
fn get_env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Helper function to get environment variable as usize with default
fn get_env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
