// Geometric primitives for the return-path buffer
// All distances are Euclidean, in meters, in the local tangent frame

use serde::{Deserialize, Serialize};

/// Cutoff on the closest-approach denominator `a*c - b*b` below which two
/// segments are treated as parallel. Parallel pairs are reported as
/// infinitely far apart so the loop detector never bridges them.
pub const PARALLEL_EPSILON: f64 = 1e-7;

/// A position in meters relative to the launch origin.
/// `x` is North displacement, `y` is East displacement, `z` is altitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const ORIGIN: Point3 = Point3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Point3 { x, y, z }
    }

    /// True when every coordinate is a finite real.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn dist(&self, other: &Point3) -> f64 {
        self.dist_sq(other).sqrt()
    }

    /// Squared distance, used by the ingestion throttle to avoid a square
    /// root per sample.
    pub fn dist_sq(&self, other: &Point3) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        dx * dx + dy * dy + dz * dz
    }
}

fn dot(u: (f64, f64, f64), v: (f64, f64, f64)) -> f64 {
    u.0 * v.0 + u.1 * v.1 + u.2 * v.2
}

/// Perpendicular distance from `p` to the infinite line through `a` and `b`,
/// via the triangle-area identity. The radicand is clamped at zero because
/// near-colinear triples can push it slightly negative in floating point.
///
/// Callers must not pass `a == b` (the line is undefined).
pub fn point_line_dist(p: &Point3, a: &Point3, b: &Point3) -> f64 {
    let pa = p.dist(a);
    let ab = a.dist(b);
    let bp = b.dist(p);
    let s = (pa + ab + bp) / 2.0;
    let area = (s * (s - pa) * (s - ab) * (s - bp)).max(0.0).sqrt();
    2.0 * area / ab
}

/// Closest distance between segments `[p1, p2]` and `[p3, p4]` in 3D, and
/// the midpoint of the shortest connecting segment.
///
/// Near-parallel pairs return `(f64::INFINITY, ORIGIN)` so they can never
/// win a proximity comparison. The closest-approach parameters are clamped
/// to the segments; no secondary re-projection is done, which overestimates
/// the distance for some endpoint configurations. Pruning must stay
/// conservative, so the overestimate is acceptable.
pub fn segment_segment_dist(p1: &Point3, p2: &Point3, p3: &Point3, p4: &Point3) -> (f64, Point3) {
    let u = (p2.x - p1.x, p2.y - p1.y, p2.z - p1.z);
    let v = (p4.x - p3.x, p4.y - p3.y, p4.z - p3.z);
    let w = (p1.x - p3.x, p1.y - p3.y, p1.z - p3.z);

    let a = dot(u, u);
    let b = dot(u, v);
    let c = dot(v, v);
    let d = dot(u, w);
    let e = dot(v, w);
    let denom = a * c - b * b;

    if denom < PARALLEL_EPSILON {
        return (f64::INFINITY, Point3::ORIGIN);
    }

    let t1 = ((b * e - c * d) / denom).clamp(0.0, 1.0);
    let t2 = ((a * e - b * d) / denom).clamp(0.0, 1.0);

    let dp = (
        w.0 + t1 * u.0 - t2 * v.0,
        w.1 + t1 * u.1 - t2 * v.1,
        w.2 + t1 * u.2 - t2 * v.2,
    );
    let midpoint = Point3::new(
        (p1.x + t1 * u.0 + p3.x + t2 * v.0) / 2.0,
        (p1.y + t1 * u.1 + p3.y + t2 * v.1) / 2.0,
        (p1.z + t1 * u.2 + p3.z + t2 * v.2) / 2.0,
    );

    (dot(dp, dp).sqrt(), midpoint)
}
