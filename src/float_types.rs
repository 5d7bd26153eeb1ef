// Re-export parry for the scalar width used by the compiler
pub use parry3d_f64 as parry3d;

// Our Real scalar type:
pub type Real = f64;

use core::str::FromStr;
use std::sync::OnceLock;

/// Lazily-initialized on-plane tolerance used across the crate.
/// Can be overridden:
///  1) **Build-time**: set env var `BRUSHBSP_TOLERANCE` (e.g. `BRUSHBSP_TOLERANCE=0.05 cargo build`)
///  2) **Runtime**: call [`set_tolerance`] once before compiling anything
static TOLERANCE_CELL: OnceLock<Real> = OnceLock::new();

#[inline]
const fn default_tolerance() -> Real {
    ON_EPSILON
}

/// Returns the current on-plane tolerance.
/// If not set yet, it tries `BRUSHBSP_TOLERANCE` (parsed as `Real`) and
/// falls back to [`ON_EPSILON`].
pub fn tolerance() -> Real {
    *TOLERANCE_CELL.get_or_init(|| {
        if let Some(environment_variable) = option_env!("BRUSHBSP_TOLERANCE") {
            if let Ok(value) = Real::from_str(environment_variable) {
                return value.max(Real::EPSILON);
            }
        }
        default_tolerance()
    })
}

/// Set the tolerance programmatically once (subsequent calls are ignored).
pub fn set_tolerance(value: Real) {
    let _ = TOLERANCE_CELL.set(value.max(Real::EPSILON));
}

/// Points closer than this to a plane classify as "on" the plane.
pub const ON_EPSILON: Real = 0.1;

/// Epsilon used when the brush splitter decides whether a brush crosses a plane.
pub const PLANESIDE_EPSILON: Real = 0.001;

/// Two plane normals are equal when their dot product is at least `1 - NORMAL_EPSILON`.
pub const NORMAL_EPSILON: Real = 0.000_01;

/// Two plane distances are equal when they differ by at most this.
pub const DIST_EPSILON: Real = 0.01;

/// Epsilon used when clipping a node's base winding by its ancestors.
pub const BASE_WINDING_EPSILON: Real = 0.001;

/// Epsilon used when splitting portals at a node.
pub const SPLIT_WINDING_EPSILON: Real = 0.001;

/// A winding with fewer than three edges longer than this is "tiny".
pub const EDGE_LENGTH: Real = 0.2;

/// Consecutive winding points closer than this are merged.
pub const MIN_POINT_SEPARATION: Real = 0.001;

/// Padding added around the world bounds for the head node volume and portals.
pub const SIDESPACE: Real = 8.0;

/// Half-extent of the quad produced for an unbounded plane.
pub const MAX_WORLD_COORD: Real = 65536.0;
