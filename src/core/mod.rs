//! Shared primitives used throughout the simulator core.
pub(crate) mod math;

#[allow(unused_imports)]
pub(crate) use math::array::{argmin, kahan_sum};
pub(crate) use math::constants::GEOM_ZERO_TOL;

/// The floating point type used for all real-valued geometry and radiometry.
pub(crate) type Float = f64;

pub(crate) const EPSILON: Float = Float::EPSILON;
pub(crate) const PI: Float = std::f64::consts::PI;

/// Rays processed per progress/cancellation poll inside a large ray loop
/// (spec.md §5: "every O(1024) rays").
pub(crate) const CANCEL_POLL_INTERVAL: usize = 1024;

/// Beam size above which per-surface work is split across `rayon` threads
/// (SPEC_FULL.md §5).
pub(crate) const PARALLEL_THRESHOLD: usize = 4096;
