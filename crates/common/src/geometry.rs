//! Planar geometry used for straight-line motion.
//!
//! Positions are `glam::Vec2`; `y` is the second planar axis (the ground
//! plane's depth axis when rendered in 3D).

pub use glam::Vec2;

/// Remaining distances at or below this are treated as already arrived.
pub const ZERO_DISTANCE: f32 = 1e-6;

/// Euclidean distance between two points.
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    (a - b).length()
}

/// Step from `from` toward `to` by at most `max_dist`.
///
/// Returns `to` exactly when the remaining distance is numerically zero or
/// within reach, so callers can compare positions for arrival without
/// accumulating round-off. A non-positive `max_dist` leaves `from` unchanged.
pub fn move_toward(from: Vec2, to: Vec2, max_dist: f32) -> Vec2 {
    let delta = to - from;
    let dist = delta.length();
    if dist <= ZERO_DISTANCE || dist <= max_dist {
        return to;
    }
    if max_dist <= 0.0 {
        return from;
    }
    from + delta * (max_dist / dist)
}
