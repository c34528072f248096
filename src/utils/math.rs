//! # Game Mathematics
//!
//! Small vector helpers for world-space interpolation.

/// A point in presentation world space.
pub type WorldPoint = [f32; 3];

/// Linearly interpolates between two world points, clamping `t` to `[0, 1]`.
///
/// # Examples
///
/// ```
/// use tactica::lerp;
///
/// assert_eq!(lerp([0.0, 0.0, 0.0], [2.0, 0.0, 4.0], 0.5), [1.0, 0.0, 2.0]);
/// assert_eq!(lerp([0.0, 0.0, 0.0], [2.0, 0.0, 4.0], 3.0), [2.0, 0.0, 4.0]);
/// ```
pub fn lerp(from: WorldPoint, to: WorldPoint, t: f32) -> WorldPoint {
    let t = t.clamp(0.0, 1.0);
    [
        from[0] + (to[0] - from[0]) * t,
        from[1] + (to[1] - from[1]) * t,
        from[2] + (to[2] - from[2]) * t,
    ]
}

/// Straight-line distance between two world points.
pub fn distance(a: WorldPoint, b: WorldPoint) -> f32 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let dz = b[2] - a[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        assert_eq!(distance([0.0, 0.0, 0.0], [3.0, 0.0, 4.0]), 5.0);
    }

    #[test]
    fn test_lerp_clamps_below_zero() {
        assert_eq!(lerp([1.0, 1.0, 1.0], [3.0, 1.0, 1.0], -1.0), [1.0, 1.0, 1.0]);
    }
}
