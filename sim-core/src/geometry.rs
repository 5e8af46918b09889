//! 2D geometric primitives shared by cut detection and piece physics.

use glam::Vec2;

/// One motion step of the user's swipe, in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Swipe {
    pub start: Vec2,
    pub end: Vec2,
}

impl Swipe {
    pub fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }

    /// `1.0` for a left-to-right slash, `-1.0` otherwise.
    ///
    /// Vertical slashes count as right-to-left.
    pub fn direction(&self) -> f32 {
        if self.end.x > self.start.x { 1.0 } else { -1.0 }
    }

    /// Maps both endpoints into the frame of a body at `origin` rotated by
    /// `rotation` (the inverse of [`to_world`]).
    pub fn to_local(&self, origin: Vec2, rotation: f32) -> Self {
        Self {
            start: to_local(self.start, origin, rotation),
            end: to_local(self.end, origin, rotation),
        }
    }
}

/// Where a swipe crosses a target segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intersection {
    /// Crossing point, in the frame both segments were given in.
    pub point: Vec2,
    /// Parameter along the *target* segment: `0` at its start, `1` at its end.
    pub u: f32,
}

/// Intersects the swipe `a0..a1` with the target segment `b0..b1`.
///
/// Returns `None` unless both segment parameters lie in `[0, 1]`.
/// Segments whose determinant magnitude is below `epsilon` are treated as
/// parallel and never intersect, which also covers zero-length segments.
///
/// ### Parameters
/// - `a0`, `a1` - Swipe endpoints.
/// - `b0`, `b1` - Target segment endpoints.
/// - `epsilon` - Parallel threshold on the 2x2 determinant.
///
/// ### Returns
/// The crossing point and the parameter `u` along the target segment.
pub fn segment_intersection(
    a0: Vec2,
    a1: Vec2,
    b0: Vec2,
    b1: Vec2,
    epsilon: f32,
) -> Option<Intersection> {
    let da = a0 - a1;
    let db = b0 - b1;
    let d = da.perp_dot(db);
    if d.abs() < epsilon {
        return None;
    }

    let ab = a0 - b0;
    let t = ab.perp_dot(db) / d;
    let u = -da.perp_dot(ab) / d;

    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(Intersection {
            point: a0 + t * (a1 - a0),
            u,
        })
    } else {
        None
    }
}

/// Transforms a body-local point to world space.
#[inline]
pub fn to_world(local: Vec2, origin: Vec2, rotation: f32) -> Vec2 {
    origin + Vec2::from_angle(rotation).rotate(local)
}

/// Transforms a world point into the frame of a body.
#[inline]
pub fn to_local(world: Vec2, origin: Vec2, rotation: f32) -> Vec2 {
    Vec2::from_angle(-rotation).rotate(world - origin)
}

/// Distance from `p` to the closed segment `start -> end`.
pub fn distance_to_segment(p: Vec2, start: Vec2, end: Vec2) -> f32 {
    let d = end - start;
    let len_sq = d.length_squared();
    if len_sq <= f32::EPSILON {
        return p.distance(start);
    }
    let u = ((p - start).dot(d) / len_sq).clamp(0.0, 1.0);
    p.distance(start + d * u)
}

/// Unit normal on the left of `start -> end`.
///
/// Degenerate segments fall back to `+Y`, the normal of a segment pointing
/// along `+X`.
#[inline]
pub fn left_normal(start: Vec2, end: Vec2) -> Vec2 {
    (end - start).try_normalize().unwrap_or(Vec2::X).perp()
}

/// The four corners of a tapered segment.
///
/// Order is `start + n*t0/2`, `end + n*t1/2`, `end - n*t1/2`,
/// `start - n*t0/2`, where `n` is the left normal. This is also the
/// vertex order renderers use for the quad.
pub fn tapered_quad(start: Vec2, end: Vec2, start_thickness: f32, end_thickness: f32) -> [Vec2; 4] {
    let n = left_normal(start, end);
    let h0 = start_thickness * 0.5;
    let h1 = end_thickness * 0.5;
    [start + n * h0, end + n * h1, end - n * h1, start - n * h0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn distance_to_segment_clamps_to_the_endpoints() {
        let (a, b) = (Vec2::ZERO, Vec2::new(10.0, 0.0));
        assert_abs_diff_eq!(distance_to_segment(Vec2::new(5.0, 3.0), a, b), 3.0, epsilon = 1e-6);
        assert_abs_diff_eq!(distance_to_segment(Vec2::new(13.0, 4.0), a, b), 5.0, epsilon = 1e-6);
        assert_abs_diff_eq!(distance_to_segment(Vec2::new(0.0, 2.0), a, a), 2.0, epsilon = 1e-6);
    }

    #[test]
    fn crossing_segments_intersect_at_midpoint() {
        // Target (0,0)-(10,0), swipe (5,-5)-(5,5).
        let hit = segment_intersection(
            Vec2::new(5.0, -5.0),
            Vec2::new(5.0, 5.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            1e-4,
        )
        .expect("segments cross");

        assert_abs_diff_eq!(hit.point.x, 5.0, epsilon = 1e-5);
        assert_abs_diff_eq!(hit.point.y, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(hit.u, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn parallel_segments_never_intersect() {
        let hit = segment_intersection(
            Vec2::new(0.0, 1.0),
            Vec2::new(10.0, 1.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            1e-4,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn collinear_overlap_counts_as_parallel() {
        let hit = segment_intersection(
            Vec2::new(-5.0, 0.0),
            Vec2::new(5.0, 0.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            1e-4,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn zero_length_target_never_intersects() {
        let p = Vec2::new(1.0, 1.0);
        let hit = segment_intersection(Vec2::new(0.0, 0.0), Vec2::new(2.0, 2.0), p, p, 1e-4);
        assert!(hit.is_none());
    }

    #[test]
    fn lines_crossing_outside_segments_are_rejected() {
        // Lines cross at (12, 0), past the end of the target.
        let hit = segment_intersection(
            Vec2::new(12.0, -1.0),
            Vec2::new(12.0, 1.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            1e-4,
        );
        assert!(hit.is_none());

        // Lines cross at (5, 0), past the end of the swipe.
        let hit = segment_intersection(
            Vec2::new(5.0, 1.0),
            Vec2::new(5.0, 3.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            1e-4,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn u_is_measured_along_the_target() {
        let hit = segment_intersection(
            Vec2::new(2.5, -1.0),
            Vec2::new(2.5, 1.0),
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            1e-4,
        )
        .expect("segments cross");
        assert_abs_diff_eq!(hit.u, 0.25, epsilon = 1e-6);
    }

    #[test]
    fn world_and_local_are_inverse() {
        let origin = Vec2::new(3.0, -2.0);
        let rotation = 0.7;
        let p = Vec2::new(-4.0, 9.5);

        let back = to_local(to_world(p, origin, rotation), origin, rotation);
        assert_abs_diff_eq!(back.x, p.x, epsilon = 1e-4);
        assert_abs_diff_eq!(back.y, p.y, epsilon = 1e-4);
    }

    #[test]
    fn quarter_turn_maps_x_to_y() {
        let w = to_world(Vec2::X, Vec2::ZERO, FRAC_PI_2);
        assert_abs_diff_eq!(w.x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(w.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn swipe_direction_follows_x() {
        assert_eq!(Swipe::new(Vec2::ZERO, Vec2::new(1.0, 0.0)).direction(), 1.0);
        assert_eq!(Swipe::new(Vec2::ZERO, Vec2::new(-1.0, 0.0)).direction(), -1.0);
        assert_eq!(Swipe::new(Vec2::ZERO, Vec2::new(0.0, 5.0)).direction(), -1.0);
    }

    #[test]
    fn tapered_quad_of_horizontal_segment() {
        let q = tapered_quad(Vec2::ZERO, Vec2::new(10.0, 0.0), 4.0, 2.0);
        assert_eq!(q[0], Vec2::new(0.0, 2.0));
        assert_eq!(q[1], Vec2::new(10.0, 1.0));
        assert_eq!(q[2], Vec2::new(10.0, -1.0));
        assert_eq!(q[3], Vec2::new(0.0, -2.0));
    }

    #[test]
    fn degenerate_segment_uses_fallback_normal() {
        assert_eq!(left_normal(Vec2::ONE, Vec2::ONE), Vec2::Y);
    }
}
