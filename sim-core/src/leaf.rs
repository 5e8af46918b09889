//! Leaf records the core reads and writes during cuts and impacts.
//!
//! Leaf placement, wind sway and the flight of detached leaves belong to
//! external collaborators. The core only decides which leaves leave the
//! standing pool on a cut, which of those ride the new piece, and which
//! are handed back as [`DetachedLeaf`]s.

use crate::{geometry::to_world, types::SegmentId};
use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

/// A leaf hanging on the standing tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Leaf {
    /// Segment the leaf is attached to.
    pub segment: SegmentId,
    /// Parametric attachment position along that segment.
    pub t: f32,
    /// World position of the leaf's center.
    pub position: Vec2,
    /// World position of the attachment point on the branch.
    pub anchor: Vec2,
    pub size: f32,
    pub angle: f32,
    /// Opaque color or material id owned by the renderer.
    pub tint: u32,
    /// Set once the leaf has left the standing pool.
    pub hidden: bool,
}

impl Leaf {
    pub fn new(segment: SegmentId, t: f32, position: Vec2, size: f32) -> Self {
        Self {
            segment,
            t,
            position,
            anchor: position,
            size,
            angle: 0.0,
            tint: 0,
            hidden: false,
        }
    }

    /// `true` for leaves still drawn on the standing tree.
    pub fn is_visible(&self) -> bool {
        !self.hidden && self.size > 0.0
    }
}

/// A leaf carried by a falling piece, in the piece's local frame.
#[derive(Clone, Debug, PartialEq)]
pub struct RidingLeaf {
    pub position: Vec2,
    pub anchor: Vec2,
    pub size: f32,
    pub angle: f32,
    pub tint: u32,
}

impl RidingLeaf {
    /// Moves a standing leaf into a frame whose origin is `origin`.
    pub fn from_leaf(leaf: &Leaf, origin: Vec2) -> Self {
        Self {
            position: leaf.position - origin,
            anchor: leaf.anchor - origin,
            size: leaf.size,
            angle: leaf.angle,
            tint: leaf.tint,
        }
    }

    /// The same leaf in a frame whose origin sits at `origin` in this one.
    pub fn translated(&self, origin: Vec2) -> Self {
        Self {
            position: self.position - origin,
            anchor: self.anchor - origin,
            size: self.size,
            angle: self.angle,
            tint: self.tint,
        }
    }
}

/// A leaf flying free, handed to the external leaf-physics collaborator.
#[derive(Clone, Debug, PartialEq)]
pub struct DetachedLeaf {
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: f32,
    pub angle: f32,
    pub angular_velocity: f32,
    pub tint: u32,
    /// Remaining opacity; starts at `1`.
    pub life: f32,
    /// Phase of the side-to-side flutter.
    pub flutter: f32,
    pub flutter_speed: f32,
}

impl DetachedLeaf {
    /// A standing leaf knocked off by a slash travelling in `direction`.
    pub fn from_cut(leaf: &Leaf, direction: f32, rng: &mut impl Rng) -> Self {
        Self {
            position: leaf.position,
            velocity: Vec2::new(
                direction * rng.random_range(1.0..3.0) + (rng.random::<f32>() - 0.5),
                rng.random_range(1.0..2.5),
            ),
            size: leaf.size,
            angle: leaf.angle,
            angular_velocity: (rng.random::<f32>() - 0.5) * 0.08,
            tint: leaf.tint,
            life: 1.0,
            flutter: rng.random::<f32>() * TAU,
            flutter_speed: rng.random_range(0.03..0.06),
        }
    }

    /// A riding leaf shaken loose when its piece hits the ground.
    pub fn from_impact(
        leaf: &RidingLeaf,
        origin: Vec2,
        rotation: f32,
        rng: &mut impl Rng,
    ) -> Self {
        Self {
            position: to_world(leaf.position, origin, rotation),
            velocity: Vec2::new(
                (rng.random::<f32>() - 0.5) * 2.0,
                rng.random_range(0.5..1.5),
            ),
            size: leaf.size,
            angle: leaf.angle + rotation,
            angular_velocity: (rng.random::<f32>() - 0.5) * 0.08,
            tint: leaf.tint,
            life: 1.0,
            flutter: rng.random::<f32>() * TAU,
            flutter_speed: rng.random_range(0.03..0.06),
        }
    }
}

/// A riding leaf in world space, ready to draw.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldLeaf {
    pub position: Vec2,
    pub size: f32,
    pub angle: f32,
    pub tint: u32,
    /// Opacity of the piece's leaves.
    pub alpha: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::{SeedableRng, rngs::StdRng};
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn riding_leaf_keeps_offset_from_origin() {
        let mut leaf = Leaf::new(3, 0.5, Vec2::new(12.0, 40.0), 14.0);
        leaf.anchor = Vec2::new(10.0, 38.0);
        let r = RidingLeaf::from_leaf(&leaf, Vec2::new(10.0, 30.0));
        assert_eq!(r.position, Vec2::new(2.0, 10.0));
        assert_eq!(r.anchor, Vec2::new(0.0, 8.0));
        assert_eq!(r.size, 14.0);
    }

    #[test]
    fn cut_leaf_flies_with_the_slash() {
        let mut rng = StdRng::seed_from_u64(1);
        let leaf = Leaf::new(0, 0.2, Vec2::new(5.0, 5.0), 10.0);
        for _ in 0..50 {
            let right = DetachedLeaf::from_cut(&leaf, 1.0, &mut rng);
            assert!(right.velocity.x > 0.0);
            let left = DetachedLeaf::from_cut(&leaf, -1.0, &mut rng);
            assert!(left.velocity.x < 0.0);
            assert_eq!(left.life, 1.0);
        }
    }

    #[test]
    fn impact_leaf_is_placed_in_world_space() {
        let mut rng = StdRng::seed_from_u64(2);
        let r = RidingLeaf {
            position: Vec2::new(10.0, 0.0),
            anchor: Vec2::ZERO,
            size: 8.0,
            angle: 0.1,
            tint: 7,
        };
        let d = DetachedLeaf::from_impact(&r, Vec2::new(100.0, 0.0), FRAC_PI_2, &mut rng);
        assert_abs_diff_eq!(d.position.x, 100.0, epsilon = 1e-4);
        assert_abs_diff_eq!(d.position.y, 10.0, epsilon = 1e-4);
        assert_abs_diff_eq!(d.angle, 0.1 + FRAC_PI_2, epsilon = 1e-6);
        assert!(d.velocity.y > 0.0);
        assert_eq!(d.tint, 7);
    }

    #[test]
    fn hidden_or_empty_leaves_are_not_visible() {
        let mut leaf = Leaf::new(0, 0.5, Vec2::ZERO, 10.0);
        assert!(leaf.is_visible());
        leaf.hidden = true;
        assert!(!leaf.is_visible());
        leaf.hidden = false;
        leaf.size = 0.0;
        assert!(!leaf.is_visible());
    }
}
