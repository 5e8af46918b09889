//! Leaf placement and free-flight for the viewer.
//!
//! The simulation core only tracks which leaves leave the tree; where they
//! grow and how they drift once loose is up to the frontend.

use glam::Vec2;
use rand::Rng;
use std::f32::consts::{PI, TAU};
use treecut_core::{
    leaf::{DetachedLeaf, Leaf},
    segment::{Cuttable, Segment},
};

/// Number of entries in the viewer's leaf palette.
pub const PALETTE_LEN: u32 = 5;

/// Scatters leaves around every segment at depth 3 or deeper, with an
/// extra cluster on bare tips.
pub fn scatter_leaves(segments: &[Segment], rng: &mut impl Rng) -> Vec<Leaf> {
    let mut leaves = Vec::new();

    for seg in segments.iter().filter(|s| s.depth >= 3) {
        if seg.length() < 3.0 {
            continue;
        }

        let along = (seg.end - seg.start).normalize_or_zero();
        let across = along.perp();

        let count = match seg.depth {
            7.. => rng.random_range(6..12),
            5..=6 => rng.random_range(5..10),
            4 => rng.random_range(3..7),
            _ => rng.random_range(2..4),
        };
        let spread: f32 = match seg.depth {
            6.. => rng.random_range(22.0..40.0),
            4..=5 => rng.random_range(16.0..30.0),
            _ => rng.random_range(10.0..18.0),
        };

        for _ in 0..count {
            let t: f32 = rng.random_range(0.15..0.95);
            let anchor = seg.point_at(t);
            let offset = across * (rng.random::<f32>() - 0.5) * 2.0 * spread
                + along * (rng.random::<f32>() - 0.5) * spread * 0.6;
            let size = leaf_size(seg.depth, rng);
            leaves.push(leaf(seg, t, anchor, anchor + offset, size, rng));
        }

        if seg.children.is_empty() && seg.depth >= 5 {
            for _ in 0..rng.random_range(4..9) {
                let reach: f32 = rng.random_range(18.0..38.0) * rng.random_range(0.3..1.0);
                let offset = Vec2::from_angle(rng.random::<f32>() * TAU) * reach;
                let size = rng.random_range(10.0..20.0);
                leaves.push(leaf(seg, 0.95, seg.end, seg.end + offset, size, rng));
            }
        }
    }

    leaves
}

fn leaf_size(depth: u32, rng: &mut impl Rng) -> f32 {
    match depth {
        7.. => rng.random_range(10.0..18.0),
        5..=6 => rng.random_range(12.0..21.0),
        4 => rng.random_range(14.0..23.0),
        _ => rng.random_range(16.0..23.0),
    }
}

fn leaf(
    seg: &Segment,
    t: f32,
    anchor: Vec2,
    position: Vec2,
    size: f32,
    rng: &mut impl Rng,
) -> Leaf {
    let mut l = Leaf::new(seg.index, t, position, size);
    l.anchor = anchor;
    l.angle = (rng.random::<f32>() - 0.5) * PI * 0.8;
    l.tint = rng.random_range(0..PALETTE_LEN);
    l
}

/// Drifts loose leaves down with flutter and drops them once faded.
///
/// Leaves fade out within 40 units of the ground and are removed below it.
pub fn step_flying(leaves: &mut Vec<DetachedLeaf>, ground_y: f32) {
    leaves.retain_mut(|l| {
        l.velocity.y -= 0.04;
        l.flutter += l.flutter_speed;
        l.velocity.x += l.flutter.sin() * 0.12;
        l.velocity.x *= 0.98;
        l.velocity.y = (l.velocity.y * 0.99).max(-1.8);

        l.position += l.velocity;
        l.angle += l.angular_velocity;
        l.angular_velocity = (l.angular_velocity + l.flutter.sin() * 0.003) * 0.98;

        if l.position.y < ground_y + 40.0 {
            l.life -= 0.025;
        }
        l.life > 0.0 && l.position.y > ground_y - 20.0
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use treecut_core::generator::TreeGenerator;

    #[test]
    fn leaves_only_grow_on_deep_segments() {
        let segments =
            TreeGenerator::new(Default::default()).generate_seeded(42.0, Vec2::ZERO, 800.0);
        let mut rng = StdRng::seed_from_u64(1);
        let leaves = scatter_leaves(&segments, &mut rng);

        assert!(!leaves.is_empty());
        for l in &leaves {
            assert!(segments[l.segment].depth >= 3);
            assert!((0.15..=0.95).contains(&l.t));
            assert!(l.tint < PALETTE_LEN);
            assert!(l.is_visible());
        }
    }

    #[test]
    fn flying_leaves_fall_and_expire() {
        let mut leaves = vec![DetachedLeaf {
            position: Vec2::new(0.0, 100.0),
            velocity: Vec2::ZERO,
            size: 10.0,
            angle: 0.0,
            angular_velocity: 0.0,
            tint: 0,
            life: 1.0,
            flutter: 0.0,
            flutter_speed: 0.05,
        }];

        step_flying(&mut leaves, 0.0);
        assert!(leaves[0].position.y < 100.0);

        for _ in 0..2000 {
            step_flying(&mut leaves, 0.0);
        }
        assert!(leaves.is_empty());
    }
}
