//! Applies cuts: truncates the hit segment and packages everything beyond
//! the cut point as a new falling piece.
//!
//! The new piece's local origin is always the cut point, so the stump and
//! the piece meet exactly where the blade passed.

use crate::{
    config::CutConfig,
    detector::{PieceHit, TreeHit},
    leaf::{DetachedLeaf, Leaf, RidingLeaf},
    piece::{FallingPiece, PieceInit},
    segment::{Cuttable, PieceSegment},
    tree::Tree,
    types::SegmentId,
};
use glam::Vec2;
use rand::Rng;
use std::collections::HashSet;

/// Outcome of cutting the standing tree.
#[derive(Clone, Debug, PartialEq)]
pub struct BranchCut {
    /// The detached branch, unless the cut left nothing worth simulating.
    pub piece: Option<PieceInit>,
    /// Thickness at the cut point.
    pub thickness: f32,
    /// Segments added to the cut set.
    pub detached: Vec<SegmentId>,
    /// Leaves knocked free instead of riding the piece.
    pub detached_leaves: Vec<DetachedLeaf>,
}

/// Outcome of cutting a falling piece.
#[derive(Clone, Debug, PartialEq)]
pub struct PieceCut {
    pub piece: Option<PieceInit>,
    pub thickness: f32,
    /// World position of the cut.
    pub point: Vec2,
}

/// Cuts a standing segment at `hit`.
///
/// The segment is truncated to end at the cut point and marked cut; its
/// descendants join the cut set. The new piece holds the remainder of the
/// hit segment (if longer than `min_remainder_length`) followed by every
/// descendant, all translated so the cut point is the origin. Leaves beyond
/// the cut mostly ride the piece; each has a `leaf_detach_chance` of flying
/// free instead. With no piece to ride, every affected leaf flies free.
///
/// ### Parameters
/// - `tree` - Standing tree; mutated in place.
/// - `hit` - Result of [`crate::detector::CutDetector::intersect_standing_tree`].
/// - `direction` - Slash direction, `1.0` or `-1.0`.
/// - `leaves` - Standing leaf pool; affected leaves are hidden.
///
/// ### Panics
/// Panics if the hit segment was already cut or detached.
pub fn cut_branch(
    tree: &mut Tree,
    hit: &TreeHit,
    direction: f32,
    leaves: &mut [Leaf],
    cfg: &CutConfig,
    rng: &mut impl Rng,
) -> BranchCut {
    assert!(
        tree.is_cuttable(hit.segment),
        "segment {} was already cut",
        hit.segment
    );

    let seg = &tree.segments[hit.segment];
    let thickness = seg.thickness_at(hit.u);
    let descendants = tree.descendants(hit.segment);

    let mut segments = Vec::with_capacity(descendants.len() + 1);
    let remainder = seg.end - hit.point;
    if remainder.length() > cfg.min_remainder_length {
        segments.push(PieceSegment {
            start: Vec2::ZERO,
            end: remainder,
            start_thickness: thickness,
            end_thickness: seg.end_thickness,
            depth: seg.depth,
            has_children: !seg.children.is_empty(),
            fallen: false,
        });
    }
    segments.extend(
        descendants
            .iter()
            .map(|&i| PieceSegment::from_segment(&tree.segments[i], hit.point)),
    );

    tree.detach(descendants.iter().copied());
    let seg = &mut tree.segments[hit.segment];
    seg.end = hit.point;
    seg.end_thickness = thickness;
    seg.is_cut = true;
    seg.children.clear();

    let falling: HashSet<SegmentId> = descendants.iter().copied().collect();
    let mut riders = Vec::new();
    let mut detached_leaves = Vec::new();
    for leaf in leaves.iter_mut().filter(|l| l.is_visible()) {
        let affected =
            (leaf.segment == hit.segment && leaf.t > hit.u) || falling.contains(&leaf.segment);
        if !affected {
            continue;
        }

        leaf.hidden = true;
        if segments.is_empty() || rng.random::<f32>() < cfg.leaf_detach_chance {
            detached_leaves.push(DetachedLeaf::from_cut(leaf, direction, rng));
        } else {
            riders.push(RidingLeaf::from_leaf(leaf, hit.point));
        }
    }

    log::debug!(
        "cut segment {} at u={:.3}: {} segments detached, {} leaves riding, {} flying",
        hit.segment,
        hit.u,
        descendants.len(),
        riders.len(),
        detached_leaves.len()
    );

    let piece = (!segments.is_empty()).then(|| PieceInit {
        position: hit.point,
        velocity: Vec2::new(
            direction * cfg.launch_speed.sample(rng),
            cfg.launch_lift.sample(rng),
        ),
        rotation: 0.0,
        angular_velocity: direction * cfg.launch_spin.sample(rng),
        segments,
        thickness,
        leaves: riders,
    });

    BranchCut {
        piece,
        thickness,
        detached: descendants,
        detached_leaves,
    }
}

/// Splits a falling piece at `hit`.
///
/// The hit sub-segment is truncated at the cut point. Its remainder and
/// its direct children (live sub-segments starting within
/// `adjacency_threshold` of its old end) are marked fallen and become a new
/// piece that inherits the parent's motion plus a kick along the slash.
/// Deeper descendants are not followed; they stay with the parent piece.
/// Riding leaves whose anchor lies closer to the split-off geometry than to
/// what remains move with it.
///
/// ### Panics
/// Panics if the hit sub-segment has already been shed.
pub fn cut_falling_piece(
    piece: &mut FallingPiece,
    hit: &PieceHit,
    direction: f32,
    cfg: &CutConfig,
) -> PieceCut {
    let seg = piece.segments[hit.sub_segment].clone();
    assert!(!seg.fallen, "sub-segment {} was already shed", hit.sub_segment);

    let thickness = seg.thickness_at(hit.u);
    let point = piece.to_world(hit.local_point);

    let mut segments = Vec::new();
    let remainder = seg.end - hit.local_point;
    if remainder.length() > cfg.min_remainder_length {
        segments.push(PieceSegment {
            start: Vec2::ZERO,
            end: remainder,
            start_thickness: thickness,
            end_thickness: seg.end_thickness,
            depth: seg.depth,
            has_children: seg.has_children,
            fallen: false,
        });
    }

    for (i, other) in piece.segments.iter_mut().enumerate() {
        if i == hit.sub_segment || other.fallen {
            continue;
        }
        if other.start.distance(seg.end) < cfg.adjacency_threshold {
            other.fallen = true;
            segments.push(other.translated(hit.local_point));
        }
    }

    let cut = &mut piece.segments[hit.sub_segment];
    cut.end = hit.local_point;
    cut.end_thickness = thickness;
    cut.has_children = false;
    piece.mesh_revision += 1;

    let leaves = if segments.is_empty() {
        Vec::new()
    } else {
        let origin = hit.local_point;
        let (moving, staying): (Vec<RidingLeaf>, Vec<RidingLeaf>) =
            std::mem::take(&mut piece.leaves)
                .into_iter()
                .partition(|leaf| {
                    nearest(&segments, leaf.anchor - origin)
                        < nearest(piece.live_segments(), leaf.anchor)
                });
        piece.leaves = staying;
        moving.iter().map(|leaf| leaf.translated(origin)).collect()
    };

    log::debug!(
        "re-cut piece {} sub-segment {}: {} segments and {} leaves split off",
        piece.id,
        hit.sub_segment,
        segments.len(),
        leaves.len()
    );

    let init = (!segments.is_empty()).then(|| PieceInit {
        position: point,
        velocity: piece.velocity + Vec2::new(direction * cfg.recut_kick_speed, cfg.recut_kick_lift),
        rotation: piece.rotation,
        angular_velocity: piece.angular_velocity + direction * cfg.recut_kick_spin,
        segments,
        thickness,
        leaves,
    });

    PieceCut {
        piece: init,
        thickness,
        point,
    }
}

fn nearest<'a>(segments: impl IntoIterator<Item = &'a PieceSegment>, p: Vec2) -> f32 {
    segments
        .into_iter()
        .map(|s| s.distance_to(p))
        .fold(f32::INFINITY, f32::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{physics::tests::rod, piece::FallingPiece, tree::tests::sample_tree};
    use approx::assert_abs_diff_eq;
    use rand::{SeedableRng, rngs::StdRng};

    fn total_length(tree: &Tree, ids: &[SegmentId]) -> f32 {
        ids.iter().map(|&i| tree.segments[i].length()).sum()
    }

    fn hit_at(tree: &Tree, segment: SegmentId, u: f32) -> TreeHit {
        TreeHit {
            segment,
            point: tree.segments[segment].point_at(u),
            u,
        }
    }

    #[test]
    fn branch_cut_conserves_length_and_fills_cut_set() {
        let mut tree = sample_tree();
        let before = total_length(&tree, &[1, 2, 3, 4]);
        let hit = hit_at(&tree, 1, 0.4);
        let mut rng = StdRng::seed_from_u64(9);

        let cut = cut_branch(&mut tree, &hit, 1.0, &mut [], &CutConfig::default(), &mut rng);

        let mut detached = cut.detached.clone();
        detached.sort_unstable();
        assert_eq!(detached, vec![2, 3, 4]);
        assert_eq!(
            tree.cut_branches().iter().copied().collect::<Vec<_>>(),
            vec![2, 3, 4]
        );

        let piece = cut.piece.expect("piece");
        assert_eq!(piece.segments.len(), 4);
        let piece_len: f32 = piece.segments.iter().map(|s| s.length()).sum();
        assert_abs_diff_eq!(tree.segments[1].length() + piece_len, before, epsilon = 1e-3);
    }

    #[test]
    fn branch_cut_truncates_stump_and_offsets_piece() {
        let mut tree = sample_tree();
        let hit = hit_at(&tree, 1, 0.5);
        let expected_thickness = tree.segments[1].thickness_at(0.5);
        let mut rng = StdRng::seed_from_u64(1);

        let cut = cut_branch(&mut tree, &hit, -1.0, &mut [], &CutConfig::default(), &mut rng);

        let stump = &tree.segments[1];
        assert!(stump.is_cut);
        assert!(stump.children.is_empty());
        assert_eq!(stump.end, hit.point);
        assert_abs_diff_eq!(stump.end_thickness, expected_thickness, epsilon = 1e-5);
        assert_abs_diff_eq!(cut.thickness, expected_thickness, epsilon = 1e-5);

        let piece = cut.piece.expect("piece");
        assert_eq!(piece.position, hit.point);
        assert_eq!(piece.rotation, 0.0);
        assert!(piece.velocity.x < 0.0 && piece.velocity.y > 0.0);
        assert!(piece.angular_velocity < 0.0);

        // Remainder starts at the origin and reaches the old end.
        let remainder = &piece.segments[0];
        assert_eq!(remainder.start, Vec2::ZERO);
        assert_abs_diff_eq!(remainder.end.y, 35.0, epsilon = 1e-3);
        assert!(remainder.has_children);
        // Descendants keep their world offsets relative to the cut point.
        for s in &piece.segments[1..] {
            assert!(s.start.y >= 35.0 - 1e-3);
        }
    }

    #[test]
    fn tiny_remainder_is_dropped() {
        let mut tree = sample_tree();
        // Segment 4 is 36 long; u = 0.99 leaves ~0.36.
        let hit = hit_at(&tree, 4, 0.99);
        let mut rng = StdRng::seed_from_u64(2);
        let cut = cut_branch(&mut tree, &hit, 1.0, &mut [], &CutConfig::default(), &mut rng);
        assert!(cut.piece.is_none());
        assert!(tree.segments[4].is_cut);
        assert!(tree.cut_branches().is_empty());
    }

    #[test]
    fn leaves_beyond_the_cut_ride_or_fly() {
        let mut tree = sample_tree();
        let mut leaves = vec![
            Leaf::new(1, 0.2, Vec2::new(0.0, 114.0), 10.0),
            Leaf::new(1, 0.8, Vec2::new(0.0, 156.0), 10.0),
            Leaf::new(2, 0.5, Vec2::new(-15.0, 190.0), 10.0),
            Leaf::new(0, 0.5, Vec2::new(0.0, 50.0), 10.0),
        ];
        let hit = hit_at(&tree, 1, 0.5);
        let mut rng = StdRng::seed_from_u64(3);

        let cut = cut_branch(&mut tree, &hit, 1.0, &mut leaves, &CutConfig::default(), &mut rng);

        assert!(!leaves[0].hidden, "leaf below the cut stays");
        assert!(leaves[1].hidden && leaves[2].hidden);
        assert!(!leaves[3].hidden);

        let piece = cut.piece.expect("piece");
        assert_eq!(piece.leaves.len() + cut.detached_leaves.len(), 2);
        if let Some(rider) = piece.leaves.iter().find(|l| l.position.x == 0.0) {
            assert_abs_diff_eq!(rider.position.y, 156.0 - 135.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn every_leaf_detaches_when_chance_is_certain() {
        let mut tree = sample_tree();
        let mut leaves = vec![Leaf::new(2, 0.5, Vec2::new(-15.0, 190.0), 10.0)];
        let cfg = CutConfig {
            leaf_detach_chance: 1.0,
            ..CutConfig::default()
        };
        let hit = hit_at(&tree, 1, 0.5);
        let mut rng = StdRng::seed_from_u64(4);

        let cut = cut_branch(&mut tree, &hit, 1.0, &mut leaves, &cfg, &mut rng);
        assert_eq!(cut.detached_leaves.len(), 1);
        assert!(cut.piece.is_some_and(|p| p.leaves.is_empty()));
    }

    #[test]
    #[should_panic]
    fn cutting_a_detached_segment_panics() {
        let mut tree = sample_tree();
        let mut rng = StdRng::seed_from_u64(5);
        let first = hit_at(&tree, 1, 0.5);
        cut_branch(&mut tree, &first, 1.0, &mut [], &CutConfig::default(), &mut rng);
        let second = hit_at(&tree, 3, 0.5);
        cut_branch(&mut tree, &second, 1.0, &mut [], &CutConfig::default(), &mut rng);
    }

    fn forked_piece() -> FallingPiece {
        // 0: stem (0,0)->(0,40); 1, 2 fork from its end; 3 continues 2.
        FallingPiece::new(
            7,
            PieceInit {
                position: Vec2::new(200.0, 300.0),
                velocity: Vec2::new(1.0, -2.0),
                rotation: 0.3,
                angular_velocity: 0.01,
                segments: vec![
                    rod(Vec2::ZERO, Vec2::new(0.0, 40.0), 8.0, 2),
                    rod(Vec2::new(0.0, 40.0), Vec2::new(-20.0, 60.0), 4.0, 3),
                    rod(Vec2::new(0.5, 41.0), Vec2::new(20.0, 60.0), 4.0, 3),
                    rod(Vec2::new(20.0, 60.0), Vec2::new(30.0, 80.0), 2.0, 4),
                ],
                thickness: 8.0,
                leaves: Vec::new(),
            },
        )
    }

    #[test]
    fn recut_takes_remainder_and_direct_children_only() {
        let mut piece = forked_piece();
        let hit = PieceHit {
            piece: piece.id,
            sub_segment: 0,
            local_point: Vec2::new(0.0, 10.0),
            u: 0.25,
        };

        let cut = cut_falling_piece(&mut piece, &hit, 1.0, &CutConfig::default());
        let init = cut.piece.expect("piece");

        // Remainder plus segments 1 and 2; segment 3 hangs off 2 and stays.
        assert_eq!(init.segments.len(), 3);
        assert!(piece.segments[1].fallen && piece.segments[2].fallen);
        assert!(!piece.segments[3].fallen);
        assert_eq!(init.segments[1].start, Vec2::new(0.0, 30.0));

        assert_eq!(piece.segments[0].end, Vec2::new(0.0, 10.0));
        assert!(!piece.segments[0].has_children);
        assert_eq!(piece.mesh_revision, 1);

        assert_abs_diff_eq!(init.position.x, cut.point.x, epsilon = 1e-5);
        let expected = piece.to_world(Vec2::new(0.0, 10.0));
        assert_abs_diff_eq!(cut.point.distance(expected), 0.0, epsilon = 1e-4);
        assert_eq!(init.velocity, Vec2::new(3.0, 0.0));
        assert_eq!(init.rotation, 0.3);
        assert_abs_diff_eq!(init.angular_velocity, 0.06, epsilon = 1e-6);
    }

    #[test]
    fn recut_moves_leaves_with_the_geometry_they_grow_on() {
        let mut piece = forked_piece();
        let leaf = |x: f32, y: f32| RidingLeaf {
            position: Vec2::new(x + 3.0, y),
            anchor: Vec2::new(x, y),
            size: 10.0,
            angle: 0.0,
            tint: 2,
        };
        // On child 1, on the stem below the cut, and on segment 3.
        piece.leaves = vec![leaf(-20.0, 60.0), leaf(0.0, 5.0), leaf(25.0, 70.0)];
        let hit = PieceHit {
            piece: piece.id,
            sub_segment: 0,
            local_point: Vec2::new(0.0, 10.0),
            u: 0.25,
        };

        let cut = cut_falling_piece(&mut piece, &hit, 1.0, &CutConfig::default());
        let init = cut.piece.expect("piece");

        assert_eq!(init.leaves.len(), 1);
        assert_eq!(init.leaves[0].anchor, Vec2::new(-20.0, 50.0));
        assert_eq!(init.leaves[0].position, Vec2::new(-17.0, 50.0));
        let kept: Vec<Vec2> = piece.leaves.iter().map(|l| l.anchor).collect();
        assert_eq!(kept, vec![Vec2::new(0.0, 5.0), Vec2::new(25.0, 70.0)]);
    }

    #[test]
    fn recut_near_the_tip_of_a_leaf_segment_spawns_nothing() {
        let mut piece = forked_piece();
        let hit = PieceHit {
            piece: piece.id,
            sub_segment: 3,
            local_point: Vec2::new(29.5, 79.0),
            u: 0.95,
        };
        let cut = cut_falling_piece(&mut piece, &hit, -1.0, &CutConfig::default());
        assert!(cut.piece.is_none());
        assert_eq!(piece.segments[3].end, Vec2::new(29.5, 79.0));
        assert_eq!(piece.mesh_revision, 1);
    }
}
