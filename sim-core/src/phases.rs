//! The two entry points the world runs every frame.
//!
//! The typical update loop looks like:
//! 1. [`swipe_phase`] - once per swipe motion step, cuts the standing tree
//!    or a falling piece and reports the cut.
//! 2. [`physics_phase`] - once per tick, steps every falling piece, merges
//!    pieces shed on impact and drops pieces that have faded out.

use crate::{
    config::Config,
    detector::CutDetector,
    events::{CutEvent, CutTarget, TickEvents, ring_count},
    executor::{cut_branch, cut_falling_piece},
    geometry::Swipe,
    leaf::Leaf,
    piece_set::PieceSet,
    segment::Cuttable,
    tree::Tree,
};
use rand::Rng;

/// Applies one swipe motion step.
///
/// 1. Searches the standing tree with
///    [`CutDetector::intersect_standing_tree`]. A hit is cut with
///    [`cut_branch`] and the resulting piece (if any) is spawned.
/// 2. Only if the tree was missed, searches the falling pieces with
///    [`CutDetector::intersect_falling_pieces`] and splits the hit piece
///    with [`cut_falling_piece`].
///
/// At most one cut happens per call.
///
/// ### Parameters
/// - `swipe` - World-space motion step of the pointer.
/// - `tree` - Standing tree; truncated and its cut set extended on a hit.
/// - `leaves` - Standing leaf pool; leaves beyond a tree cut are hidden.
/// - `pieces` - Falling pieces; new pieces are appended.
/// - `cfg` - Global configuration, providing [`Config::cut`].
/// - `rng` - Drives launch velocities and leaf detachment.
///
/// ### Returns
/// A [`CutEvent`] describing the cut, or `None` if nothing was hit.
pub fn swipe_phase(
    swipe: &Swipe,
    tree: &mut Tree,
    leaves: &mut [Leaf],
    pieces: &mut PieceSet,
    cfg: &Config,
    rng: &mut impl Rng,
) -> Option<CutEvent> {
    let detector = CutDetector::new(cfg.cut.parallel_epsilon);
    let direction = swipe.direction();

    if let Some(hit) = detector.intersect_standing_tree(swipe, tree) {
        let (depth, angle) = {
            let seg = &tree.segments[hit.segment];
            (seg.depth, seg.angle)
        };
        let cut = cut_branch(tree, &hit, direction, leaves, &cfg.cut, rng);
        let new_piece = cut.piece.map(|init| pieces.spawn(init));

        return Some(CutEvent {
            target: CutTarget::Tree {
                segment: hit.segment,
            },
            point: hit.point,
            depth,
            thickness: cut.thickness,
            angle,
            ring_count: ring_count(depth),
            direction,
            new_piece,
            detached_leaves: cut.detached_leaves,
        });
    }

    let hit = detector.intersect_falling_pieces(swipe, &*pieces)?;
    let piece = pieces.get_mut(hit.piece)?;
    let seg = &piece.segments[hit.sub_segment];
    let (depth, angle) = (seg.depth, seg.angle() + piece.rotation);

    let cut = cut_falling_piece(piece, &hit, direction, &cfg.cut);
    let new_piece = cut.piece.map(|init| pieces.spawn(init));

    Some(CutEvent {
        target: CutTarget::Piece {
            piece: hit.piece,
            sub_segment: hit.sub_segment,
        },
        point: cut.point,
        depth,
        thickness: cut.thickness,
        angle,
        ring_count: ring_count(depth),
        direction,
        new_piece,
        detached_leaves: Vec::new(),
    })
}

/// Advances every falling piece by one tick.
///
/// 1. Steps each piece in list order via
///    [`crate::piece::FallingPiece::step`], collecting impacts, shed leaves
///    and sub-pieces shed on impact.
/// 2. Drops pieces whose step reported them dead.
/// 3. Only after every piece has been stepped, appends the shed sub-pieces
///    so they first move on the next tick.
///
/// ### Parameters
/// - `pieces` - The live falling pieces.
/// - `ground_y` - World height of the ground line.
/// - `cfg` - Global configuration, providing physics and fade constants.
/// - `rng` - Drives impact shedding.
///
/// ### Returns
/// Everything that happened this tick; empty when there are no pieces.
pub fn physics_phase(
    pieces: &mut PieceSet,
    ground_y: f32,
    cfg: &Config,
    rng: &mut impl Rng,
) -> TickEvents {
    let mut events = TickEvents::default();
    let mut spawn = Vec::new();

    pieces.retain_mut(|piece| {
        let alive = piece.step(ground_y, cfg, rng, &mut spawn, &mut events);
        if !alive {
            events.removed.push(piece.id);
        }
        alive
    });

    for id in &events.removed {
        log::debug!("piece {id} removed");
    }

    events
        .spawned
        .extend(spawn.into_iter().map(|init| pieces.spawn(init)));
    events
}
