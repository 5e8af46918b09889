//! Plain-data reports handed to the audio, particle and camera collaborators.
//!
//! The core never plays sounds or spawns particles itself. A swipe that cuts
//! something returns a [`CutEvent`]; every tick returns [`TickEvents`].

use crate::{
    leaf::DetachedLeaf,
    types::{PieceId, SegmentId},
};
use glam::Vec2;

/// What a swipe cut.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CutTarget {
    /// A segment of the standing tree.
    Tree { segment: SegmentId },
    /// A sub-segment of a falling piece.
    Piece { piece: PieceId, sub_segment: usize },
}

/// Everything the effect layers need to react to one cut.
#[derive(Clone, Debug, PartialEq)]
pub struct CutEvent {
    pub target: CutTarget,
    /// World position of the cut.
    pub point: Vec2,
    pub depth: u32,
    /// Branch thickness at the cut point.
    pub thickness: f32,
    /// World heading of the cut segment; the cap is drawn perpendicular to it.
    pub angle: f32,
    /// Growth rings to draw on the exposed cap.
    pub ring_count: u32,
    /// Horizontal direction of the slash, `1.0` or `-1.0`.
    pub direction: f32,
    /// The piece created by the cut, if any.
    pub new_piece: Option<PieceId>,
    /// Leaves knocked free by the cut.
    pub detached_leaves: Vec<DetachedLeaf>,
}

impl CutEvent {
    /// Cuts through the trunk or its first fork get the heavy sound.
    pub fn is_trunk(&self) -> bool {
        matches!(self.target, CutTarget::Tree { .. }) && self.depth <= 1
    }
}

/// Growth rings shown on a cut cap for a branch at `depth`.
pub fn ring_count(depth: u32) -> u32 {
    ((3.0 + depth as f32 * 0.8).floor() as u32).max(3)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImpactKind {
    /// A fast contact that sent the piece back up.
    Bounce,
    /// The first time the piece came to rest on the ground.
    Landing,
}

/// A piece hitting the ground.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Impact {
    pub piece: PieceId,
    /// Contact point on the ground line.
    pub point: Vec2,
    pub kind: ImpactKind,
    /// Camera shake amount, if the piece is heavy enough to cause one.
    pub shake: Option<f32>,
}

/// Side effects of one physics tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickEvents {
    pub impacts: Vec<Impact>,
    /// Pieces created this tick by impact shedding.
    pub spawned: Vec<PieceId>,
    /// Riding leaves shaken loose on impact, in world space.
    pub shed_leaves: Vec<DetachedLeaf>,
    /// Pieces that finished fading and were dropped.
    pub removed: Vec<PieceId>,
}

impl TickEvents {
    pub fn is_empty(&self) -> bool {
        self.impacts.is_empty()
            && self.spawned.is_empty()
            && self.shed_leaves.is_empty()
            && self.removed.is_empty()
    }

    /// Strongest shake requested this tick.
    pub fn max_shake(&self) -> Option<f32> {
        self.impacts
            .iter()
            .filter_map(|i| i.shake)
            .fold(None, |acc, s| Some(acc.map_or(s, |a: f32| a.max(s))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(target: CutTarget, depth: u32) -> CutEvent {
        CutEvent {
            target,
            point: Vec2::ZERO,
            depth,
            thickness: 10.0,
            angle: 0.0,
            ring_count: ring_count(depth),
            direction: 1.0,
            new_piece: None,
            detached_leaves: Vec::new(),
        }
    }

    #[test]
    fn trunk_flag_covers_depth_zero_and_one_of_the_tree() {
        assert!(event(CutTarget::Tree { segment: 0 }, 0).is_trunk());
        assert!(event(CutTarget::Tree { segment: 1 }, 1).is_trunk());
        assert!(!event(CutTarget::Tree { segment: 5 }, 2).is_trunk());
        assert!(
            !event(
                CutTarget::Piece {
                    piece: 1,
                    sub_segment: 0
                },
                0
            )
            .is_trunk()
        );
    }

    #[test]
    fn ring_count_grows_with_depth() {
        assert_eq!(ring_count(0), 3);
        assert_eq!(ring_count(1), 3);
        assert_eq!(ring_count(2), 4);
        assert_eq!(ring_count(5), 7);
    }

    #[test]
    fn max_shake_picks_the_strongest_impact() {
        let mut ev = TickEvents::default();
        assert!(ev.is_empty());
        assert_eq!(ev.max_shake(), None);

        for (i, shake) in [Some(1.5), None, Some(3.0)].into_iter().enumerate() {
            ev.impacts.push(Impact {
                piece: i as PieceId,
                point: Vec2::ZERO,
                kind: ImpactKind::Bounce,
                shake,
            });
        }
        assert!(!ev.is_empty());
        assert_eq!(ev.max_shake(), Some(3.0));
    }
}
