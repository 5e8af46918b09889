//! Finds what a swipe step cuts.
//!
//! The standing tree is searched for the hit nearest the swipe's start.
//! Falling pieces are searched in list order and the first hit wins; each
//! piece is tested in its own frame by mapping the swipe through the
//! inverse of the piece transform.

use crate::{
    geometry::{Intersection, Swipe, segment_intersection},
    piece::FallingPiece,
    segment::Cuttable,
    tree::Tree,
    types::{PieceId, SegmentId},
};
use glam::Vec2;

/// A standing segment hit by a swipe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeHit {
    pub segment: SegmentId,
    /// World crossing point.
    pub point: Vec2,
    /// Parameter along the segment.
    pub u: f32,
}

/// A piece sub-segment hit by a swipe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PieceHit {
    pub piece: PieceId,
    pub sub_segment: usize,
    /// Crossing point in the piece's local frame.
    pub local_point: Vec2,
    pub u: f32,
}

/// Swipe-vs-segment tests with the cut rules applied.
#[derive(Clone, Copy, Debug)]
pub struct CutDetector {
    epsilon: f32,
}

impl CutDetector {
    pub fn new(parallel_epsilon: f32) -> Self {
        Self {
            epsilon: parallel_epsilon,
        }
    }

    /// Intersects one element, honoring its exclusion flag.
    pub fn hit<C: Cuttable>(&self, swipe: &Swipe, target: &C) -> Option<Intersection> {
        if target.is_excluded() {
            return None;
        }
        segment_intersection(swipe.start, swipe.end, target.start(), target.end(), self.epsilon)
    }

    /// Finds the standing segment to cut.
    ///
    /// Segments in the cut set or already cut are skipped. Hits on the trunk
    /// or its first fork that land within one base thickness of the segment
    /// start are ignored, so the tree can't be felled at the root. Among the
    /// remaining hits the one closest to the swipe start wins.
    ///
    /// ### Returns
    /// The chosen hit, or `None` if the swipe misses the tree.
    pub fn intersect_standing_tree(&self, swipe: &Swipe, tree: &Tree) -> Option<TreeHit> {
        let mut best: Option<(f32, TreeHit)> = None;

        for seg in tree.segments.iter().filter(|s| !tree.is_detached(s.index)) {
            let Some(hit) = self.hit(swipe, seg) else {
                continue;
            };
            if too_close_to_base(seg, hit.u) {
                continue;
            }

            let dist = hit.point.distance_squared(swipe.start);
            if best.is_none_or(|(d, _)| dist < d) {
                best = Some((
                    dist,
                    TreeHit {
                        segment: seg.index,
                        point: hit.point,
                        u: hit.u,
                    },
                ));
            }
        }

        best.map(|(_, hit)| hit)
    }

    /// Finds the first live piece sub-segment crossed by the swipe.
    ///
    /// Pieces are tested in the order given; within a piece, sub-segments in
    /// index order. Shed sub-segments are skipped.
    pub fn intersect_falling_pieces<'a, I>(&self, swipe: &Swipe, pieces: I) -> Option<PieceHit>
    where
        I: IntoIterator<Item = &'a FallingPiece>,
    {
        pieces.into_iter().find_map(|piece| {
            let local = swipe.to_local(piece.position, piece.rotation);
            piece
                .segments
                .iter()
                .enumerate()
                .find_map(|(i, seg)| {
                    self.hit(&local, seg).map(|hit| PieceHit {
                        piece: piece.id,
                        sub_segment: i,
                        local_point: hit.point,
                        u: hit.u,
                    })
                })
        })
    }
}

fn too_close_to_base<C: Cuttable>(seg: &C, u: f32) -> bool {
    seg.depth() <= 1 && u * seg.length() < seg.start_thickness()
}
