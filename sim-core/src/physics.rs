//! Rigid-body helpers for pieces made of tapered segments.
//!
//! Mass is approximated as `length * mean thickness` per sub-segment, and
//! inertia with the thin-rod formula. Both are floored so that degenerate
//! pieces never divide by zero.

use crate::{
    geometry::to_world,
    segment::{Cuttable, PieceSegment},
};
use glam::Vec2;

/// A quad corner of a piece, in both frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Corner {
    pub local: Vec2,
    pub world: Vec2,
}

/// Total mass and its local-frame centroid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MassProperties {
    pub center: Vec2,
    /// Never zero: massless pieces report `1.0`.
    pub mass: f32,
}

/// Corners of every live sub-segment's tapered quad.
///
/// ### Parameters
/// - `segments` - Piece-local sub-segments; `fallen` ones are skipped.
/// - `origin` - World position of the piece's local origin.
/// - `rotation` - Piece rotation in radians.
pub fn corners(segments: &[PieceSegment], origin: Vec2, rotation: f32) -> Vec<Corner> {
    segments
        .iter()
        .filter(|s| !s.fallen)
        .flat_map(|s| s.quad())
        .map(|local| Corner {
            local,
            world: to_world(local, origin, rotation),
        })
        .collect()
}

/// The corner with the smallest world `y`. First one wins on ties.
pub fn lowest_corner(corners: &[Corner]) -> Option<Corner> {
    corners.iter().copied().fold(None, |best, c| match best {
        Some(b) if b.world.y <= c.world.y => Some(b),
        _ => Some(c),
    })
}

/// World x-extent of the corners resting within `tolerance` of the ground.
///
/// ### Returns
/// `(left, right)`, or `None` if nothing touches.
pub fn footprint(corners: &[Corner], ground_y: f32, tolerance: f32) -> Option<(f32, f32)> {
    corners
        .iter()
        .filter(|c| c.world.y <= ground_y + tolerance)
        .fold(None, |acc, c| match acc {
            None => Some((c.world.x, c.world.x)),
            Some((l, r)) => Some((l.min(c.world.x), r.max(c.world.x))),
        })
}

/// Mass-weighted centroid of the live sub-segments.
pub fn center_of_mass(segments: &[PieceSegment]) -> MassProperties {
    let (weighted, mass) = segments
        .iter()
        .filter(|s| !s.fallen)
        .fold((Vec2::ZERO, 0.0), |(acc, m), s| {
            let sm = s.mass();
            (acc + s.midpoint() * sm, m + sm)
        });

    if mass > 0.0 {
        MassProperties {
            center: weighted / mass,
            mass,
        }
    } else {
        MassProperties {
            center: Vec2::ZERO,
            mass: 1.0,
        }
    }
}

/// Moment of inertia about a local-frame pivot.
///
/// Each live sub-segment contributes `m * (d^2 + L^2 / 12)` where `d` is
/// the distance from its midpoint to the pivot. The sum is floored to
/// `min_inertia`.
pub fn moment_of_inertia(segments: &[PieceSegment], pivot: Vec2, min_inertia: f32) -> f32 {
    segments
        .iter()
        .filter(|s| !s.fallen)
        .map(|s| {
            let len = s.length();
            s.mass() * (s.midpoint().distance_squared(pivot) + len * len / 12.0)
        })
        .sum::<f32>()
        .max(min_inertia)
}
