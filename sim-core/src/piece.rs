//! Detached rigid bodies and their per-tick state machine.
//!
//! A piece moves through these phases:
//!
//! ```text
//! Airborne --first contact--> Bounced
//! Bounced  --fast contact---> Bounced   (bounce)
//! Bounced  --slow contact---> Pivoting
//! Pivoting --lifts off------> Bounced
//! Pivoting --stable, still--> Settled
//! Pivoting --balanced, still-> Settled   (narrow base, after `rest_ticks`)
//! Pivoting --max_pivot_ticks-> Settled
//! Settled  --leaves gone----> Fading    (dropped at zero opacity)
//! ```
//!
//! Impact shedding and leaf shedding happen on the `Airborne -> Bounced`
//! edge, so they fire once per piece. The landing shake fires on the first
//! entry into `Pivoting`.

use crate::{
    config::{Config, FadeConfig, PhysicsConfig},
    events::{Impact, ImpactKind, TickEvents},
    geometry::{to_local, to_world},
    leaf::{DetachedLeaf, RidingLeaf, WorldLeaf},
    physics::{self, Corner},
    segment::{Cuttable, PieceSegment},
    types::PieceId,
};
use glam::Vec2;
use rand::Rng;

/// Where a piece is in its fall.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PiecePhase {
    /// Has never touched the ground.
    Airborne,
    /// Has hit the ground at least once and is currently off it.
    /// `landed` records whether it has already rested (pivoted) before.
    Bounced { landed: bool },
    /// Resting on the ground, either damping to a stop or toppling about
    /// its lowest corner. Bounded by `max_pivot_ticks`.
    Pivoting,
    /// At rest; riding leaves fade after a grace period.
    Settled { ground_ticks: u32 },
    /// Leaves are gone and the wood itself is fading out.
    Fading { ground_ticks: u32 },
}

impl PiecePhase {
    /// `true` once the piece has stopped simulating physics.
    pub fn is_resting(&self) -> bool {
        matches!(self, Self::Settled { .. } | Self::Fading { .. })
    }
}

/// Result of the last ground-support evaluation, kept for inspection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Support {
    /// World x-extent of the corners touching the ground.
    pub footprint: Option<(f32, f32)>,
    /// World x of the center of mass.
    pub center_x: f32,
    pub stable: bool,
    /// Center of mass lies over the footprint, however narrow.
    pub balanced: bool,
    /// World position of the contact corner after this tick's update.
    pub pivot: Vec2,
}

/// Everything needed to create a piece; the [`crate::piece_set::PieceSet`]
/// assigns the id.
#[derive(Clone, Debug, PartialEq)]
pub struct PieceInit {
    pub position: Vec2,
    pub velocity: Vec2,
    pub rotation: f32,
    pub angular_velocity: f32,
    pub segments: Vec<PieceSegment>,
    /// Thickness at the cut that created the piece; scales camera shake.
    pub thickness: f32,
    pub leaves: Vec<RidingLeaf>,
}

/// An independently simulated detached branch.
#[derive(Clone, Debug, PartialEq)]
pub struct FallingPiece {
    pub id: PieceId,
    /// World position of the local origin (the cut point).
    pub position: Vec2,
    pub velocity: Vec2,
    pub rotation: f32,
    pub angular_velocity: f32,
    pub segments: Vec<PieceSegment>,
    pub thickness: f32,
    pub leaves: Vec<RidingLeaf>,
    pub phase: PiecePhase,
    /// Opacity of the wood.
    pub alpha: f32,
    /// Opacity of the riding leaves.
    pub leaf_alpha: f32,
    /// Bumped whenever the set of live sub-segments changes.
    pub mesh_revision: u32,
    pub support: Option<Support>,
    /// Ticks spent in [`PiecePhase::Pivoting`], across lift-offs.
    pub pivot_ticks: u32,
    /// Consecutive still ticks balanced on a narrow base.
    pub balanced_ticks: u32,
}

impl FallingPiece {
    pub fn new(id: PieceId, init: PieceInit) -> Self {
        Self {
            id,
            position: init.position,
            velocity: init.velocity,
            rotation: init.rotation,
            angular_velocity: init.angular_velocity,
            segments: init.segments,
            thickness: init.thickness,
            leaves: init.leaves,
            phase: PiecePhase::Airborne,
            alpha: 1.0,
            leaf_alpha: 1.0,
            mesh_revision: 0,
            support: None,
            pivot_ticks: 0,
            balanced_ticks: 0,
        }
    }

    /// Sub-segments that are still part of this piece.
    pub fn live_segments(&self) -> impl Iterator<Item = &PieceSegment> {
        self.segments.iter().filter(|s| !s.fallen)
    }

    pub fn to_world(&self, local: Vec2) -> Vec2 {
        to_world(local, self.position, self.rotation)
    }

    pub fn to_local(&self, world: Vec2) -> Vec2 {
        to_local(world, self.position, self.rotation)
    }

    /// Four-corner quads of the live sub-segments, in the local frame.
    pub fn local_quads(&self) -> Vec<[Vec2; 4]> {
        self.live_segments().map(|s| s.quad()).collect()
    }

    /// Four-corner quads of the live sub-segments, in world space.
    pub fn world_quads(&self) -> Vec<[Vec2; 4]> {
        self.live_segments()
            .map(|s| s.quad().map(|p| self.to_world(p)))
            .collect()
    }

    pub fn corners(&self) -> Vec<Corner> {
        physics::corners(&self.segments, self.position, self.rotation)
    }

    /// Riding leaves in world space with the current leaf opacity.
    pub fn world_leaves(&self) -> Vec<WorldLeaf> {
        self.leaves
            .iter()
            .map(|l| WorldLeaf {
                position: self.to_world(l.position),
                size: l.size,
                angle: l.angle + self.rotation,
                tint: l.tint,
                alpha: self.leaf_alpha,
            })
            .collect()
    }

    /// Advances the piece by one tick.
    ///
    /// ### Parameters
    /// - `ground_y` - World height of the ground line.
    /// - `cfg` - Physics and fade constants.
    /// - `rng` - Source for shedding decisions and velocities.
    /// - `spawn` - Queue receiving sub-pieces shed on impact; the caller
    ///   merges it after every piece has been stepped.
    /// - `events` - Impacts and shed leaves are appended here.
    ///
    /// ### Returns
    /// `false` once the piece has fully faded (or has nothing left to
    /// simulate) and should be dropped.
    pub fn step(
        &mut self,
        ground_y: f32,
        cfg: &Config,
        rng: &mut impl Rng,
        spawn: &mut Vec<PieceInit>,
        events: &mut TickEvents,
    ) -> bool {
        if self.phase.is_resting() {
            return self.step_fade(&cfg.fade);
        }

        let p = &cfg.physics;

        // While pivoting the position is solved from the contact constraint.
        if self.phase != PiecePhase::Pivoting {
            self.velocity.y += p.gravity;
            self.position += self.velocity;
            self.rotation += self.angular_velocity;
            self.angular_velocity *= p.air_spin_damping;
        }

        let Some(lowest) = physics::lowest_corner(&self.corners()) else {
            return false;
        };

        if lowest.world.y > ground_y {
            if self.phase == PiecePhase::Pivoting {
                self.phase = PiecePhase::Bounced { landed: true };
                log::trace!("piece {} lifted off", self.id);
            }
            return true;
        }

        self.position.y += ground_y - lowest.world.y;

        if self.phase == PiecePhase::Airborne {
            self.shed_branches(p, rng, spawn);
            self.shed_leaves(p, rng, events);
            self.phase = PiecePhase::Bounced { landed: false };
            if self.live_segments().next().is_none() {
                self.release_leaves(rng, events);
                return false;
            }
        }

        if self.phase != PiecePhase::Pivoting && self.velocity.y < -p.bounce_speed {
            self.bounce(p, ground_y, lowest, events);
            return true;
        }

        self.velocity.y = 0.0;
        if self.phase == (PiecePhase::Bounced { landed: false }) {
            events.impacts.push(Impact {
                piece: self.id,
                point: Vec2::new(lowest.world.x, ground_y),
                kind: ImpactKind::Landing,
                shake: self.shake(p, 7.0, p.landing_shake_cap),
            });
        }
        self.phase = PiecePhase::Pivoting;
        self.step_pivot(p, ground_y);
        true
    }

    fn shake(&self, p: &PhysicsConfig, divisor: f32, cap: f32) -> Option<f32> {
        (self.thickness >= p.shake_min_thickness).then(|| (self.thickness / divisor).min(cap))
    }

    fn bounce(
        &mut self,
        p: &PhysicsConfig,
        ground_y: f32,
        lowest: Corner,
        events: &mut TickEvents,
    ) {
        self.velocity.y *= -p.bounce_restitution;
        self.velocity.x *= p.bounce_friction;
        self.angular_velocity *= p.bounce_spin_damping;
        log::trace!("piece {} bounced, vy now {:.3}", self.id, self.velocity.y);
        events.impacts.push(Impact {
            piece: self.id,
            point: Vec2::new(lowest.world.x, ground_y),
            kind: ImpactKind::Bounce,
            shake: self.shake(p, 6.0, p.bounce_shake_cap),
        });
    }

    /// Breaks 2-4 deep sub-segments off as independent pieces.
    fn shed_branches(&mut self, p: &PhysicsConfig, rng: &mut impl Rng, spawn: &mut Vec<PieceInit>) {
        if self.segments.len() <= 1 {
            return;
        }

        let budget = rng.random_range(p.shed_min_count..=p.shed_max_count);
        let mut dropped = 0;
        for j in (0..self.segments.len()).rev() {
            if dropped >= budget {
                break;
            }
            let seg = &self.segments[j];
            if seg.fallen || seg.depth < p.shed_min_depth {
                continue;
            }

            let mut carved = seg.translated(seg.start);
            carved.has_children = false;
            spawn.push(PieceInit {
                position: self.to_world(seg.start),
                velocity: Vec2::new(
                    (rng.random::<f32>() - 0.5) * p.shed_speed,
                    p.shed_lift.sample(rng),
                ),
                rotation: self.rotation,
                angular_velocity: (rng.random::<f32>() - 0.5) * p.shed_spin,
                thickness: seg.start_thickness,
                segments: vec![carved],
                leaves: Vec::new(),
            });
            self.segments[j].fallen = true;
            dropped += 1;
        }

        if dropped > 0 {
            self.mesh_revision += 1;
            log::trace!("piece {} shed {dropped} sub-branches on impact", self.id);
        }
    }

    fn shed_leaves(&mut self, p: &PhysicsConfig, rng: &mut impl Rng, events: &mut TickEvents) {
        let (origin, rotation) = (self.position, self.rotation);
        self.leaves.retain(|leaf| {
            if rng.random::<f32>() < p.leaf_shed_chance {
                events
                    .shed_leaves
                    .push(DetachedLeaf::from_impact(leaf, origin, rotation, rng));
                false
            } else {
                true
            }
        });
    }

    /// Hands every remaining riding leaf to the free-flight layer.
    fn release_leaves(&mut self, rng: &mut impl Rng, events: &mut TickEvents) {
        let (origin, rotation) = (self.position, self.rotation);
        events.shed_leaves.extend(
            std::mem::take(&mut self.leaves)
                .iter()
                .map(|leaf| DetachedLeaf::from_impact(leaf, origin, rotation, rng)),
        );
    }

    fn settle(&mut self) {
        self.angular_velocity = 0.0;
        self.velocity.x = 0.0;
        self.phase = PiecePhase::Settled { ground_ticks: 0 };
    }

    /// Damps a supported piece to rest, or topples an unsupported one about
    /// its lowest corner.
    ///
    /// A piece whose center of mass sits over a footprint too narrow to
    /// count as stable is held still rather than torqued about a single
    /// corner, and settles after `rest_ticks` calm ticks.
    fn step_pivot(&mut self, p: &PhysicsConfig, ground_y: f32) {
        let corners = self.corners();
        let Some(contact) = physics::lowest_corner(&corners) else {
            return;
        };
        self.pivot_ticks += 1;

        let footprint = physics::footprint(&corners, ground_y, p.contact_tolerance);
        let mass = physics::center_of_mass(&self.segments);
        let center_x = self.to_world(mass.center).x;
        let balanced = footprint.is_some_and(|(left, right)| (left..=right).contains(&center_x));
        let stable = balanced
            && footprint.is_some_and(|(left, right)| right - left > p.min_support_span);

        if balanced {
            self.angular_velocity *= p.settle_spin_damping;
            self.velocity.x *= p.settle_speed_damping;

            let still = self.angular_velocity.abs() < p.settle_spin_threshold
                && self.velocity.x.abs() < p.settle_speed_threshold;
            self.balanced_ticks = if still { self.balanced_ticks + 1 } else { 0 };

            if still && (stable || self.balanced_ticks >= p.rest_ticks) {
                self.settle();
                log::trace!("piece {} settled", self.id);
            }

            self.support = Some(Support {
                footprint,
                center_x,
                stable,
                balanced,
                pivot: contact.world,
            });
        } else {
            self.balanced_ticks = 0;

            let pivot_x = contact.world.x;
            let lever = center_x - pivot_x;
            let inertia = physics::moment_of_inertia(&self.segments, contact.local, p.min_inertia);
            let torque = lever * p.gravity * mass.mass;

            self.angular_velocity += torque / inertia;
            self.angular_velocity *= p.topple_spin_damping;
            self.rotation += self.angular_velocity;

            // Keep the contact corner pinned to the ground while rotating about it.
            let pivot = Vec2::new(pivot_x, ground_y);
            self.position = pivot - Vec2::from_angle(self.rotation).rotate(contact.local);
            self.velocity.x *= p.topple_speed_damping;

            self.support = Some(Support {
                footprint,
                center_x,
                stable,
                balanced,
                pivot: self.to_world(contact.local),
            });
        }

        if !self.phase.is_resting() && self.pivot_ticks >= p.max_pivot_ticks {
            self.settle();
            log::debug!(
                "piece {} still pivoting after {} ticks, settling in place",
                self.id,
                self.pivot_ticks
            );
        }
    }

    /// Staged fade: leaves first, wood only once the leaves are gone.
    fn step_fade(&mut self, f: &FadeConfig) -> bool {
        let ground_ticks = match self.phase {
            PiecePhase::Settled { ground_ticks } | PiecePhase::Fading { ground_ticks } => {
                ground_ticks + 1
            }
            _ => return true,
        };

        if ground_ticks > f.leaf_fade_delay {
            self.leaf_alpha = (self.leaf_alpha - f.leaf_fade_rate).max(0.0);
        }

        if self.leaf_alpha <= 0.0 && ground_ticks > f.wood_fade_delay {
            self.alpha = (self.alpha - f.wood_fade_rate).max(0.0);
            self.phase = PiecePhase::Fading { ground_ticks };
        } else {
            self.phase = PiecePhase::Settled { ground_ticks };
        }

        self.alpha > 0.0
    }
}
