//! Recursive, seeded construction of the branch hierarchy.
//!
//! # Draw order
//!
//! Seeded trees must be bit-identical across runs, so the order and number
//! of [`SeededRandom`] draws is part of this module's contract. For every
//! segment, in depth-first pre-order (a segment, then each child subtree in
//! turn):
//!
//! 1. length variation: `range(0.8, 1.1)` at depth >= 6, else `range(0.85, 1.15)`
//! 2. bend: `range(-max_bend, max_bend)`
//! 3. child headings, by depth of the segment just built:
//!    - depth 0: one heading draw `range(-0.1, 0.1)`, then one discarded
//!      `range(0.4, 1.6)`.
//!    - depth 1: `chance(0.6)` picks 3 children (else 2); per child one
//!      heading draw `range(-0.2, 0.2)` then one discarded `range(0.25, 1.75)`.
//!    - depth >= 2: two count draws `r1`, `r2`; then per candidate child one
//!      heading draw, one prune draw, and one discarded `range(0.35, 1.65)`.
//!      The prune draw is taken even at depths that never prune.
//!
//! Children are recursed into only after all of a segment's heading draws
//! have been taken.

use crate::{config::GrowthConfig, random::SeededRandom, segment::Segment, types::SegmentId};
use glam::Vec2;
use std::f32::consts::FRAC_PI_2;

/// Builds tapered segment forests from a root point.
#[derive(Clone, Debug)]
pub struct TreeGenerator {
    cfg: GrowthConfig,
}

impl TreeGenerator {
    pub fn new(cfg: GrowthConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &GrowthConfig {
        &self.cfg
    }

    /// Generates a tree growing straight up from `root`.
    ///
    /// ### Parameters
    /// - `rng` - Seeded stream; consumed in the documented draw order.
    /// - `root` - World position of the trunk's base.
    /// - `canvas_height` - Scales the trunk length (capped by
    ///   `GrowthConfig::max_base_length`).
    ///
    /// ### Returns
    /// A flat arena where each segment's `index` equals its position and
    /// `children` point into the same arena.
    pub fn generate(&self, rng: &mut SeededRandom, root: Vec2, canvas_height: f32) -> Vec<Segment> {
        let base_length =
            (canvas_height * self.cfg.base_length_ratio).min(self.cfg.max_base_length);
        let mut segments = Vec::with_capacity(256);
        self.build_branch(rng, &mut segments, base_length, root, FRAC_PI_2, 0, None);
        log::info!(
            "generated tree with {} segments (seed {})",
            segments.len(),
            rng.seed()
        );
        segments
    }

    /// Convenience wrapper that seeds a fresh stream.
    pub fn generate_seeded(&self, seed: f64, root: Vec2, canvas_height: f32) -> Vec<Segment> {
        let mut rng = SeededRandom::new(seed);
        self.generate(&mut rng, root, canvas_height)
    }

    #[allow(clippy::too_many_arguments)]
    fn build_branch(
        &self,
        rng: &mut SeededRandom,
        segments: &mut Vec<Segment>,
        base_length: f32,
        start: Vec2,
        heading: f32,
        depth: u32,
        parent: Option<SegmentId>,
    ) -> Option<SegmentId> {
        if depth >= self.cfg.max_depth {
            return None;
        }

        let variation = if depth >= 6 {
            rng.range(0.8, 1.1)
        } else {
            rng.range(0.85, 1.15)
        };
        let length = base_length * self.cfg.length_decay.powi(depth as i32) * variation;
        let start_thickness = self.cfg.base_thickness * self.cfg.thickness_decay.powi(depth as i32);
        let end_thickness =
            self.cfg.base_thickness * self.cfg.thickness_decay.powi(depth as i32 + 1);

        let bend = rng.range(-self.cfg.max_bend, self.cfg.max_bend);
        let angle = heading + bend;
        let end = start + Vec2::from_angle(angle) * length;

        let index = segments.len();
        segments.push(Segment {
            index,
            parent,
            children: Vec::new(),
            start,
            end,
            angle,
            start_thickness,
            end_thickness,
            depth,
            is_cut: false,
        });

        for child_heading in child_headings(rng, depth, angle) {
            if let Some(child) = self.build_branch(
                rng,
                segments,
                base_length,
                end,
                child_heading,
                depth + 1,
                Some(index),
            ) {
                segments[index].children.push(child);
            }
        }

        Some(index)
    }
}

/// Number of children a segment at `depth >= 2` proposes, from two draws.
fn branch_count(depth: u32, r1: f32, r2: f32) -> usize {
    if depth >= 7 {
        if r1 < 0.75 {
            1
        } else if r2 < 0.6 {
            0
        } else {
            2
        }
    } else if depth >= 5 {
        if r1 < 0.55 { 1 } else { 2 }
    } else if depth < 4 {
        if r1 < 0.7 { 2 } else { 3 }
    } else if r1 < 0.5 {
        2
    } else if r2 < 0.7 {
        1
    } else {
        3
    }
}

/// Probability that a candidate child of a `depth` segment is dropped.
fn prune_threshold(depth: u32) -> f32 {
    if depth < 4 {
        0.0
    } else if depth >= 6 {
        0.2
    } else {
        0.12
    }
}

/// Headings of the children of a segment, consuming draws in contract order.
fn child_headings(rng: &mut SeededRandom, depth: u32, angle: f32) -> Vec<f32> {
    let mut headings = Vec::with_capacity(3);

    match depth {
        0 => {
            headings.push(angle + rng.range(-0.1, 0.1));
            rng.range(0.4, 1.6);
        }
        1 => {
            let n = if rng.chance(0.6) { 3 } else { 2 };
            for i in 0..n {
                let fan = if n == 2 {
                    if i == 0 { -0.7 } else { 0.7 }
                } else {
                    (i as f32 - 1.0) * 0.6
                };
                headings.push(angle + fan + rng.range(-0.2, 0.2));
                rng.range(0.25, 1.75);
            }
        }
        _ => {
            let r1 = rng.random();
            let r2 = rng.random();
            let n = branch_count(depth, r1, r2);
            let spread = 0.5 + depth as f32 * 0.05;

            for i in 0..n {
                let heading = match n {
                    1 => angle + rng.range(-spread * 0.5, spread * 0.5),
                    2 => {
                        let side = if i == 0 { -1.0 } else { 1.0 };
                        angle + side * rng.range(spread * 0.4, spread)
                    }
                    _ => angle + (i as f32 - 1.0) * rng.range(spread * 0.5, spread),
                };

                let prune = rng.random();
                rng.range(0.35, 1.65);

                if prune > prune_threshold(depth) {
                    headings.push(heading);
                }
            }
        }
    }

    headings
}
