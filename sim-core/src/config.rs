//! Tunable constants for generation, cutting, and piece physics.
//!
//! Every number the simulation uses lives here so a driver can expose the
//! whole set in a UI and reset it to [`Config::default`]. Units are world
//! units (pixels at zoom 1), ticks (one call to `World::tick`), and
//! milliseconds for the growth animation.

use crate::error::ConfigError;
use rand::Rng;

/// A closed `min..max` interval sampled uniformly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Draws `min + r * (max - min)` with `r` uniform in `[0, 1)`.
    ///
    /// Works for degenerate spans (`min == max`), unlike `random_range`.
    pub fn sample(&self, rng: &mut impl Rng) -> f32 {
        self.min + rng.random::<f32>() * (self.max - self.min)
    }
}

/// Parameters of the recursive tree generator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrowthConfig {
    /// Recursion stops before this depth; segments have depth `0..max_depth`.
    pub max_depth: u32,
    /// Start thickness of the trunk.
    pub base_thickness: f32,
    /// Trunk length as a fraction of the canvas height...
    pub base_length_ratio: f32,
    /// ...capped at this many units.
    pub max_base_length: f32,
    /// Length multiplier applied once per depth level.
    pub length_decay: f32,
    /// Thickness multiplier applied once per depth level.
    pub thickness_decay: f32,
    /// Maximum random bend (radians) added to each segment's heading.
    pub max_bend: f32,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            max_depth: 9,
            base_thickness: 28.0,
            base_length_ratio: 0.22,
            max_base_length: 180.0,
            length_decay: 0.7,
            thickness_decay: 0.68,
            max_bend: 0.08,
        }
    }
}

/// Parameters of the standing-tree and falling-piece cuts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CutConfig {
    /// Determinant magnitude below which two segments count as parallel.
    pub parallel_epsilon: f32,
    /// Remainders shorter than this are dropped instead of becoming slivers.
    pub min_remainder_length: f32,
    /// Max distance between a sub-segment's start and the cut sub-segment's
    /// end for the former to count as its child during a re-cut.
    pub adjacency_threshold: f32,
    /// Per-leaf probability that a transferred leaf flutters away.
    pub leaf_detach_chance: f32,
    /// Horizontal launch speed of a fresh piece (signed by the slash).
    pub launch_speed: Span,
    /// Vertical launch speed of a fresh piece (positive is up).
    pub launch_lift: Span,
    /// Launch spin of a fresh piece (signed by the slash).
    pub launch_spin: Span,
    /// Horizontal kick added to a piece split off a falling piece.
    pub recut_kick_speed: f32,
    /// Vertical kick added to a piece split off a falling piece.
    pub recut_kick_lift: f32,
    /// Spin kick added to a piece split off a falling piece.
    pub recut_kick_spin: f32,
}

impl Default for CutConfig {
    fn default() -> Self {
        Self {
            parallel_epsilon: 1e-4,
            min_remainder_length: 2.0,
            adjacency_threshold: 5.0,
            leaf_detach_chance: 0.04,
            launch_speed: Span::new(1.5, 3.0),
            launch_lift: Span::new(1.0, 3.0),
            launch_spin: Span::new(0.015, 0.045),
            recut_kick_speed: 2.0,
            recut_kick_lift: 2.0,
            recut_kick_spin: 0.05,
        }
    }
}

/// Parameters of the falling-piece rigid body approximation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsConfig {
    /// Vertical acceleration per tick; negative pulls down.
    pub gravity: f32,
    /// Spin multiplier applied every airborne tick.
    pub air_spin_damping: f32,
    /// Downward speed above which a landing bounces instead of resting.
    pub bounce_speed: f32,
    /// Fraction of vertical speed kept (and inverted) on a bounce.
    pub bounce_restitution: f32,
    /// Fraction of horizontal speed kept on a bounce.
    pub bounce_friction: f32,
    /// Fraction of spin kept on a bounce.
    pub bounce_spin_damping: f32,
    /// Corners within this height of the ground count as touching it.
    pub contact_tolerance: f32,
    /// Footprints narrower than this can never hold a piece up.
    pub min_support_span: f32,
    /// Spin multiplier per tick while a stable piece comes to rest.
    pub settle_spin_damping: f32,
    /// Horizontal speed multiplier per tick while a stable piece comes to rest.
    pub settle_speed_damping: f32,
    /// A stable piece settles once its spin drops below this...
    pub settle_spin_threshold: f32,
    /// ...and its horizontal speed below this.
    pub settle_speed_threshold: f32,
    /// Spin multiplier per tick while toppling.
    pub topple_spin_damping: f32,
    /// Horizontal speed multiplier per tick while toppling.
    pub topple_speed_damping: f32,
    /// Floor for the moment of inertia about the pivot corner.
    pub min_inertia: f32,
    /// A piece balanced on a base narrower than `min_support_span` settles
    /// after this many consecutive still ticks with its center of mass over
    /// the base.
    pub rest_ticks: u32,
    /// Ticks a piece may spend pivoting before it is settled where it lies.
    pub max_pivot_ticks: u32,
    /// Only sub-segments at least this deep are shed on impact.
    pub shed_min_depth: u32,
    /// Fewest sub-segments shed on impact.
    pub shed_min_count: u32,
    /// Most sub-segments shed on impact.
    pub shed_max_count: u32,
    /// Shed pieces get a horizontal speed in `-shed_speed/2..shed_speed/2`.
    pub shed_speed: f32,
    /// Upward speed of a shed piece.
    pub shed_lift: Span,
    /// Shed pieces get a spin in `-shed_spin/2..shed_spin/2`.
    pub shed_spin: f32,
    /// Pieces thinner than this never shake the camera.
    pub shake_min_thickness: f32,
    /// Cap on the shake amount of a bounce (`thickness / 6`).
    pub bounce_shake_cap: f32,
    /// Cap on the shake amount of the first resting contact (`thickness / 7`).
    pub landing_shake_cap: f32,
    /// Per-leaf probability that a riding leaf is shaken loose on impact.
    pub leaf_shed_chance: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: -0.4,
            air_spin_damping: 0.998,
            bounce_speed: 3.0,
            bounce_restitution: 0.25,
            bounce_friction: 0.6,
            bounce_spin_damping: 0.5,
            contact_tolerance: 5.0,
            min_support_span: 8.0,
            settle_spin_damping: 0.8,
            settle_speed_damping: 0.85,
            settle_spin_threshold: 0.001,
            settle_speed_threshold: 0.15,
            topple_spin_damping: 0.97,
            topple_speed_damping: 0.92,
            min_inertia: 500.0,
            rest_ticks: 20,
            max_pivot_ticks: 900,
            shed_min_depth: 3,
            shed_min_count: 2,
            shed_max_count: 4,
            shed_speed: 4.0,
            shed_lift: Span::new(3.0, 6.0),
            shed_spin: 0.15,
            shake_min_thickness: 8.0,
            bounce_shake_cap: 4.0,
            landing_shake_cap: 3.0,
            leaf_shed_chance: 0.06,
        }
    }
}

/// Timing of the staged fade-out of a settled piece (leaves before wood).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FadeConfig {
    /// Ticks on the ground before riding leaves start to fade.
    pub leaf_fade_delay: u32,
    pub leaf_fade_rate: f32,
    /// Ticks on the ground before the wood may fade (leaves must be gone too).
    pub wood_fade_delay: u32,
    pub wood_fade_rate: f32,
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            leaf_fade_delay: 30,
            leaf_fade_rate: 0.005,
            wood_fade_delay: 90,
            wood_fade_rate: 0.01,
        }
    }
}

/// Timing of the grow-in animation, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GrowthTimingConfig {
    pub base_duration_ms: f32,
    pub duration_variance_ms: f32,
    /// How long a leaf takes to pop in after its segment finishes.
    pub leaf_pop_ms: f32,
    /// Slack after the last leaf before the animation reports done.
    pub tail_ms: f32,
}

impl Default for GrowthTimingConfig {
    fn default() -> Self {
        Self {
            base_duration_ms: 350.0,
            duration_variance_ms: 350.0,
            leaf_pop_ms: 800.0,
            tail_ms: 200.0,
        }
    }
}

/// Global configuration for the whole simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Config {
    pub growth: GrowthConfig,
    pub cut: CutConfig,
    pub physics: PhysicsConfig,
    pub fade: FadeConfig,
    pub timing: GrowthTimingConfig,
}

fn finite(field: &'static str, value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFinite { field, value })
    }
}

fn within(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    let value = finite(field, value)?;
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    let value = finite(field, value)?;
    if value <= 0.0 {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min: f32::MIN_POSITIVE,
            max: f32::MAX,
        });
    }
    Ok(())
}

fn span(field: &'static str, s: Span) -> Result<(), ConfigError> {
    let lo = finite(field, s.min)?;
    let hi = finite(field, s.max)?;
    if lo > hi {
        return Err(ConfigError::EmptyRange { field, lo, hi });
    }
    Ok(())
}

impl Config {
    /// Checks that every field can drive a simulation.
    ///
    /// ### Returns
    /// - `Ok(())` if the configuration is usable.
    /// - `Err` naming the first offending field otherwise.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.growth;
        if g.max_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        positive("growth.base_thickness", g.base_thickness)?;
        positive("growth.base_length_ratio", g.base_length_ratio)?;
        positive("growth.max_base_length", g.max_base_length)?;
        within("growth.length_decay", g.length_decay, f32::MIN_POSITIVE, 1.0)?;
        within("growth.thickness_decay", g.thickness_decay, f32::MIN_POSITIVE, 1.0)?;
        within("growth.max_bend", g.max_bend, 0.0, std::f32::consts::PI)?;

        let c = &self.cut;
        positive("cut.parallel_epsilon", c.parallel_epsilon)?;
        within("cut.min_remainder_length", c.min_remainder_length, 0.0, f32::MAX)?;
        within("cut.adjacency_threshold", c.adjacency_threshold, 0.0, f32::MAX)?;
        within("cut.leaf_detach_chance", c.leaf_detach_chance, 0.0, 1.0)?;
        span("cut.launch_speed", c.launch_speed)?;
        span("cut.launch_lift", c.launch_lift)?;
        span("cut.launch_spin", c.launch_spin)?;
        finite("cut.recut_kick_speed", c.recut_kick_speed)?;
        finite("cut.recut_kick_lift", c.recut_kick_lift)?;
        finite("cut.recut_kick_spin", c.recut_kick_spin)?;

        let p = &self.physics;
        finite("physics.gravity", p.gravity)?;
        within("physics.air_spin_damping", p.air_spin_damping, 0.0, 1.0)?;
        within("physics.bounce_speed", p.bounce_speed, 0.0, f32::MAX)?;
        within("physics.bounce_restitution", p.bounce_restitution, 0.0, 1.0)?;
        within("physics.bounce_friction", p.bounce_friction, 0.0, 1.0)?;
        within("physics.bounce_spin_damping", p.bounce_spin_damping, 0.0, 1.0)?;
        within("physics.contact_tolerance", p.contact_tolerance, 0.0, f32::MAX)?;
        within("physics.min_support_span", p.min_support_span, 0.0, f32::MAX)?;
        within("physics.settle_spin_damping", p.settle_spin_damping, 0.0, 1.0)?;
        within("physics.settle_speed_damping", p.settle_speed_damping, 0.0, 1.0)?;
        positive("physics.settle_spin_threshold", p.settle_spin_threshold)?;
        positive("physics.settle_speed_threshold", p.settle_speed_threshold)?;
        within("physics.topple_spin_damping", p.topple_spin_damping, 0.0, 1.0)?;
        within("physics.topple_speed_damping", p.topple_speed_damping, 0.0, 1.0)?;
        positive("physics.min_inertia", p.min_inertia)?;
        if p.max_pivot_ticks == 0 {
            return Err(ConfigError::OutOfRange {
                field: "physics.max_pivot_ticks",
                value: 0.0,
                min: 1.0,
                max: u32::MAX as f32,
            });
        }
        if p.shed_min_count > p.shed_max_count {
            return Err(ConfigError::EmptyRange {
                field: "physics.shed_count",
                lo: p.shed_min_count as f32,
                hi: p.shed_max_count as f32,
            });
        }
        within("physics.shed_speed", p.shed_speed, 0.0, f32::MAX)?;
        span("physics.shed_lift", p.shed_lift)?;
        within("physics.shed_spin", p.shed_spin, 0.0, f32::MAX)?;
        finite("physics.shake_min_thickness", p.shake_min_thickness)?;
        within("physics.bounce_shake_cap", p.bounce_shake_cap, 0.0, f32::MAX)?;
        within("physics.landing_shake_cap", p.landing_shake_cap, 0.0, f32::MAX)?;
        within("physics.leaf_shed_chance", p.leaf_shed_chance, 0.0, 1.0)?;

        let f = &self.fade;
        within("fade.leaf_fade_rate", f.leaf_fade_rate, f32::MIN_POSITIVE, 1.0)?;
        within("fade.wood_fade_rate", f.wood_fade_rate, f32::MIN_POSITIVE, 1.0)?;

        let t = &self.timing;
        within("timing.base_duration_ms", t.base_duration_ms, 0.0, f32::MAX)?;
        within("timing.duration_variance_ms", t.duration_variance_ms, 0.0, f32::MAX)?;
        within("timing.leaf_pop_ms", t.leaf_pop_ms, 0.0, f32::MAX)?;
        within("timing.tail_ms", t.tail_ms, 0.0, f32::MAX)?;

        Ok(())
    }
}
