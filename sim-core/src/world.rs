//! The simulation facade a frontend drives.

use crate::{
    config::Config,
    error::ConfigError,
    events::{CutEvent, TickEvents},
    generator::TreeGenerator,
    geometry::Swipe,
    growth::GrowthSchedule,
    leaf::{Leaf, WorldLeaf},
    phases::{physics_phase, swipe_phase},
    piece_set::PieceSet,
    random::SeededRandom,
    segment::Segment,
    tree::Tree,
    types::SegmentId,
};
use glam::Vec2;
use rand::{SeedableRng, rngs::StdRng};
use std::collections::BTreeSet;

/// One tree, its leaves and everything cut off it.
///
/// Generation is reproducible from `seed` alone. Cut physics draws from a
/// separate [`StdRng`] so that slashing never perturbs the tree stream.
#[derive(Debug)]
pub struct World {
    config: Config,
    generator: TreeGenerator,
    random: SeededRandom,
    rng: StdRng,
    tree: Tree,
    leaves: Vec<Leaf>,
    pieces: PieceSet,
    schedule: GrowthSchedule,
    root: Vec2,
    canvas_height: f32,
}

impl World {
    /// Validates `config` and grows the first tree.
    ///
    /// ### Parameters
    /// - `seed` - Seed of the tree stream.
    /// - `root` - World position of the trunk's base.
    /// - `canvas_height` - Visible height; scales the trunk.
    ///
    /// ### Returns
    /// The world, or the first invalid configuration field.
    pub fn new(
        config: Config,
        seed: f64,
        root: Vec2,
        canvas_height: f32,
    ) -> Result<Self, ConfigError> {
        Self::build(config, seed, root, canvas_height, StdRng::from_os_rng())
    }

    /// Like [`World::new`] but with a seeded physics stream, so cuts and
    /// impacts are reproducible too.
    pub fn with_rng_seed(
        config: Config,
        seed: f64,
        root: Vec2,
        canvas_height: f32,
        rng_seed: u64,
    ) -> Result<Self, ConfigError> {
        Self::build(
            config,
            seed,
            root,
            canvas_height,
            StdRng::seed_from_u64(rng_seed),
        )
    }

    fn build(
        config: Config,
        seed: f64,
        root: Vec2,
        canvas_height: f32,
        rng: StdRng,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut world = Self {
            config,
            generator: TreeGenerator::new(config.growth),
            random: SeededRandom::new(seed),
            rng,
            tree: Tree::default(),
            leaves: Vec::new(),
            pieces: PieceSet::new(),
            schedule: GrowthSchedule::finished(),
            root,
            canvas_height,
        };
        world.generate(seed, root, canvas_height);
        Ok(world)
    }

    /// Regenerates the tree, dropping every piece, leaf and cut.
    ///
    /// ### Returns
    /// The new segment arena.
    pub fn generate(&mut self, seed: f64, root: Vec2, canvas_height: f32) -> &[Segment] {
        self.random.set_seed(seed);
        self.root = root;
        self.canvas_height = canvas_height;

        let segments = self
            .generator
            .generate(&mut self.random, root, canvas_height);
        self.schedule = GrowthSchedule::new(&segments, &self.config.timing, &mut self.rng);
        self.tree.replace(segments);
        self.leaves.clear();
        self.pieces.clear();

        &self.tree.segments
    }

    /// Grows a fresh tree from `seed` at the current root and canvas height.
    pub fn reset(&mut self, seed: f64) {
        log::info!("resetting world with seed {seed}");
        self.generate(seed, self.root, self.canvas_height);
    }

    /// Applies one motion step of a swipe from `start` to `end`.
    ///
    /// The standing tree takes priority; falling pieces are only searched
    /// when the step misses the tree.
    pub fn on_swipe_segment(&mut self, start: Vec2, end: Vec2) -> Option<CutEvent> {
        swipe_phase(
            &Swipe::new(start, end),
            &mut self.tree,
            &mut self.leaves,
            &mut self.pieces,
            &self.config,
            &mut self.rng,
        )
    }

    /// Advances all falling pieces by one tick.
    pub fn tick(&mut self, ground_y: f32) -> TickEvents {
        physics_phase(&mut self.pieces, ground_y, &self.config, &mut self.rng)
    }

    /// Installs the leaf pool placed by the leaf generator.
    pub fn set_leaves(&mut self, leaves: Vec<Leaf>) {
        self.leaves = leaves;
    }

    /// Replaces the configuration. Takes effect for later cuts and ticks;
    /// growth parameters apply from the next [`World::generate`].
    pub fn set_config(&mut self, config: Config) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        self.generator = TreeGenerator::new(config.growth);
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn segments(&self) -> &[Segment] {
        &self.tree.segments
    }

    pub fn cut_branches(&self) -> &BTreeSet<SegmentId> {
        self.tree.cut_branches()
    }

    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    pub fn pieces(&self) -> &PieceSet {
        &self.pieces
    }

    pub fn schedule(&self) -> &GrowthSchedule {
        &self.schedule
    }

    /// Seed of the current tree.
    pub fn seed(&self) -> f64 {
        self.random.seed()
    }

    pub fn root(&self) -> Vec2 {
        self.root
    }

    pub fn canvas_height(&self) -> f32 {
        self.canvas_height
    }

    /// Leaves riding every falling piece, in world space.
    pub fn riding_leaves(&self) -> Vec<WorldLeaf> {
        self.pieces.iter().flat_map(|p| p.world_leaves()).collect()
    }
}
