//! Core 2-D procedural tree growth and slicing simulation library.
//!
//! Main components:
//! - [`world`] - the facade a frontend drives: generate, swipe, tick, reset.
//! - [`generator`] - seeded recursive construction of the branch hierarchy.
//! - [`tree`] - the standing segment arena and its cut set.
//! - [`detector`] - swipe-vs-segment intersection with the cut rules.
//! - [`executor`] - truncating segments and packaging falling pieces.
//! - [`piece`] - falling-piece rigid bodies and their phase machine.
//! - [`piece_set`] - the ordered collection of live pieces.
//! - [`physics`] - corners, footprints, mass and inertia helpers.
//! - [`phases`] - the per-swipe and per-tick pipelines.
//! - [`growth`] - grow-in animation timing.
//! - [`leaf`] - leaf records exchanged with the leaf collaborators.
//! - [`events`] - cut and tick reports for effect layers.
//! - [`geometry`] - segment intersection and frame transforms.
//! - [`segment`] - tapered segments and the [`segment::Cuttable`] view.
//! - [`random`] - the reproducible stream behind generation.
//! - [`config`] - every tunable constant.
//! - [`error`] - configuration errors.
//! - [`types`] - shared type aliases and IDs.

pub mod config;
pub mod detector;
pub mod error;
pub mod events;
pub mod executor;
pub mod generator;
pub mod geometry;
pub mod growth;
pub mod leaf;
pub mod phases;
pub mod physics;
pub mod piece;
pub mod piece_set;
pub mod random;
pub mod segment;
pub mod tree;
pub mod types;
pub mod world;

pub use config::Config;
pub use error::ConfigError;
pub use world::World;
