//! Error types for the simulation core.
//!
//! The simulation itself never fails: degenerate geometry is treated as
//! "no effect" and arena-index violations are bugs that panic. The only
//! recoverable error is a configuration that cannot drive a simulation.

/// Errors reported by [`crate::config::Config::validate`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A numeric field is NaN or infinite.
    #[error("config field `{field}` must be finite, got {value}")]
    NonFinite { field: &'static str, value: f32 },

    /// A numeric field lies outside the range it is allowed to take.
    #[error("config field `{field}` = {value} is outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    /// A `lo..hi` range field has `lo > hi`.
    #[error("config range `{field}` is empty ({lo} > {hi})")]
    EmptyRange { field: &'static str, lo: f32, hi: f32 },

    /// `max_depth` is zero, so the generator would produce no segments.
    #[error("growth.max_depth must be at least 1")]
    ZeroDepth,
}
