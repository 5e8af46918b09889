//! Grow-in animation timing.
//!
//! Each segment starts growing the instant its parent finishes and takes a
//! random duration of its own, so delays compound toward the canopy. Leaves
//! pop in after their segment is fully grown. Time is measured in
//! milliseconds since the schedule started; the driver owns the clock.

use crate::{config::GrowthTimingConfig, segment::Segment, types::SegmentId};
use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Timing {
    start_ms: f32,
    end_ms: f32,
}

/// Per-segment start and end times of a tree's grow-in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GrowthSchedule {
    timings: Vec<Timing>,
    branches_end_ms: f32,
    total_ms: f32,
    leaf_pop_ms: f32,
}

impl GrowthSchedule {
    /// Assigns times to every segment.
    ///
    /// ### Parameters
    /// - `segments` - Arena in generation order; parents precede children.
    /// - `cfg` - Durations and tails.
    /// - `rng` - Drawn once per segment for its duration.
    pub fn new(segments: &[Segment], cfg: &GrowthTimingConfig, rng: &mut impl Rng) -> Self {
        let mut timings: Vec<Timing> = Vec::with_capacity(segments.len());

        for seg in segments {
            let start_ms = seg
                .parent
                .and_then(|p| timings.get(p))
                .map_or(0.0, |t| t.end_ms);
            let duration = cfg.base_duration_ms + rng.random::<f32>() * cfg.duration_variance_ms;
            timings.push(Timing {
                start_ms,
                end_ms: start_ms + duration,
            });
        }

        let branches_end_ms = timings.iter().map(|t| t.end_ms).fold(0.0, f32::max);
        Self {
            timings,
            branches_end_ms,
            total_ms: branches_end_ms + cfg.leaf_pop_ms + cfg.tail_ms,
            leaf_pop_ms: cfg.leaf_pop_ms,
        }
    }

    /// A schedule that reports everything fully grown.
    pub fn finished() -> Self {
        Self::default()
    }

    /// When the last segment finishes growing.
    pub fn branches_end_ms(&self) -> f32 {
        self.branches_end_ms
    }

    /// When the whole animation, leaves included, is over.
    pub fn total_ms(&self) -> f32 {
        self.total_ms
    }

    /// Fraction `0..=1` of segment `id` grown at `elapsed_ms`.
    /// Unknown segments count as fully grown.
    pub fn segment_growth(&self, id: SegmentId, elapsed_ms: f32) -> f32 {
        let Some(t) = self.timings.get(id) else {
            return 1.0;
        };
        if elapsed_ms < t.start_ms {
            0.0
        } else if elapsed_ms >= t.end_ms {
            1.0
        } else {
            (elapsed_ms - t.start_ms) / (t.end_ms - t.start_ms)
        }
    }

    /// Ease-out scale `0..=1` of the leaves on segment `id`.
    pub fn leaf_scale(&self, id: SegmentId, elapsed_ms: f32) -> f32 {
        let Some(t) = self.timings.get(id) else {
            return 1.0;
        };
        if elapsed_ms < t.end_ms {
            return 0.0;
        }
        let progress = if self.leaf_pop_ms > 0.0 {
            ((elapsed_ms - t.end_ms) / self.leaf_pop_ms).min(1.0)
        } else {
            1.0
        };
        1.0 - (1.0 - progress) * (1.0 - progress)
    }

    /// Swipes are ignored while this holds.
    pub fn is_growing_branches(&self, elapsed_ms: f32) -> bool {
        elapsed_ms < self.branches_end_ms
    }

    pub fn is_animating(&self, elapsed_ms: f32) -> bool {
        elapsed_ms < self.total_ms
    }
}
