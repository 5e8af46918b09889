//! Deterministic random stream used by the tree generator.
//!
//! This is a plain linear congruential generator:
//!
//! ```text
//! state = (state * 9301 + 49297) mod 233280
//! value = state / 233280
//! ```
//!
//! It is deliberately *not* a `rand` generator. Seeded trees are part of
//! the observable behavior, so the exact stream (and the order in which the
//! generator consumes it) is a contract. Everything that does not need to
//! be reproducible uses `rand` instead.

const MULTIPLIER: f64 = 9301.0;
const INCREMENT: f64 = 49297.0;
const MODULUS: f64 = 233280.0;

/// A reseedable linear congruential stream.
///
/// The state is kept in `f64` so that integer seeds are stepped exactly.
#[derive(Clone, Debug, PartialEq)]
pub struct SeededRandom {
    initial_seed: f64,
    state: f64,
}

impl SeededRandom {
    pub fn new(seed: f64) -> Self {
        Self {
            initial_seed: seed,
            state: seed,
        }
    }

    /// Seed this stream was created or last reseeded with.
    pub fn seed(&self) -> f64 {
        self.initial_seed
    }

    /// Rewinds the stream to its initial seed.
    pub fn reset(&mut self) {
        self.state = self.initial_seed;
    }

    /// Replaces the seed and rewinds to it.
    pub fn set_seed(&mut self, seed: f64) {
        self.initial_seed = seed;
        self.state = seed;
    }

    /// Advances the stream and returns a value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.state = (self.state * MULTIPLIER + INCREMENT) % MODULUS;
        self.state / MODULUS
    }

    /// Same as [`SeededRandom::next_f64`], narrowed to `f32`.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.next_f64() as f32
    }

    /// Uniform value in `[min, max)`.
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        (min as f64 + self.next_f64() * (max as f64 - min as f64)) as f32
    }

    /// Uniform integer in `[min, max]`.
    pub fn int(&mut self, min: i32, max: i32) -> i32 {
        (min as f64 + self.next_f64() * (max as f64 + 1.0 - min as f64)).floor() as i32
    }

    /// `true` with the given probability.
    pub fn chance(&mut self, probability: f32) -> bool {
        self.next_f64() < probability as f64
    }

    /// Picks a uniformly random element, or `None` for an empty slice.
    ///
    /// A draw is consumed even when the slice is empty.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        let r = self.next_f64();
        items.get((r * items.len() as f64).floor() as usize)
    }

    /// Picks an element with probability proportional to its weight.
    ///
    /// Non-positive weights are never picked. Returns `None` when no
    /// element has a positive weight. Exactly one draw is consumed.
    pub fn weighted_pick<'a, T>(&mut self, items: &'a [(T, f32)]) -> Option<&'a T> {
        let r = self.next_f64();
        let total: f64 = items.iter().map(|(_, w)| (*w).max(0.0) as f64).sum();
        if total <= 0.0 {
            return None;
        }

        let mut target = r * total;
        let mut last = None;
        for (item, w) in items {
            let w = (*w).max(0.0) as f64;
            if w <= 0.0 {
                continue;
            }
            if target < w {
                return Some(item);
            }
            target -= w;
            last = Some(item);
        }

        // Float slop at the very top of the range lands on the last candidate.
        last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_values_match_the_lcg_recurrence() {
        let mut rng = SeededRandom::new(42.0);

        // 42 * 9301 + 49297 = 439939; 439939 mod 233280 = 206659
        assert_eq!(rng.next_f64(), 206659.0 / 233280.0);
        // 206659 * 9301 + 49297 = 1922184656; mod 233280 = 190736
        assert_eq!(rng.next_f64(), 190736.0 / 233280.0);
    }

    #[test]
    fn same_seed_gives_same_stream() {
        let mut a = SeededRandom::new(1234.0);
        let mut b = SeededRandom::new(1234.0);
        for _ in 0..500 {
            assert_eq!(a.next_f64(), b.next_f64());
        }
    }

    #[test]
    fn reset_rewinds_and_set_seed_replaces() {
        let mut rng = SeededRandom::new(7.0);
        let first: Vec<f64> = (0..5).map(|_| rng.next_f64()).collect();

        rng.reset();
        let again: Vec<f64> = (0..5).map(|_| rng.next_f64()).collect();
        assert_eq!(first, again);

        rng.set_seed(8.0);
        assert_eq!(rng.seed(), 8.0);
        let other: Vec<f64> = (0..5).map(|_| rng.next_f64()).collect();
        assert_ne!(first, other);
    }

    #[test]
    fn values_stay_in_unit_interval() {
        let mut rng = SeededRandom::new(99.0);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn range_and_int_respect_bounds() {
        let mut rng = SeededRandom::new(5.0);
        for _ in 0..1000 {
            let r = rng.range(-0.2, 0.2);
            assert!((-0.2..=0.2).contains(&r));

            let i = rng.int(2, 4);
            assert!((2..=4).contains(&i));
        }
    }

    #[test]
    fn chance_extremes() {
        let mut rng = SeededRandom::new(11.0);
        for _ in 0..100 {
            assert!(!rng.chance(0.0));
            assert!(rng.chance(1.0));
        }
    }

    #[test]
    fn pick_handles_empty_and_non_empty() {
        let mut rng = SeededRandom::new(3.0);
        let empty: [u8; 0] = [];
        assert_eq!(rng.pick(&empty), None);

        let items = [10, 20, 30];
        for _ in 0..100 {
            let v = rng.pick(&items).copied();
            assert!(matches!(v, Some(10 | 20 | 30)));
        }
    }

    #[test]
    fn weighted_pick_never_picks_zero_weight() {
        let mut rng = SeededRandom::new(17.0);
        let items = [("never", 0.0), ("always", 2.0), ("negative", -1.0)];
        for _ in 0..200 {
            assert_eq!(rng.weighted_pick(&items), Some(&"always"));
        }

        let none = [("a", 0.0)];
        assert_eq!(rng.weighted_pick(&none), None);
    }
}
