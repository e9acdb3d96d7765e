//! # Jitter policy for randomized delays.
//!
//! [`JitterPolicy`] adds a bounded random component to delays so that many
//! polling tasks never settle into a synchronized, detectable pattern.
//!
//! - [`JitterPolicy::None`]: no randomization, predictable delays
//! - [`JitterPolicy::Uniform`]: a duration drawn uniformly from `[min, max]`
//!
//! The same type drives three different windows in the engine: the pre-request
//! jitter, the additive part of retry backoff, and the per-iteration check
//! interval.

use rand::Rng;
use std::time::Duration;

/// Policy controlling randomization of delays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum JitterPolicy {
    /// No jitter: sampling always yields zero.
    ///
    /// Use when:
    /// - Predictable timing required
    /// - Testing/debugging
    #[default]
    None,

    /// Uniform jitter: a duration in `[min, max]` (inclusive, millisecond resolution).
    ///
    /// If `min > max` the bounds are swapped.
    Uniform {
        /// Lower bound of the window.
        min: Duration,
        /// Upper bound of the window.
        max: Duration,
    },
}

impl JitterPolicy {
    /// Creates a uniform window `[min, max]`.
    pub fn uniform(min: Duration, max: Duration) -> Self {
        JitterPolicy::Uniform { min, max }
    }

    /// Draws a random duration from the window.
    pub fn sample(&self) -> Duration {
        match *self {
            JitterPolicy::None => Duration::ZERO,
            JitterPolicy::Uniform { min, max } => {
                let (lo, hi) = ordered_ms(min, max);
                if lo == hi {
                    return Duration::from_millis(lo);
                }
                let mut rng = rand::rng();
                Duration::from_millis(rng.random_range(lo..=hi))
            }
        }
    }

    /// Adds a sampled jitter to `delay` (saturating).
    pub fn apply(&self, delay: Duration) -> Duration {
        delay.saturating_add(self.sample())
    }

    /// Smallest value [`sample`](Self::sample) can return.
    pub fn lower_bound(&self) -> Duration {
        match *self {
            JitterPolicy::None => Duration::ZERO,
            JitterPolicy::Uniform { min, max } => Duration::from_millis(ordered_ms(min, max).0),
        }
    }

    /// Largest value [`sample`](Self::sample) can return.
    pub fn upper_bound(&self) -> Duration {
        match *self {
            JitterPolicy::None => Duration::ZERO,
            JitterPolicy::Uniform { min, max } => Duration::from_millis(ordered_ms(min, max).1),
        }
    }
}

fn ordered_ms(a: Duration, b: Duration) -> (u64, u64) {
    let a = a.as_millis().min(u128::from(u64::MAX)) as u64;
    let b = b.as_millis().min(u128::from(u64::MAX)) as u64;
    if a <= b { (a, b) } else { (b, a) }
}
