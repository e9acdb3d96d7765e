//! # Backoff policy for retrying status checks.
//!
//! [`BackoffPolicy`] controls how long a status check waits before retry `n`
//! (1-indexed). It is parameterized by:
//! - [`BackoffPolicy::base`] the delay unit;
//! - [`BackoffPolicy::factor`] multiplies the delay per retry;
//! - [`BackoffPolicy::cap`] the maximum delay;
//! - [`BackoffPolicy::jitter`] an additive random component.
//!
//! The delay for retry `n` is `min(cap, base × factor^n + jitter)`. The base part
//! is derived purely from `n`, so jitter never feeds back into later delays.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use recoverwatch::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     base: Duration::from_secs(30),
//!     factor: 2.0,
//!     cap: Duration::from_secs(300),
//!     jitter: JitterPolicy::None,
//! };
//!
//! // Retry 1: 30s × 2^1 = 60s
//! assert_eq!(backoff.delay(1), Duration::from_secs(60));
//!
//! // Retry 4: 30s × 2^4 = 480s → capped at 300s
//! assert_eq!(backoff.delay(4), Duration::from_secs(300));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Delay schedule between retries of one check.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay unit multiplied by `factor^n`.
    pub base: Duration,
    /// Multiplicative growth factor (`>= 1.0` keeps delays non-decreasing).
    pub factor: f64,
    /// Maximum delay, applied after jitter.
    pub cap: Duration,
    /// Additive jitter.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Defaults used between status-request retries:
    /// - `base = 30s`, `factor = 2.0`;
    /// - `cap = 300s`;
    /// - `jitter = Uniform(10s, 30s)`.
    fn default() -> Self {
        Self {
            base: Duration::from_secs(30),
            factor: 2.0,
            cap: Duration::from_secs(300),
            jitter: JitterPolicy::uniform(Duration::from_secs(10), Duration::from_secs(30)),
        }
    }
}

impl BackoffPolicy {
    /// Deterministic part of the delay before retry `retry`: `base × factor^retry`,
    /// clamped to [`cap`](Self::cap).
    pub fn base_delay(&self, retry: u32) -> Duration {
        let cap_secs = self.cap.as_secs_f64();
        let exp = retry.min(i32::MAX as u32) as i32;
        let secs = self.base.as_secs_f64() * self.factor.powi(exp);

        if !secs.is_finite() || secs < 0.0 || secs > cap_secs {
            self.cap
        } else {
            Duration::from_secs_f64(secs)
        }
    }

    /// Computes the delay before retry `retry` (1-indexed).
    ///
    /// Jitter is added to the base and the sum is clamped to [`cap`](Self::cap).
    pub fn delay(&self, retry: u32) -> Duration {
        self.jitter.apply(self.base_delay(retry)).min(self.cap)
    }
}
