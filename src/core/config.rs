//! # Engine configuration.
//!
//! Provides [`EngineConfig`], the centralized settings of the monitoring
//! engine: polling interval window, retry budget, request jitter, backoff,
//! request timeout, shutdown grace and event bus capacity.
//!
//! All durations are (de)serialized as whole seconds, and every field has a
//! default, so a partial JSON document is a valid configuration:
//!
//! ```
//! use std::time::Duration;
//! use recoverwatch::EngineConfig;
//!
//! let cfg: EngineConfig = serde_json::from_str(r#"{ "max_retries": 5, "grace": 10 }"#).unwrap();
//! assert_eq!(cfg.max_retries, 5);
//! assert_eq!(cfg.grace, Duration::from_secs(10));
//! assert_eq!(cfg.min_check_interval, Duration::from_secs(300));
//! cfg.validate().unwrap();
//! ```
//!
//! ## Sentinel values
//! - `request_timeout = 0s` → no engine-side timeout (transport decides)
//! - `grace = 0s` → stragglers are aborted right after cancellation

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::policies::{BackoffPolicy, JitterPolicy};

/// Configuration of the monitoring engine.
///
/// ## Field semantics
/// - `min_check_interval` / `max_check_interval`: inclusive window of the
///   inter-check sleep, re-sampled on every iteration
/// - `max_retries`: retry budget of one logical check
/// - `request_jitter_min` / `request_jitter_max`: random delay before every request
/// - `backoff_*`: retry schedule `min(cap, base * factor^n + U(jitter_min, jitter_max))`
/// - `request_timeout`: timeout around every transport call (`0s` = none)
/// - `grace`: how long stop operations wait for cancelled tasks
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `generate_attachments`: whether recovery notices try a rendered attachment
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    #[serde(with = "secs")]
    pub min_check_interval: Duration,
    #[serde(with = "secs")]
    pub max_check_interval: Duration,
    pub max_retries: u32,
    #[serde(with = "secs")]
    pub request_jitter_min: Duration,
    #[serde(with = "secs")]
    pub request_jitter_max: Duration,
    #[serde(with = "secs")]
    pub backoff_base: Duration,
    pub backoff_factor: f64,
    #[serde(with = "secs")]
    pub backoff_cap: Duration,
    #[serde(with = "secs")]
    pub backoff_jitter_min: Duration,
    #[serde(with = "secs")]
    pub backoff_jitter_max: Duration,
    #[serde(with = "secs")]
    pub request_timeout: Duration,
    #[serde(with = "secs")]
    pub grace: Duration,
    pub bus_capacity: usize,
    pub generate_attachments: bool,
}

impl EngineConfig {
    /// Inter-check sleep window.
    #[inline]
    pub fn check_interval(&self) -> JitterPolicy {
        JitterPolicy::uniform(self.min_check_interval, self.max_check_interval)
    }

    /// Pre-request jitter window.
    #[inline]
    pub fn request_jitter(&self) -> JitterPolicy {
        JitterPolicy::uniform(self.request_jitter_min, self.request_jitter_max)
    }

    /// Retry backoff assembled from the `backoff_*` fields.
    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            base: self.backoff_base,
            factor: self.backoff_factor,
            cap: self.backoff_cap,
            jitter: JitterPolicy::uniform(self.backoff_jitter_min, self.backoff_jitter_max),
        }
    }

    /// Request timeout as an `Option` (`None` when zero).
    #[inline]
    pub fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout.is_zero() {
            None
        } else {
            Some(self.request_timeout)
        }
    }

    /// Bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Checks value ranges.
    ///
    /// Rejects inverted windows, a zero or sub-unit backoff, a zero backoff
    /// cap and a zero bus capacity.
    pub fn validate(&self) -> Result<(), EngineError> {
        let invalid = |reason: &str| {
            Err(EngineError::InvalidConfig {
                reason: reason.to_string(),
            })
        };

        if self.min_check_interval > self.max_check_interval {
            return invalid("min_check_interval is greater than max_check_interval");
        }
        if self.request_jitter_min > self.request_jitter_max {
            return invalid("request_jitter_min is greater than request_jitter_max");
        }
        if self.backoff_jitter_min > self.backoff_jitter_max {
            return invalid("backoff_jitter_min is greater than backoff_jitter_max");
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            return invalid("backoff_factor must be a finite number >= 1");
        }
        if self.backoff_cap.is_zero() {
            return invalid("backoff_cap must be positive");
        }
        if self.bus_capacity == 0 {
            return invalid("bus_capacity must be positive");
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    /// Default configuration:
    ///
    /// - checks every 300-600s
    /// - 3 retries, 2-5s request jitter
    /// - backoff 30s * 2^n + U(10s, 30s), capped at 300s
    /// - 30s request timeout, 5s grace
    /// - `bus_capacity = 1024`, attachments enabled
    fn default() -> Self {
        let backoff = BackoffPolicy::default();
        Self {
            min_check_interval: Duration::from_secs(300),
            max_check_interval: Duration::from_secs(600),
            max_retries: crate::client::DEFAULT_MAX_RETRIES,
            request_jitter_min: Duration::from_secs(2),
            request_jitter_max: Duration::from_secs(5),
            backoff_base: backoff.base,
            backoff_factor: backoff.factor,
            backoff_cap: backoff.cap,
            backoff_jitter_min: backoff.jitter.lower_bound(),
            backoff_jitter_max: backoff.jitter.upper_bound(),
            request_timeout: Duration::from_secs(30),
            grace: Duration::from_secs(5),
            bus_capacity: 1024,
            generate_attachments: true,
        }
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}
