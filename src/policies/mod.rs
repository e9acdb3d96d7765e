//! Retry and scheduling policies.
//!
//! This module groups the knobs that control **how long** a monitor waits:
//!
//! ## Contents
//! - [`BackoffPolicy`] delay before each retry of a failed check (base / factor / cap + jitter)
//! - [`JitterPolicy`]  randomization window (pre-request jitter, backoff jitter, check interval)
//!
//! ## Quick wiring
//! ```text
//! EngineConfig
//!      ├─► backoff_policy()  ─► StatusClient: sleep backoff.delay(n) before retry n
//!      ├─► request_jitter()  ─► StatusClient: sleep sample() before every request
//!      └─► check_interval()  ─► MonitorTask: sleep sample() between checks
//! ```
//!
//! ## Defaults
//! - `BackoffPolicy::default()` → base=30s, factor=2.0, cap=300s, jitter=Uniform(10s, 30s).
//! - `JitterPolicy::None` by default.

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
