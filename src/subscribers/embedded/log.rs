//! # LogWriter: engine events as `tracing` records.
//!
//! Maps each [`Event`] onto one `tracing` record with structured fields.
//! Installing a `tracing` subscriber (e.g. `tracing-subscriber`) is up to the
//! host binary.
//!
//! ## Levels
//! - `error`: grace exceeded, subscriber panicked, notification failed
//! - `warn`: rate-limit/auth rotation, retries, subscriber overflow
//! - `info`: lifecycle (start, stop, recovery, shutdown)
//! - `debug`: per-check chatter
//!
//! ## Example output
//! ```text
//! INFO  monitor started entity="foo"
//! DEBUG check starting entity="foo" check=1
//! WARN  credential rotated entity="foo" reason="rate_limited"
//! WARN  retry scheduled entity="foo" retry=1 delay_ms=84211 reason=None
//! DEBUG check completed entity="foo" check=1 outcome="suspended"
//! INFO  entity recovered entity="foo" checks=7
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Subscriber that writes every event through `tracing`.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let entity = e.entity_str();
        let reason = e.reason.as_deref();
        match e.kind {
            EventKind::SubscriberPanicked => {
                error!(reason, "subscriber panicked");
            }
            EventKind::SubscriberOverflow => {
                warn!(reason, "subscriber dropped an event");
            }
            EventKind::ShutdownRequested => {
                info!("shutdown requested");
            }
            EventKind::StopAllRequested => {
                info!(reason, "stopping all monitors");
            }
            EventKind::AllStoppedWithin => {
                info!("all monitors stopped within grace");
            }
            EventKind::GraceExceeded => {
                error!(stuck = reason, "grace exceeded, stuck monitors aborted");
            }
            EventKind::MonitorStarted => {
                info!(entity, "monitor started");
            }
            EventKind::DuplicateIgnored => {
                info!(entity, "already monitoring");
            }
            EventKind::MonitorCancelled => {
                info!(entity, checks = e.attempt, "monitor cancelled");
            }
            EventKind::MonitorRemoved => {
                debug!(entity, reason, "monitor removed");
            }
            EventKind::CheckStarting => {
                debug!(entity, check = e.attempt, "check starting");
            }
            EventKind::CheckCompleted => {
                debug!(entity, check = e.attempt, outcome = e.outcome, "check completed");
            }
            EventKind::RetryScheduled => {
                warn!(
                    entity,
                    retry = e.attempt,
                    delay_ms = e.delay_ms,
                    reason,
                    "retry scheduled"
                );
            }
            EventKind::CredentialRotated => {
                warn!(entity, reason, "credential rotated");
            }
            EventKind::NextCheckScheduled => {
                debug!(entity, delay_ms = e.delay_ms, "next check scheduled");
            }
            EventKind::EntityRecovered => {
                info!(entity, checks = e.attempt, "entity recovered");
            }
            EventKind::NotificationFailed => {
                error!(entity, reason, "recovery notification failed");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
