//! # Runtime events emitted by the monitoring engine.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Monitor lifecycle**: a task for an entity starts, is cancelled, is removed
//! - **Checks**: status checks, retries, credential rotations, next-check scheduling
//! - **Recovery**: the entity came back, notification delivery failed
//! - **Runtime**: stop-all, shutdown, subscriber health
//!
//! The [`Event`] struct carries metadata such as timestamps, entity id,
//! attempt counters, delays and outcome labels.
//!
//! ## Ordering
//! `seq` is taken from a process-wide counter when the event is built, so
//! consumers can drop anything older than what they already applied.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use recoverwatch::{EntityId, Event, EventKind};
//!
//! let ev = Event::new(EventKind::RetryScheduled)
//!     .with_entity(EntityId::parse("foo").unwrap())
//!     .with_attempt(2)
//!     .with_delay(Duration::from_secs(130))
//!     .with_reason("rate_limited");
//!
//! assert_eq!(ev.kind, EventKind::RetryScheduled);
//! assert_eq!(ev.delay_ms, Some(130_000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::entity::EntityId;

/// Next value of [`Event::seq`].
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // subscribers
    /// A subscriber's `on_event` panicked.
    ///
    /// Sets: `reason` (`subscriber=<name> info=<panic>`).
    SubscriberPanicked,

    /// An event could not be queued for a subscriber.
    ///
    /// Sets: `reason` (`subscriber=<name> reason=<full|closed>`).
    SubscriberOverflow,

    // runtime
    /// OS termination signal observed.
    ShutdownRequested,

    /// `stop_all_monitoring` was invoked.
    ///
    /// Sets: `reason` (`clear_registry=<bool>`).
    StopAllRequested,

    /// All cancelled tasks exited within the grace period.
    AllStoppedWithin,

    /// Grace period exceeded; stuck tasks were aborted.
    ///
    /// Sets: `reason` (stuck entity ids).
    GraceExceeded,

    // === Monitor lifecycle ===
    /// A polling task was spawned for an entity.
    MonitorStarted,

    /// `start_monitoring` for an entity that already has a running task.
    DuplicateIgnored,

    /// A task exited without notification (explicit stop or deregistration).
    ///
    /// Sets: `entity`, `attempt` (checks performed).
    MonitorCancelled,

    /// A task handle was removed from the task table.
    ///
    /// Sets: `entity`, optional `reason` (`task_panicked`, `aborted`).
    MonitorRemoved,

    // === Checks ===
    /// A status check is about to start.
    ///
    /// Sets: `entity`, `attempt` (check number, 1-based per task).
    CheckStarting,

    /// A status check finished (after internal retries).
    ///
    /// Sets: `entity`, `attempt`, `outcome`.
    CheckCompleted,

    /// A retry of a failed request was scheduled.
    ///
    /// Sets: `entity`, `attempt` (retry number, 1-based), `delay_ms`, `reason` (outcome label).
    RetryScheduled,

    /// The shared credential pool was rotated.
    ///
    /// Sets: `entity`, `reason` (outcome label that tainted the credential).
    CredentialRotated,

    /// Next check scheduled after a non-active outcome.
    ///
    /// Sets: `entity`, `attempt`, `delay_ms`.
    NextCheckScheduled,

    // === Recovery ===
    /// The entity was observed active; notification follows.
    ///
    /// Sets: `entity`, `attempt`.
    EntityRecovered,

    /// The notification sink failed or panicked. Deregistration still happens.
    ///
    /// Sets: `entity`, `reason`.
    NotificationFailed,
}

/// One engine event. Which optional fields are filled depends on `kind`.
#[derive(Clone, Debug)]
pub struct Event {
    /// Process-wide ordering key.
    pub seq: u64,
    /// When the event was built.
    pub at: SystemTime,
    /// Kind.
    pub kind: EventKind,
    /// Entity the event refers to, if any.
    pub entity: Option<EntityId>,
    /// Check number or retry number (starting from 1).
    pub attempt: Option<u32>,
    /// Delay before the next action in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Outcome label of a completed check.
    pub outcome: Option<&'static str>,
    /// Free-form detail: error text, outcome label, subscriber name.
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Stamps `kind` with the current time and the next `seq`.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            entity: None,
            attempt: None,
            delay_ms: None,
            outcome: None,
            reason: None,
        }
    }

    /// Attaches the entity id.
    #[inline]
    pub fn with_entity(mut self, entity: EntityId) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Attaches an attempt/check counter.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches an outcome label.
    #[inline]
    pub fn with_outcome(mut self, label: &'static str) -> Self {
        self.outcome = Some(label);
        self
    }

    /// Sets `reason`.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// `SubscriberOverflow` for `subscriber`.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// `SubscriberPanicked` for `subscriber`.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }

    /// Entity id as `&str`, or `"-"` for runtime-wide events.
    pub fn entity_str(&self) -> &str {
        self.entity.as_ref().map_or("-", EntityId::as_str)
    }
}
