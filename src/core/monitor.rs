//! # MonitorTask: the polling loop of one entity.
//!
//! ## Flow
//! ```text
//! loop {
//!   ├─► cancelled or entity no longer registered ─► Cancelled
//!   ├─► interval = check_interval.sample()            (fresh every iteration)
//!   ├─► publish CheckStarting
//!   ├─► StatusClient::check_until(entity, max_retries, token)
//!   ├─► publish CheckCompleted(outcome)
//!   ├─► Active ─► recover() ─► Recovered
//!   └─► publish NextCheckScheduled, pause(interval)   (cancellable)
//! }
//!
//! recover():
//!   publish EntityRecovered
//!   sink.notify_recovered()   (errors and panics ─► NotificationFailed)
//!
//! On Recovered the task table deregisters the entity (see `handles`).
//! ```
//!
//! ## Rules
//! - No check outcome ends the loop except `Active`.
//! - Deregistration is never gated on notification success.
//! - A cancelled task never notifies.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::{CheckOutcome, ProfileAttributes, StatusClient};
use crate::core::pause;
use crate::entity::{Destination, EntityId};
use crate::error::panic_message;
use crate::events::{Bus, Event, EventKind};
use crate::notify::{NotificationSink, RecoveryEvent};
use crate::policies::JitterPolicy;
use crate::registry::EntityRegistry;

/// How a monitor task ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MonitorExit {
    /// Entity observed active and notified; the table deregisters it.
    Recovered,
    /// Stopped externally; no notification.
    Cancelled,
}

/// Collaborators shared by every monitor task of an engine.
#[derive(Clone)]
pub(crate) struct MonitorContext {
    pub client: Arc<StatusClient>,
    pub registry: Arc<dyn EntityRegistry>,
    pub sink: Arc<dyn NotificationSink>,
    pub bus: Bus,
    pub interval: JitterPolicy,
    pub max_retries: u32,
}

/// Polling loop for a single entity.
pub(crate) struct MonitorTask {
    entity: EntityId,
    destination: Destination,
    ctx: MonitorContext,
}

impl MonitorTask {
    pub(crate) fn new(entity: EntityId, destination: Destination, ctx: MonitorContext) -> Self {
        Self {
            entity,
            destination,
            ctx,
        }
    }

    pub(crate) fn entity(&self) -> &EntityId {
        &self.entity
    }

    /// Runs until recovery or cancellation.
    pub(crate) async fn run(self, token: CancellationToken) -> MonitorExit {
        let started = Instant::now();
        let mut checks: u32 = 0;

        let exit = loop {
            if token.is_cancelled() || !self.ctx.registry.contains(&self.entity) {
                break MonitorExit::Cancelled;
            }

            let interval = self.ctx.interval.sample();
            checks += 1;
            self.publish(Event::new(EventKind::CheckStarting).with_attempt(checks));

            let outcome = match self
                .ctx
                .client
                .check_until(&self.entity, self.ctx.max_retries, &token)
                .await
            {
                Ok(outcome) => outcome,
                Err(_cancelled) => break MonitorExit::Cancelled,
            };

            self.publish(
                Event::new(EventKind::CheckCompleted)
                    .with_attempt(checks)
                    .with_outcome(outcome.as_label()),
            );

            if let CheckOutcome::Active(attributes) = outcome {
                self.recover(attributes, started.elapsed(), checks).await;
                break MonitorExit::Recovered;
            }

            self.publish(
                Event::new(EventKind::NextCheckScheduled)
                    .with_attempt(checks)
                    .with_delay(interval),
            );
            if pause(interval, &token).await.is_err() {
                break MonitorExit::Cancelled;
            }
        };

        if exit == MonitorExit::Cancelled {
            debug!(entity = %self.entity, checks, "monitor task cancelled");
            self.publish(Event::new(EventKind::MonitorCancelled).with_attempt(checks));
        }
        exit
    }

    async fn recover(&self, attributes: ProfileAttributes, elapsed: Duration, checks: u32) {
        self.publish(Event::new(EventKind::EntityRecovered).with_attempt(checks));

        let event = RecoveryEvent {
            entity: self.entity.clone(),
            destination: self.destination.clone(),
            attributes,
            elapsed,
            checks,
        };

        let delivery = AssertUnwindSafe(self.ctx.sink.notify_recovered(&event))
            .catch_unwind()
            .await;
        match delivery {
            Ok(Ok(())) => {
                info!(entity = %self.entity, destination = %self.destination, "recovery notice delivered");
            }
            Ok(Err(e)) => {
                self.publish(Event::new(EventKind::NotificationFailed).with_reason(e.to_string()));
            }
            Err(panic) => {
                let reason = format!("sink panicked: {}", panic_message(panic.as_ref()));
                self.publish(Event::new(EventKind::NotificationFailed).with_reason(reason));
            }
        }
    }

    fn publish(&self, ev: Event) {
        self.ctx.bus.publish(ev.with_entity(self.entity.clone()));
    }
}
