//! # StatusClient: one logical status check with retries.
//!
//! Performs a status check for one entity, applying the whole retry policy
//! internally, and returns a single [`CheckOutcome`].
//!
//! ## Flow
//! ```text
//! retry = 0
//! loop {
//!   ├─► retry > 0 ? publish RetryScheduled, sleep backoff.delay(retry)   (cancellable)
//!   ├─► sleep request_jitter.sample()                                  (cancellable)
//!   ├─► credential = pool.current()
//!   ├─► transport.issue_status_request() under request_timeout         (cancellable)
//!   ├─► classify(response)
//!   ├─► RateLimited / AuthError ─► pool.rotate(), publish CredentialRotated
//!   ├─► not retryable or retry == max_retries ─► return outcome
//!   └─► retry += 1
//! }
//! ```
//!
//! ## Rules
//! - Requests for one entity are strictly sequential.
//! - Every tainted outcome rotates the shared pool exactly once, including the
//!   last one when retries are exhausted, so the next scheduled check starts
//!   on a fresh credential.
//! - Timeouts and other transient errors never rotate.
//! - A panicking transport is folded into `TransientError` like any other
//!   unexpected failure.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::client::outcome::{CheckOutcome, TransientKind, classify};
use crate::client::transport::Transport;
use crate::core::pause;
use crate::credentials::CredentialPool;
use crate::entity::EntityId;
use crate::error::{Cancelled, TransportError, panic_message};
use crate::events::{Bus, Event, EventKind};
use crate::policies::{BackoffPolicy, JitterPolicy};

/// Default bound on retries per check.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Performs status checks against a [`Transport`] using a shared [`CredentialPool`].
///
/// Cheap to share behind an `Arc`; holds no per-entity state.
pub struct StatusClient {
    pool: Arc<CredentialPool>,
    transport: Arc<dyn Transport>,
    backoff: BackoffPolicy,
    request_jitter: JitterPolicy,
    request_timeout: Option<Duration>,
    bus: Bus,
}

impl StatusClient {
    /// Creates a client with default backoff, a 2-5s pre-request jitter and a 30s request timeout.
    pub fn new(pool: Arc<CredentialPool>, transport: Arc<dyn Transport>) -> Self {
        Self {
            pool,
            transport,
            backoff: BackoffPolicy::default(),
            request_jitter: JitterPolicy::uniform(Duration::from_secs(2), Duration::from_secs(5)),
            request_timeout: Some(Duration::from_secs(30)),
            bus: Bus::new(64),
        }
    }

    /// Replaces the retry backoff policy.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Replaces the pre-request jitter window.
    pub fn with_request_jitter(mut self, jitter: JitterPolicy) -> Self {
        self.request_jitter = jitter;
        self
    }

    /// Sets the per-request timeout (`None` = rely on the transport).
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Publishes retry and rotation events on `bus`.
    pub(crate) fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = bus;
        self
    }

    /// Shared credential pool.
    pub fn pool(&self) -> &Arc<CredentialPool> {
        &self.pool
    }

    /// Runs one logical check for `entity` with up to `max_retries` retries.
    ///
    /// Never fails: every remote failure ends up as a classified outcome.
    pub async fn check(&self, entity: &EntityId, max_retries: u32) -> CheckOutcome {
        match self
            .check_until(entity, max_retries, &CancellationToken::new())
            .await
        {
            Ok(outcome) => outcome,
            // A fresh token is never cancelled.
            Err(Cancelled) => CheckOutcome::TransientError(TransientKind::Unclassified(
                "cancelled".to_string(),
            )),
        }
    }

    /// Like [`check`](Self::check), but every suspension point (backoff,
    /// jitter, in-flight request) is aborted when `token` is cancelled.
    ///
    /// An in-flight request is dropped and its result discarded.
    pub async fn check_until(
        &self,
        entity: &EntityId,
        max_retries: u32,
        token: &CancellationToken,
    ) -> Result<CheckOutcome, Cancelled> {
        let mut retry: u32 = 0;

        loop {
            if retry > 0 {
                let delay = self.backoff.delay(retry);
                self.bus.publish(
                    Event::new(EventKind::RetryScheduled)
                        .with_entity(entity.clone())
                        .with_attempt(retry)
                        .with_delay(delay),
                );
                pause(delay, token).await?;
            }

            pause(self.request_jitter.sample(), token).await?;

            let outcome = self.attempt(entity, token).await?;

            if outcome.taints_credential() {
                self.pool.rotate();
                self.bus.publish(
                    Event::new(EventKind::CredentialRotated)
                        .with_entity(entity.clone())
                        .with_reason(outcome.as_label()),
                );
            }

            if !outcome.is_retryable() || retry >= max_retries {
                return Ok(outcome);
            }
            retry += 1;
        }
    }

    /// One request: credential → transport (timeout, panic-isolated) → classify.
    async fn attempt(
        &self,
        entity: &EntityId,
        token: &CancellationToken,
    ) -> Result<CheckOutcome, Cancelled> {
        let credential = match self.pool.current() {
            Ok(c) => c,
            Err(e) => {
                return Ok(CheckOutcome::TransientError(TransientKind::Unclassified(
                    e.to_string(),
                )));
            }
        };

        let call = AssertUnwindSafe(self.transport.issue_status_request(entity, &credential))
            .catch_unwind();

        let guarded = async {
            match self.request_timeout {
                Some(limit) => time::timeout(limit, call)
                    .await
                    .unwrap_or(Ok(Err(TransportError::Timeout))),
                None => call.await,
            }
        };

        let result = tokio::select! {
            res = guarded => res,
            _ = token.cancelled() => return Err(Cancelled),
        };

        Ok(match result {
            Ok(res) => classify(entity, res),
            Err(panic) => CheckOutcome::TransientError(TransientKind::Unclassified(format!(
                "transport panicked: {}",
                panic_message(panic.as_ref())
            ))),
        })
    }
}
