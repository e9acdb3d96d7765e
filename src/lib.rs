//! # recoverwatch
//!
//! **recoverwatch** polls a remote profile-status endpoint for many suspended
//! accounts at once, notices when one of them comes back, sends a one-shot
//! recovery notice and stops tracking it.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   start_monitoring(id, dest)   stop_monitoring(id)   stop_all / resume_all
//!                 │                      │                     │
//!                 ▼                      ▼                     ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  MonitorEngine                                                    │
//! │  - EntityRegistry (id → destination, added_at)                    │
//! │  - TaskTable (one cancellable task per entity)                    │
//! │  - Bus + SubscriberSet (LogWriter, StatusTracker, user subs)      │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//!   │ MonitorTask │    │ MonitorTask │    │ MonitorTask │   (child tokens)
//!   │   "alice"   │    │    "bob"    │    │   "carol"   │
//!   └──────┬──────┘    └──────┬──────┘    └──────┬──────┘
//!          └──────────────────┼──────────────────┘
//!                             ▼
//!                  StatusClient (shared)
//!                  ├─ jitter, backoff, retries
//!                  ├─ CredentialPool (atomic rotation)
//!                  └─ Transport (HttpTransport / custom)
//! ```
//!
//! ### Lifecycle of one entity
//! ```text
//! loop {
//!   ├─► entity still registered? no ─► CANCELLED
//!   ├─► interval = U(min_check_interval, max_check_interval)
//!   ├─► StatusClient::check_until(entity, max_retries, token)
//!   │       ├─ sleep U(2s, 5s) before every request
//!   │       ├─ RateLimited / AuthError ─► rotate credential
//!   │       └─ retry n sleeps min(300s, 30s * 2^n + U(10s, 30s))
//!   ├─ Active ─► NotificationSink::notify_recovered ─► registry.remove ─► RECOVERED
//!   └─ otherwise ─► sleep(interval) (cancellable) ─► loop
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                          |
//! |-------------------|----------------------------------------------------------|---------------------------------------------|
//! | **Engine**        | Start, stop, resume and shut down monitors.              | [`MonitorEngine`], [`EngineBuilder`]        |
//! | **Checks**        | One logical check with retries and classification.       | [`StatusClient`], [`CheckOutcome`]          |
//! | **Credentials**   | Shared pool with lock-free rotation.                     | [`CredentialPool`]                          |
//! | **Collaborators** | Registry, transport and notification seams.              | [`EntityRegistry`], [`Transport`], [`NotificationSink`] |
//! | **Observability** | Structured events fanned out to subscribers.             | [`Subscribe`], [`LogWriter`], [`StatusTracker`] |
//! | **Configuration** | Intervals, retries, backoff, grace.                      | [`EngineConfig`]                            |
//!
//! ## Optional features
//! - `http` (default): [`HttpTransport`] built on `reqwest`.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use recoverwatch::{
//!     Credential, CredentialPool, Destination, EngineBuilder, EngineConfig, EntityId,
//!     NotificationSink, NotifyError, RawResponse, RecoveryEvent, Transport, TransportError,
//! };
//!
//! struct Endpoint;
//!
//! #[async_trait]
//! impl Transport for Endpoint {
//!     async fn issue_status_request(
//!         &self,
//!         _entity: &EntityId,
//!         _credential: &Credential,
//!     ) -> Result<RawResponse, TransportError> {
//!         Ok(RawResponse::new(404, ""))
//!     }
//! }
//!
//! struct Stdout;
//!
//! #[async_trait]
//! impl NotificationSink for Stdout {
//!     async fn notify_recovered(&self, event: &RecoveryEvent) -> Result<(), NotifyError> {
//!         println!("{} is back", event.entity);
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = EngineBuilder::new(EngineConfig::default())
//!         .with_credentials(Arc::new(CredentialPool::new(["session-a", "session-b"])))
//!         .with_transport(Arc::new(Endpoint))
//!         .with_sink(Arc::new(Stdout))
//!         .build()?;
//!
//!     let id = EntityId::parse("@someone").ok_or("bad id")?;
//!     engine.start_monitoring(id, Destination::from(42_i64)).await;
//!
//!     engine.run_until_signal().await?;
//!     Ok(())
//! }
//! ```
mod client;
mod core;
mod credentials;
mod entity;
mod error;
mod events;
mod notify;
mod policies;
mod registry;
mod subscribers;

// ---- Public re-exports ----

pub use client::{
    CheckOutcome, DEFAULT_MAX_RETRIES, ProfileAttributes, RawResponse, StatusClient, TransientKind,
    Transport, classify, parse_profile,
};
pub use self::core::{EngineBuilder, EngineConfig, MonitorEngine, StartOutcome};
pub use credentials::{Credential, CredentialPool};
pub use entity::{Destination, EntityId};
pub use error::{Cancelled, EngineError, NotifyError, TransportError};
pub use events::{Bus, Event, EventKind};
pub use notify::{
    Attachment, AttachmentRenderer, Courier, CourierSink, NotificationSink, RecoveryEvent,
    RecoveryMessage, format_count, format_elapsed, profile_url,
};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use registry::{EntityRegistry, MemoryRegistry, RegistryEntry};
pub use subscribers::{LogWriter, MonitorStatus, StatusTracker, Subscribe, SubscriberSet};

// Built-in reqwest transport.
// Disable with: `--no-default-features`
#[cfg(feature = "http")]
pub use client::{HttpTransport, HttpTransportConfig};
