//! # Recovery notifications.
//!
//! The engine hands every detected recovery to a [`NotificationSink`] and does
//! not know how delivery happens. [`CourierSink`] is the stock sink: it
//! renders an optional attachment, sends it through a [`Courier`], and
//! degrades to the plain text message when anything about the attachment
//! fails.
//!
//! ```text
//! MonitorTask ──► NotificationSink::notify_recovered(&RecoveryEvent)
//!                      │
//!                      └─ CourierSink
//!                           ├─ AttachmentRenderer::render() ─► Courier::send_attachment(caption = text)
//!                           └─ on failure / disabled        ─► Courier::send_text(text)
//! ```

mod message;
mod sink;

use std::time::Duration;

use async_trait::async_trait;

use crate::client::ProfileAttributes;
use crate::entity::{Destination, EntityId};
use crate::error::NotifyError;

pub use message::{RecoveryMessage, format_count, format_elapsed, profile_url};
pub use sink::{Attachment, AttachmentRenderer, Courier, CourierSink};

/// Everything known about a recovery at the time it was detected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecoveryEvent {
    /// Recovered entity.
    pub entity: EntityId,
    /// Where to deliver the notice.
    pub destination: Destination,
    /// Attributes collected from the active response.
    pub attributes: ProfileAttributes,
    /// Time since the monitor task started.
    pub elapsed: Duration,
    /// Number of checks the task performed, including the successful one.
    pub checks: u32,
}

/// Receives recovery events.
///
/// Errors are logged by the engine; they never stop deregistration of the
/// recovered entity.
#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    /// Delivers a recovery notice for `event`.
    async fn notify_recovered(&self, event: &RecoveryEvent) -> Result<(), NotifyError>;
}
