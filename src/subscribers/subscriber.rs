//! # Event subscriber trait.
//!
//! [`Subscribe`] is the extension point for observing the monitoring engine.
//! Every subscriber gets its own bounded queue and worker task inside the
//! [`SubscriberSet`](super::SubscriberSet).
//!
//! ```text
//! SubscriberSet ──► [bounded queue] ──► worker task ──► subscriber.on_event()
//!                                    └─► panic caught → EventKind::SubscriberPanicked
//! ```
//!
//! ## Rules
//! - A slow subscriber only fills its own queue.
//! - On overflow the event is dropped for that subscriber only and
//!   `EventKind::SubscriberOverflow` is published.
//! - Events are processed sequentially (FIFO) per subscriber.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use recoverwatch::{Event, EventKind, Subscribe};
//!
//! struct Recoveries;
//!
//! #[async_trait]
//! impl Subscribe for Recoveries {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::EntityRecovered) {
//!             // bump a counter, page someone, etc.
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "recoveries" }
//!     fn queue_capacity(&self) -> usize { 256 }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber for engine observability.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; do not panic.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    ///
    /// Called from the subscriber's worker task, never from a monitor task.
    async fn on_event(&self, event: &Event);

    /// Name used in overflow/panic events.
    ///
    /// The default uses `type_name::<Self>()`, which is verbose; override it.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred queue capacity (clamped to at least 1).
    ///
    /// Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
