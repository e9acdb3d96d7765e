//! # Event subscribers.
//!
//! Engine events travel from the [`Bus`](crate::events::Bus) through the
//! engine's listener into a [`SubscriberSet`], which feeds every
//! [`Subscribe`] implementation through its own queue.
//!
//! ```text
//! MonitorTask / StatusClient ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                                          │
//!                                                  ┌───────────────┬───────┴───────┐
//!                                                  ▼               ▼               ▼
//!                                              LogWriter     StatusTracker    user subscribers
//! ```
//!
//! - **Passive subscribers** observe events (logging, metrics, alerts).
//! - **Stateful subscribers** fold events into state ([`StatusTracker`]).

mod embedded;
mod subscriber;
mod subscriber_set;

pub use embedded::{LogWriter, MonitorStatus, StatusTracker};
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
