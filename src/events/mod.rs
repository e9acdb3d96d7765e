//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the engine, the monitor tasks and
//! the status client.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `MonitorEngine`, `TaskTable`, `MonitorTask`, `StatusClient`,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the engine's subscriber listener, which fans out to the
//!   `SubscriberSet` (`LogWriter`, `StatusTracker`, user subscribers).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
