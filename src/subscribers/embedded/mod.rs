//! # Built-in subscribers
//!
//! - [`LogWriter`]: writes every event through `tracing`.
//! - [`StatusTracker`]: per-entity snapshot behind `MonitorEngine::status`.

mod log;
mod status;

pub use log::LogWriter;
pub use status::{MonitorStatus, StatusTracker};
