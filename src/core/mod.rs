//! Engine core: configuration, monitor tasks and their lifecycle.
//!
//! Public API: [`MonitorEngine`], [`EngineBuilder`], [`EngineConfig`],
//! [`StartOutcome`].
//!
//! Internal modules:
//! - [`monitor`]: the polling loop of one entity and its recovery step;
//! - [`handles`]: the task table (spawn, stop, cancel-all with grace);
//! - `pause`: cancellable sleep shared by every suspension point;
//! - [`signal`]: OS termination signal listener.

mod builder;
mod config;
mod engine;
mod handles;
mod monitor;
mod pause;
mod signal;

pub use builder::EngineBuilder;
pub use config::EngineConfig;
pub use engine::{MonitorEngine, StartOutcome};

pub(crate) use pause::pause;
