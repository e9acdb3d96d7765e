//! # EngineBuilder: assembles a [`MonitorEngine`].
//!
//! ```text
//! EngineBuilder::new(cfg)
//!   .with_credentials(pool)        required, non-empty
//!   .with_transport(transport)     required
//!   .with_sink(sink)               required
//!   .with_registry(registry)       default: MemoryRegistry
//!   .with_subscribers(subs)        optional, plus LogWriter + StatusTracker
//!   .build()?  ─► Arc<MonitorEngine>
//! ```

use std::sync::Arc;

use crate::client::{StatusClient, Transport};
use crate::core::config::EngineConfig;
use crate::core::engine::{EngineParts, MonitorEngine};
use crate::credentials::CredentialPool;
use crate::error::EngineError;
use crate::events::Bus;
use crate::notify::NotificationSink;
use crate::registry::{EntityRegistry, MemoryRegistry};
use crate::subscribers::{LogWriter, StatusTracker, Subscribe, SubscriberSet};

/// Builder for [`MonitorEngine`].
pub struct EngineBuilder {
    cfg: EngineConfig,
    pool: Option<Arc<CredentialPool>>,
    transport: Option<Arc<dyn Transport>>,
    registry: Option<Arc<dyn EntityRegistry>>,
    sink: Option<Arc<dyn NotificationSink>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    log_writer: bool,
}

impl EngineBuilder {
    /// Creates a builder with the given configuration.
    pub fn new(cfg: EngineConfig) -> Self {
        Self {
            cfg,
            pool: None,
            transport: None,
            registry: None,
            sink: None,
            subscribers: Vec::new(),
            log_writer: true,
        }
    }

    /// Sets the shared credential pool.
    pub fn with_credentials(mut self, pool: Arc<CredentialPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Sets the transport used for status requests.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the entity registry (default: an empty [`MemoryRegistry`]).
    pub fn with_registry(mut self, registry: Arc<dyn EntityRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the recovery notification sink.
    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Adds event subscribers.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers.extend(subscribers);
        self
    }

    /// Skips the built-in [`LogWriter`].
    pub fn without_log_writer(mut self) -> Self {
        self.log_writer = false;
        self
    }

    /// Validates the configuration and wires every component.
    ///
    /// Must be called inside a Tokio runtime (spawns the subscriber workers).
    ///
    /// # Errors
    /// - [`EngineError::InvalidConfig`] for out-of-range values or a missing
    ///   transport/sink.
    /// - [`EngineError::EmptyPool`] when no credentials were supplied.
    pub fn build(self) -> Result<Arc<MonitorEngine>, EngineError> {
        self.cfg.validate()?;

        let pool = self
            .pool
            .filter(|p| !p.is_empty())
            .ok_or(EngineError::EmptyPool)?;
        let transport = self.transport.ok_or_else(|| missing("transport"))?;
        let sink = self.sink.ok_or_else(|| missing("notification sink"))?;
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(MemoryRegistry::new()));

        let bus = Bus::new(self.cfg.bus_capacity_clamped());

        let client = StatusClient::new(pool, transport)
            .with_backoff(self.cfg.backoff_policy())
            .with_request_jitter(self.cfg.request_jitter())
            .with_request_timeout(self.cfg.request_timeout())
            .with_bus(bus.clone());

        let tracker = Arc::new(StatusTracker::new());
        let mut subscribers: Vec<Arc<dyn Subscribe>> = vec![tracker.clone()];
        if self.log_writer {
            subscribers.push(Arc::new(LogWriter::new()));
        }
        subscribers.extend(self.subscribers);
        let subs = Arc::new(SubscriberSet::new(subscribers, bus.clone()));

        Ok(Arc::new(MonitorEngine::new_internal(EngineParts {
            cfg: self.cfg,
            bus,
            client: Arc::new(client),
            registry,
            sink,
            tracker,
            subs,
        })))
    }
}

fn missing(what: &str) -> EngineError {
    EngineError::InvalidConfig {
        reason: format!("{what} is required"),
    }
}
