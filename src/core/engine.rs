//! # MonitorEngine: per-entity polling tasks, recovery and shutdown.
//!
//! The engine owns the event bus, the subscriber fan-out, the task table and
//! the shared [`StatusClient`]. It exposes the lifecycle operations used by
//! the surrounding application (chat commands, service start-up, signals).
//!
//! ## Architecture
//! ```text
//! start_monitoring(id, dest)
//!   └─► TaskTable::register_and_spawn(id, dest)   (one table lock)
//!          ├─► registry.add(id, dest)             (existing entry keeps its destination)
//!          └─► spawn MonitorTask, child token = runtime_token.child_token()
//!
//! stop_monitoring(id)
//!   ├─► registry.remove(id)
//!   └─► TaskTable::stop(id, grace)      (cancel → join ≤ grace → abort)
//!
//! stop_all_monitoring(clear)
//!   ├─► publish StopAllRequested
//!   ├─► clear ? registry.clear()
//!   └─► TaskTable::cancel_all(grace) ─► AllStoppedWithin | GraceExceeded
//!
//! resume_all_monitoring()
//!   └─► for (id, entry) in registry.list_all(): spawn_if_absent
//!
//! Event flow:
//!   MonitorTask / StatusClient / TaskTable ─► Bus ─► listener ─► SubscriberSet
//! ```
//!
//! ## Rules
//! - At most one live task per entity.
//! - Stop operations are idempotent.
//! - Dropping the engine cancels every task.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::client::StatusClient;
use crate::core::config::EngineConfig;
use crate::core::handles::TaskTable;
use crate::core::monitor::{MonitorContext, MonitorTask};
use crate::core::signal;
use crate::entity::{Destination, EntityId};
use crate::error::EngineError;
use crate::events::{Bus, Event, EventKind};
use crate::notify::NotificationSink;
use crate::registry::EntityRegistry;
use crate::subscribers::{MonitorStatus, StatusTracker, SubscriberSet};

/// Result of [`MonitorEngine::start_monitoring`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new polling task was spawned.
    Started,
    /// A live task already exists; nothing changed.
    AlreadyMonitoring,
}

/// Runs one polling task per tracked entity.
///
/// Build it with [`EngineBuilder`](crate::EngineBuilder). Every method takes
/// `&self`; share the engine behind the returned `Arc`.
pub struct MonitorEngine {
    cfg: EngineConfig,
    bus: Bus,
    client: Arc<StatusClient>,
    registry: Arc<dyn EntityRegistry>,
    sink: Arc<dyn NotificationSink>,
    tasks: Arc<TaskTable>,
    tracker: Arc<StatusTracker>,
    subs: Arc<SubscriberSet>,
    runtime_token: CancellationToken,
}

pub(crate) struct EngineParts {
    pub cfg: EngineConfig,
    pub bus: Bus,
    pub client: Arc<StatusClient>,
    pub registry: Arc<dyn EntityRegistry>,
    pub sink: Arc<dyn NotificationSink>,
    pub tracker: Arc<StatusTracker>,
    pub subs: Arc<SubscriberSet>,
}

impl MonitorEngine {
    pub(crate) fn new_internal(parts: EngineParts) -> Self {
        let runtime_token = CancellationToken::new();
        let engine = Self {
            tasks: TaskTable::new(
                parts.bus.clone(),
                runtime_token.clone(),
                Arc::clone(&parts.registry),
            ),
            cfg: parts.cfg,
            bus: parts.bus,
            client: parts.client,
            registry: parts.registry,
            sink: parts.sink,
            tracker: parts.tracker,
            subs: parts.subs,
            runtime_token,
        };
        engine.subscriber_listener();
        engine
    }

    /// Starts polling `id`, registering it with `destination` first.
    ///
    /// If `id` is already registered without a live task (e.g. after a
    /// restart), the stored destination wins and a task is spawned.
    pub async fn start_monitoring(&self, id: EntityId, destination: Destination) -> StartOutcome {
        if self
            .tasks
            .register_and_spawn(id.clone(), destination, self.context())
            .await
        {
            StartOutcome::Started
        } else {
            self.bus
                .publish(Event::new(EventKind::DuplicateIgnored).with_entity(id));
            StartOutcome::AlreadyMonitoring
        }
    }

    /// Deregisters `id` and cancels its task. No notification is sent.
    ///
    /// Returns `true` if there was anything to stop.
    pub async fn stop_monitoring(&self, id: &EntityId) -> bool {
        let removed = self.registry.remove(id);
        let stopped = self.tasks.stop(id, self.cfg.grace).await;
        removed || stopped
    }

    /// Cancels every task; with `clear_registry` also empties the registry.
    ///
    /// Waits up to the configured grace for tasks to exit. Tasks still
    /// running after that are aborted and reported as
    /// [`EngineError::GraceExceeded`].
    pub async fn stop_all_monitoring(&self, clear_registry: bool) -> Result<(), EngineError> {
        self.bus.publish(
            Event::new(EventKind::StopAllRequested)
                .with_reason(format!("clear_registry={clear_registry}")),
        );

        if clear_registry {
            let cleared = self.registry.clear();
            info!(cleared, "registry cleared");
        }

        let grace = self.cfg.grace;
        let stuck = self.tasks.cancel_all(grace).await;
        if stuck.is_empty() {
            self.bus.publish(Event::new(EventKind::AllStoppedWithin));
            return Ok(());
        }

        let stuck: Vec<String> = stuck.into_iter().map(String::from).collect();
        self.bus
            .publish(Event::new(EventKind::GraceExceeded).with_reason(stuck.join(",")));
        Err(EngineError::GraceExceeded { grace, stuck })
    }

    /// Spawns a task for every registered entity without one.
    ///
    /// Returns how many tasks were started.
    pub async fn resume_all_monitoring(&self) -> usize {
        let entries = self.registry.list_all();
        let total = entries.len();
        let mut started = 0;
        for (id, entry) in entries {
            let task = MonitorTask::new(id, entry.destination, self.context());
            if self.tasks.spawn_if_absent(task).await {
                started += 1;
            }
        }
        info!(started, registered = total, "monitoring resumed");
        started
    }

    /// Waits for a termination signal, then stops all tasks and keeps the
    /// registry for the next [`resume_all_monitoring`](Self::resume_all_monitoring).
    pub async fn run_until_signal(&self) -> Result<(), EngineError> {
        signal::wait_for_shutdown_signal()
            .await
            .map_err(|e| EngineError::Signal {
                error: e.to_string(),
            })?;
        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        self.stop_all_monitoring(false).await
    }

    /// Sorted ids of entities with a live task.
    pub async fn active(&self) -> Vec<EntityId> {
        self.tasks.list().await
    }

    /// Whether `id` has a live task.
    pub async fn is_monitoring(&self, id: &EntityId) -> bool {
        self.tasks.contains(id).await
    }

    /// Per-entity status of tasks not yet removed (eventually consistent).
    pub fn status(&self) -> Vec<MonitorStatus> {
        self.tracker.snapshot()
    }

    /// Receiver of raw engine events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// The registry the engine reads and writes.
    pub fn registry(&self) -> &Arc<dyn EntityRegistry> {
        &self.registry
    }

    /// Shared status client.
    pub fn client(&self) -> &Arc<StatusClient> {
        &self.client
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    fn context(&self) -> MonitorContext {
        MonitorContext {
            client: Arc::clone(&self.client),
            registry: Arc::clone(&self.registry),
            sink: Arc::clone(&self.sink),
            bus: self.bus.clone(),
            interval: self.cfg.check_interval(),
            max_retries: self.cfg.max_retries,
        }
    }

    /// Forwards bus events to the subscriber set until the engine is dropped.
    fn subscriber_listener(&self) {
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        let token = self.runtime_token.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Ok(ev) => set.emit(&ev),
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "event listener lagged");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        });
    }
}

impl Drop for MonitorEngine {
    fn drop(&mut self) {
        self.runtime_token.cancel();
    }
}
