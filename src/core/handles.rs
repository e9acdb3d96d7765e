//! # Task table: owns the handle of every live monitor task.
//!
//! One entry per entity, keyed by [`EntityId`]. The table is the only place
//! that spawns monitor tasks, which is how "at most one task per entity" is
//! enforced: the presence check and the insert happen under the same write
//! lock.
//!
//! ## Architecture
//! ```text
//! MonitorEngine
//!   ├─► register_and_spawn(id, dest) ─► write lock ─► registry.add ─► spawn_locked
//!   ├─► spawn_if_absent(task)         ─► write lock ─► registered? ─► spawn_locked
//!   │       spawn_locked: live handle? ─► false
//!   │                     publish MonitorStarted
//!   │                     tokio::spawn(task.run(child_token))
//!   │                     insert Handle{join, cancel, generation}
//!   ├─► stop(id, grace)        ─► take handle ─► cancel ─► join (≤ grace) ─► abort on timeout
//!   ├─► cancel_all(grace)      ─► drain ─► cancel all ─► join all (shared deadline)
//!   └─► list()                 ─► sorted ids of unfinished tasks
//!
//! Monitor task exit ─► retire(id, generation, exit)
//!                        write lock ─► superseded? ─► nothing
//!                                   └► Recovered ? registry.remove
//!                                      remove own handle
//! ```
//!
//! ## Rules
//! - Handles are removed either by a stop operation or by the task itself on exit.
//! - A recovered entity leaves the registry and the table under one lock, so a
//!   concurrent start either sees both or neither.
//! - `retire` ignores a generation that is no longer current, so a task that
//!   finishes late never touches a newer task spawned for the same id.
//! - A finished handle still in the table counts as absent.
//! - Every removal publishes `MonitorRemoved`.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::{JoinError, JoinHandle};
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::core::monitor::{MonitorContext, MonitorExit, MonitorTask};
use crate::entity::{Destination, EntityId};
use crate::events::{Bus, Event, EventKind};
use crate::registry::EntityRegistry;

/// Handle to a running monitor task.
struct Handle {
    join: JoinHandle<MonitorExit>,
    cancel: CancellationToken,
    generation: u64,
}

/// Live monitor tasks, keyed by entity.
pub(crate) struct TaskTable {
    tasks: RwLock<HashMap<EntityId, Handle>>,
    registry: Arc<dyn EntityRegistry>,
    bus: Bus,
    runtime_token: CancellationToken,
    generation: AtomicU64,
}

impl TaskTable {
    pub(crate) fn new(
        bus: Bus,
        runtime_token: CancellationToken,
        registry: Arc<dyn EntityRegistry>,
    ) -> Arc<Self> {
        Arc::new(Self {
            tasks: RwLock::new(HashMap::new()),
            registry,
            bus,
            runtime_token,
            generation: AtomicU64::new(0),
        })
    }

    /// Registers `id` and spawns its task unless one is live.
    ///
    /// An existing registry entry keeps its stored destination. Returns
    /// `true` when a task was spawned.
    pub(crate) async fn register_and_spawn(
        self: &Arc<Self>,
        id: EntityId,
        destination: Destination,
        ctx: MonitorContext,
    ) -> bool {
        let mut tasks = self.tasks.write().await;

        let destination = if self.registry.add(id.clone(), destination.clone()) {
            destination
        } else {
            self.registry
                .get(&id)
                .map_or(destination, |entry| entry.destination)
        };

        self.spawn_locked(&mut tasks, MonitorTask::new(id, destination, ctx))
    }

    /// Spawns `task` if its entity is registered and has no live task.
    ///
    /// Returns `true` when a task was spawned.
    pub(crate) async fn spawn_if_absent(self: &Arc<Self>, task: MonitorTask) -> bool {
        let mut tasks = self.tasks.write().await;
        if !self.registry.contains(task.entity()) {
            return false;
        }
        self.spawn_locked(&mut tasks, task)
    }

    fn spawn_locked(
        self: &Arc<Self>,
        tasks: &mut HashMap<EntityId, Handle>,
        task: MonitorTask,
    ) -> bool {
        let id = task.entity().clone();
        if tasks.get(&id).is_some_and(|h| !h.join.is_finished()) {
            return false;
        }

        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let cancel = self.runtime_token.child_token();
        let child = cancel.clone();
        let me = Arc::clone(self);
        let task_id = id.clone();

        self.bus
            .publish(Event::new(EventKind::MonitorStarted).with_entity(id.clone()));

        let join = tokio::spawn(async move {
            let exit = task.run(child).await;
            me.retire(&task_id, generation, exit).await;
            exit
        });

        tasks.insert(
            id,
            Handle {
                join,
                cancel,
                generation,
            },
        );
        true
    }

    /// Cancels the task of `id` and waits up to `grace` for it to exit.
    ///
    /// Returns `false` when no handle was present.
    pub(crate) async fn stop(&self, id: &EntityId, grace: Duration) -> bool {
        let Some(handle) = self.take(id).await else {
            return false;
        };
        handle.cancel.cancel();
        let deadline = time::Instant::now() + grace;
        self.join_within(id, handle.join, deadline).await;
        true
    }

    /// Cancels every task and waits for all of them under one shared deadline.
    ///
    /// Returns the entities whose tasks had to be aborted.
    pub(crate) async fn cancel_all(&self, grace: Duration) -> Vec<EntityId> {
        let handles: Vec<(EntityId, Handle)> = {
            let mut tasks = self.tasks.write().await;
            tasks.drain().collect()
        };

        for (_, h) in &handles {
            h.cancel.cancel();
        }

        let deadline = time::Instant::now() + grace;
        let mut stuck = Vec::new();
        for (id, h) in handles {
            if !self.join_within(&id, h.join, deadline).await {
                stuck.push(id);
            }
        }
        stuck.sort_unstable();
        stuck
    }

    /// Sorted ids of tasks that have not finished yet.
    pub(crate) async fn list(&self) -> Vec<EntityId> {
        let tasks = self.tasks.read().await;
        let mut ids: Vec<EntityId> = tasks
            .iter()
            .filter(|(_, h)| !h.join.is_finished())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Whether a live task exists for `id`.
    pub(crate) async fn contains(&self, id: &EntityId) -> bool {
        self.tasks
            .read()
            .await
            .get(id)
            .is_some_and(|h| !h.join.is_finished())
    }

    /// Called by a task on exit. Deregisters a recovered entity and removes
    /// the task's own handle, unless a newer task owns `id` by now.
    async fn retire(&self, id: &EntityId, generation: u64, exit: MonitorExit) {
        let removed = {
            let mut tasks = self.tasks.write().await;
            if tasks.get(id).is_some_and(|h| h.generation != generation) {
                return;
            }
            if exit == MonitorExit::Recovered {
                self.registry.remove(id);
            }
            tasks.remove(id).is_some()
        };
        if removed {
            self.bus
                .publish(Event::new(EventKind::MonitorRemoved).with_entity(id.clone()));
        }
    }

    async fn take(&self, id: &EntityId) -> Option<Handle> {
        self.tasks.write().await.remove(id)
    }

    /// Awaits `join` until `deadline`; aborts on timeout. Always publishes `MonitorRemoved`.
    ///
    /// Returns `false` if the task had to be aborted.
    async fn join_within(
        &self,
        id: &EntityId,
        mut join: JoinHandle<MonitorExit>,
        deadline: time::Instant,
    ) -> bool {
        let joined = time::timeout_at(deadline, &mut join).await;
        let ev = Event::new(EventKind::MonitorRemoved).with_entity(id.clone());
        match joined {
            Ok(Ok(_exit)) => {
                self.bus.publish(ev);
                true
            }
            Ok(Err(e)) => {
                self.bus.publish(ev.with_reason(join_error_label(&e)));
                true
            }
            Err(_elapsed) => {
                join.abort();
                self.bus.publish(ev.with_reason("aborted"));
                false
            }
        }
    }
}

fn join_error_label(e: &JoinError) -> &'static str {
    if e.is_panic() {
        "task_panicked"
    } else {
        "aborted"
    }
}
