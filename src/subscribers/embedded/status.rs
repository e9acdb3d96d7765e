//! # StatusTracker: per-entity monitoring snapshot.
//!
//! Folds monitor events into one [`MonitorStatus`] per entity, using event
//! sequence numbers to reject out-of-order delivery.
//!
//! ```text
//! MonitorStarted     → running = true, checks = 0, last_outcome = None
//! CheckStarting(n)   → checks = n
//! CheckCompleted(o)  → last_outcome = o
//! EntityRecovered    → recovered = true
//! MonitorCancelled   → running = false
//! MonitorRemoved     → entry dropped
//! ```
//!
//! Only `MonitorStarted` creates an entry, so the snapshot holds entities
//! whose task has not been removed yet. Events with `seq <= last_seq` for the
//! same entity are ignored.

use std::collections::HashMap;
use std::time::SystemTime;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::entity::EntityId;
use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Snapshot of one entity's monitor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonitorStatus {
    /// Monitored entity.
    pub entity: EntityId,
    /// Whether a task is polling right now.
    pub running: bool,
    /// Whether the last task ended in a recovery.
    pub recovered: bool,
    /// Checks started by the current (or last) task.
    pub checks: u32,
    /// Label of the last completed check.
    pub last_outcome: Option<&'static str>,
    /// Time of the last applied event.
    pub updated_at: SystemTime,
    last_seq: Option<u64>,
}

impl MonitorStatus {
    fn new(entity: EntityId, at: SystemTime) -> Self {
        Self {
            entity,
            running: false,
            recovered: false,
            checks: 0,
            last_outcome: None,
            updated_at: at,
            last_seq: None,
        }
    }
}

/// Subscriber keeping a [`MonitorStatus`] per entity.
pub struct StatusTracker {
    state: RwLock<HashMap<EntityId, MonitorStatus>>,
}

impl StatusTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(HashMap::new()),
        }
    }

    /// Applies an event; returns `false` if it was ignored.
    pub fn update(&self, ev: &Event) -> bool {
        let Some(entity) = ev.entity.as_ref() else {
            return false;
        };
        if !matches!(
            ev.kind,
            EventKind::MonitorStarted
                | EventKind::CheckStarting
                | EventKind::CheckCompleted
                | EventKind::EntityRecovered
                | EventKind::MonitorCancelled
                | EventKind::MonitorRemoved
        ) {
            return false;
        }

        let mut state = self.state.write();
        if ev.kind == EventKind::MonitorStarted {
            state
                .entry(entity.clone())
                .or_insert_with(|| MonitorStatus::new(entity.clone(), ev.at));
        }
        let Some(status) = state.get_mut(entity) else {
            return false;
        };

        if status.last_seq.is_some_and(|last| ev.seq <= last) {
            return false;
        }
        if ev.kind == EventKind::MonitorRemoved {
            state.remove(entity);
            return true;
        }
        status.last_seq = Some(ev.seq);
        status.updated_at = ev.at;

        match ev.kind {
            EventKind::MonitorStarted => {
                status.running = true;
                status.recovered = false;
                status.checks = 0;
                status.last_outcome = None;
            }
            EventKind::CheckStarting => {
                status.checks = ev.attempt.unwrap_or(status.checks + 1);
            }
            EventKind::CheckCompleted => {
                status.last_outcome = ev.outcome;
            }
            EventKind::EntityRecovered => {
                status.recovered = true;
            }
            _ => {
                status.running = false;
            }
        }
        true
    }

    /// Sorted snapshot of every entity with a task that was not removed yet.
    #[must_use]
    pub fn snapshot(&self) -> Vec<MonitorStatus> {
        let mut v: Vec<MonitorStatus> = self.state.read().values().cloned().collect();
        v.sort_unstable_by(|a, b| a.entity.cmp(&b.entity));
        v
    }

    /// Status of one entity.
    #[must_use]
    pub fn get(&self, entity: &EntityId) -> Option<MonitorStatus> {
        self.state.read().get(entity).cloned()
    }
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Subscribe for StatusTracker {
    async fn on_event(&self, ev: &Event) {
        self.update(ev);
    }

    fn name(&self) -> &'static str {
        "status_tracker"
    }

    fn queue_capacity(&self) -> usize {
        2048
    }
}
