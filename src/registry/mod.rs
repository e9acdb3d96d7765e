//! # Entity registry: which entities are tracked, and where to notify.
//!
//! The engine consumes the [`EntityRegistry`] trait and treats every call as an
//! atomic, synchronously observable operation. The registry is the source of
//! truth for "is this entity still tracked?": a monitor task re-reads it at
//! the top of every iteration. Persistence is an implementation concern;
//! [`MemoryRegistry`] keeps everything in memory.

mod memory;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Destination, EntityId};

pub use memory::MemoryRegistry;

/// Registry record of a tracked entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Where a recovery notice should go.
    pub destination: Destination,
    /// When the entity was added. Set once, never mutated.
    pub added_at: DateTime<Utc>,
}

/// Persisted mapping of tracked entity → destination + metadata.
///
/// ### Rules
/// - At most one entry per [`EntityId`]; [`add`](Self::add) on an existing id
///   is rejected and leaves the entry untouched.
/// - All operations are atomic with respect to each other.
pub trait EntityRegistry: Send + Sync + 'static {
    /// Adds an entity. Returns `false` if it was already present.
    fn add(&self, id: EntityId, destination: Destination) -> bool;

    /// Removes an entity. Returns `true` if it was present.
    fn remove(&self, id: &EntityId) -> bool;

    /// Returns true if the entity is tracked.
    fn contains(&self, id: &EntityId) -> bool;

    /// Returns the entry for an entity.
    fn get(&self, id: &EntityId) -> Option<RegistryEntry>;

    /// Snapshot of all entries, ordered by id.
    fn list_all(&self) -> BTreeMap<EntityId, RegistryEntry>;

    /// Removes every entry; returns how many were removed.
    fn clear(&self) -> usize;

    /// Number of tracked entities.
    fn len(&self) -> usize {
        self.list_all().len()
    }

    /// Returns true if nothing is tracked.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
