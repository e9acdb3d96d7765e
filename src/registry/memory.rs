use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use parking_lot::RwLock;
use tracing::info;

use super::{EntityRegistry, RegistryEntry};
use crate::entity::{Destination, EntityId};

/// In-memory [`EntityRegistry`] guarded by a read-write lock.
#[derive(Default)]
pub struct MemoryRegistry {
    entries: RwLock<HashMap<EntityId, RegistryEntry>>,
}

impl MemoryRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated with existing entries (e.g. reloaded
    /// after a restart). Their `added_at` timestamps are preserved.
    pub fn with_entries(entries: impl IntoIterator<Item = (EntityId, RegistryEntry)>) -> Self {
        Self {
            entries: RwLock::new(entries.into_iter().collect()),
        }
    }
}

impl EntityRegistry for MemoryRegistry {
    fn add(&self, id: EntityId, destination: Destination) -> bool {
        let mut entries = self.entries.write();
        if entries.contains_key(&id) {
            return false;
        }
        info!(entity = %id, destination = %destination, "added to registry");
        entries.insert(
            id,
            RegistryEntry {
                destination,
                added_at: Utc::now(),
            },
        );
        true
    }

    fn remove(&self, id: &EntityId) -> bool {
        let removed = self.entries.write().remove(id).is_some();
        if removed {
            info!(entity = %id, "removed from registry");
        }
        removed
    }

    fn contains(&self, id: &EntityId) -> bool {
        self.entries.read().contains_key(id)
    }

    fn get(&self, id: &EntityId) -> Option<RegistryEntry> {
        self.entries.read().get(id).cloned()
    }

    fn list_all(&self) -> BTreeMap<EntityId, RegistryEntry> {
        self.entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn clear(&self) -> usize {
        let count = {
            let mut entries = self.entries.write();
            let count = entries.len();
            entries.clear();
            count
        };
        info!(count, "cleared registry");
        count
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> EntityId {
        EntityId::parse(s).unwrap()
    }

    #[test]
    fn add_rejects_duplicates_case_insensitively() {
        let reg = MemoryRegistry::new();
        assert!(reg.add(id("Foo"), Destination::from("chat-1")));
        assert!(!reg.add(id("FOO"), Destination::from("chat-2")));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get(&id("foo")).unwrap().destination.as_str(), "chat-1");
    }

    #[test]
    fn added_at_is_not_touched_by_duplicate_add() {
        let reg = MemoryRegistry::new();
        reg.add(id("foo"), Destination::from("a"));
        let first = reg.get(&id("foo")).unwrap().added_at;
        reg.add(id("foo"), Destination::from("b"));
        assert_eq!(reg.get(&id("foo")).unwrap().added_at, first);
    }

    #[test]
    fn remove_and_clear() {
        let reg = MemoryRegistry::new();
        reg.add(id("a"), Destination::from("x"));
        reg.add(id("b"), Destination::from("x"));
        assert!(reg.remove(&id("a")));
        assert!(!reg.remove(&id("a")));
        assert!(!reg.contains(&id("a")));
        assert_eq!(reg.clear(), 1);
        assert!(reg.is_empty());
    }

    #[test]
    fn list_all_is_ordered() {
        let reg = MemoryRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            reg.add(id(name), Destination::from("x"));
        }
        let names: Vec<String> = reg.list_all().keys().map(|k| k.to_string()).collect();
        assert_eq!(names, ["alpha", "mid", "zeta"]);
    }

    #[test]
    fn concurrent_adds_keep_one_entry() {
        use std::sync::Arc;

        let reg = Arc::new(MemoryRegistry::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let reg = Arc::clone(&reg);
                std::thread::spawn(move || reg.add(id("same"), Destination::new(i.to_string())))
            })
            .collect();
        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|added| *added)
            .count();
        assert_eq!(wins, 1);
        assert_eq!(reg.len(), 1);
    }
}
