// Process-wide session registry: live display names and named rooms.
//
// The registry carries its own lock, independent of every room lock. No
// method holds the registry lock while taking a room lock: callers get
// `Arc<Room>` handles out and talk to rooms afterwards, so there is no
// lock-ordering hazard between the two layers.
//
// Room entries are append-only: rooms are created lazily on first reference
// (CREATE/JOIN/SPECTATE/START_VS_SERVER all route through
// `get_or_create_room`) and never removed. An empty room simply persists
// until process exit.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::info;

use crate::room::Room;

#[derive(Default)]
pub struct Registry {
    inner: Mutex<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    names: HashSet<String>,
    rooms: HashMap<String, Arc<Room>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a display name to a live connection. Returns false if some other
    /// connection already holds the name.
    pub fn claim_name(&self, name: &str) -> bool {
        self.lock().names.insert(name.to_string())
    }

    /// Free a name on disconnect or quit.
    pub fn release_name(&self, name: &str) {
        self.lock().names.remove(name);
    }

    /// Atomic get-or-create: two callers racing on the same room name both
    /// observe the same room.
    pub fn get_or_create_room(&self, name: &str) -> Arc<Room> {
        let mut inner = self.lock();
        if let Some(room) = inner.rooms.get(name) {
            return Arc::clone(room);
        }
        info!(room = name, "room created");
        let room = Arc::new(Room::new(name.to_string()));
        inner.rooms.insert(name.to_string(), Arc::clone(&room));
        room
    }

    /// Handles to every room, for LIST and for disconnect cleanup. The
    /// registry lock is released before the caller touches any room.
    pub fn rooms_snapshot(&self) -> Vec<Arc<Room>> {
        self.lock().rooms.values().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn names_are_unique_until_released() {
        let registry = Registry::new();
        assert!(registry.claim_name("Ana"));
        assert!(!registry.claim_name("Ana"));
        registry.release_name("Ana");
        assert!(registry.claim_name("Ana"));
    }

    #[test]
    fn get_or_create_returns_the_same_room() {
        let registry = Registry::new();
        let first = registry.get_or_create_room("r1");
        let second = registry.get_or_create_room("r1");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.rooms_snapshot().len(), 1);
    }

    #[test]
    fn concurrent_creation_yields_one_room() {
        let registry = Arc::new(Registry::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(thread::spawn(move || registry.get_or_create_room("busy")));
        }
        let rooms: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for room in &rooms[1..] {
            assert!(Arc::ptr_eq(&rooms[0], room));
        }
        assert_eq!(registry.rooms_snapshot().len(), 1);
    }

    #[test]
    fn rooms_are_never_removed() {
        let registry = Registry::new();
        registry.get_or_create_room("a");
        registry.get_or_create_room("b");
        let mut names: Vec<_> = registry
            .rooms_snapshot()
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a", "b"]);
    }
}
