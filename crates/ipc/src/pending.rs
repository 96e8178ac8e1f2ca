//! Generic pending-record list with tick-based aging, shared by the Triage
//! and Surgery coordinators. Each entry remembers the tick it was inserted
//! at; `expire` sweeps anything older than `MAX_WAIT_DEPENDENCIES_TIME`
//! (8000 ticks) without a completion counter bump — the caller decides what
//! "expired" means for its own stats (a dropped warning for triage, a
//! `cancelled_surgeries` bump for surgery).

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;

use common::Tick;

struct Entry<V> {
    inserted_at: Tick,
    value: V,
}

pub struct PendingList<K, V> {
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K: Eq + Hash + Clone, V> PendingList<K, V> {
    pub fn new() -> Self {
        PendingList {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, key: K, value: V, tick: Tick) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, Entry { inserted_at: tick, value });
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key)
            .map(|e| e.value)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(key)
    }

    /// Applies `f` to the value for `key`, if present, returning whatever
    /// `f` returns.
    pub fn with_mut<R>(&self, key: &K, f: impl FnOnce(&mut V) -> R) -> Option<R> {
        let mut guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        guard.get_mut(key).map(|e| f(&mut e.value))
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes and returns every entry inserted before `current_tick -
    /// max_age`.
    pub fn expire(&self, current_tick: Tick, max_age: Tick) -> Vec<(K, V)> {
        let mut guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let cutoff = current_tick.saturating_sub(max_age);
        let expired_keys: Vec<K> = guard
            .iter()
            .filter(|(_, e)| e.inserted_at < cutoff)
            .map(|(k, _)| k.clone())
            .collect();
        expired_keys
            .into_iter()
            .map(|k| {
                let entry = guard.remove(&k).expect("key just observed present");
                (k, entry.value)
            })
            .collect()
    }
}

impl<K: Eq + Hash + Clone, V> Default for PendingList<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_remove_round_trip() {
        let list: PendingList<u64, &str> = PendingList::new();
        list.insert(1, "patient-a", 0);
        assert!(list.contains(&1));
        assert_eq!(list.remove(&1), Some("patient-a"));
        assert!(!list.contains(&1));
    }

    #[test]
    fn expire_drops_only_entries_past_max_age() {
        let list: PendingList<u64, &str> = PendingList::new();
        list.insert(1, "old", 0);
        list.insert(2, "new", 7000);

        let expired = list.expire(8001, 8000);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].0, 1);
        assert!(list.contains(&2));
        assert!(!list.contains(&1));
    }

    #[test]
    fn with_mut_updates_in_place() {
        let list: PendingList<u64, (bool, bool)> = PendingList::new();
        list.insert(1, (false, false), 0);
        list.with_mut(&1, |flags| flags.0 = true);
        list.with_mut(&1, |flags| flags.1 = true);
        assert_eq!(list.remove(&1), Some((true, true)));
    }
}
