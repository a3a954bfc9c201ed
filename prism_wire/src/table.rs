//! Owner side table.
//!
//! Maps `owner → slot → wire` outside the owners themselves. Owners are held
//! weakly: the table never keeps an owner alive, and entries whose owner has
//! been released are swept once the table grows past a threshold (or on
//! [`WireTable::purge`]).
//!
//! Each slot is an `Arc<OnceCell<T>>`. The table lock only covers finding or
//! creating the cell; construction runs on the cell, so exactly one
//! initializer runs per `(owner, slot)` and concurrent first accesses wait
//! for it.

use crate::error::{ConfigurationError, WireResult};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use prism_runtime::{PyObject, Value, object_address};
use rustc_hash::FxHashMap;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Identifies one wired member within a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WireSlot {
    /// Identity of the rope that owns the slot.
    rope: usize,
    /// Slot name, e.g. `__wire|Cache|get`.
    name: Arc<str>,
}

impl WireSlot {
    /// Create a slot identifier.
    pub fn new(rope: usize, name: Arc<str>) -> Self {
        Self { rope, name }
    }

    /// The slot name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

struct OwnerEntry<T> {
    owner: Weak<dyn PyObject>,
    slots: FxHashMap<WireSlot, Arc<OnceCell<T>>>,
}

impl<T> OwnerEntry<T> {
    #[inline]
    fn is_alive(&self) -> bool {
        self.owner.strong_count() > 0
    }
}

struct TableState<T> {
    owners: FxHashMap<usize, OwnerEntry<T>>,
    next_sweep: usize,
}

/// Side table from owners to their wires.
pub struct WireTable<T> {
    state: Mutex<TableState<T>>,
    sweep_threshold: usize,
}

impl<T: Clone> WireTable<T> {
    /// Create an empty table that first sweeps at `sweep_threshold` owners.
    pub fn new(sweep_threshold: usize) -> Self {
        let sweep_threshold = sweep_threshold.max(1);
        Self {
            state: Mutex::new(TableState {
                owners: FxHashMap::default(),
                next_sweep: sweep_threshold,
            }),
            sweep_threshold,
        }
    }

    /// Look up an existing wire.
    pub fn get(&self, owner: &Value, slot: &WireSlot) -> Option<T> {
        let address = owner.identity()?;
        let state = self.state.lock();
        state
            .owners
            .get(&address)
            .filter(|entry| entry.is_alive())?
            .slots
            .get(slot)?
            .get()
            .cloned()
    }

    /// Look up the wire for `(owner, slot)`, constructing it with `init` if
    /// absent.
    ///
    /// A failed `init` leaves the slot empty so a later access retries.
    pub fn get_or_try_init<F>(&self, owner: &Value, slot: &WireSlot, init: F) -> WireResult<T>
    where
        F: FnOnce() -> WireResult<T>,
    {
        let obj = owner
            .as_object()
            .ok_or_else(|| ConfigurationError::InvalidOwner {
                type_name: owner.type_name().to_owned(),
            })?;

        let (cell, swept) = {
            let mut state = self.state.lock();
            let entry = state
                .owners
                .entry(object_address(obj))
                .or_insert_with(|| OwnerEntry {
                    owner: Arc::downgrade(obj),
                    slots: FxHashMap::default(),
                });
            let cell = entry.slots.entry(slot.clone()).or_default().clone();

            let swept = if state.owners.len() >= state.next_sweep {
                self.sweep_locked(&mut state)
            } else {
                Vec::new()
            };
            (cell, swept)
        };
        // Released wires drop outside the lock.
        drop(swept);

        cell.get_or_try_init(init).cloned()
    }

    /// Remove every wire held for `owner`. Returns the number removed.
    pub fn evict(&self, owner: &Value) -> usize {
        let Some(address) = owner.identity() else {
            return 0;
        };
        let removed = self.state.lock().owners.remove(&address);
        removed.map_or(0, |entry| {
            entry.slots.values().filter(|cell| cell.get().is_some()).count()
        })
    }

    /// Remove the wire for one `(owner, slot)`.
    pub fn evict_slot(&self, owner: &Value, slot: &WireSlot) -> bool {
        let Some(address) = owner.identity() else {
            return false;
        };
        let removed = self
            .state
            .lock()
            .owners
            .get_mut(&address)
            .and_then(|entry| entry.slots.remove(slot));
        removed.is_some()
    }

    /// Remove the wire for one `(owner, slot)` if `stale` holds for it.
    ///
    /// Concurrent callers that both observe the same stale wire remove it
    /// once; the second sees the replacement and keeps it.
    pub fn evict_slot_if<P>(&self, owner: &Value, slot: &WireSlot, stale: P) -> bool
    where
        P: FnOnce(&T) -> bool,
    {
        let Some(address) = owner.identity() else {
            return false;
        };
        let removed = {
            let mut state = self.state.lock();
            let Some(entry) = state.owners.get_mut(&address) else {
                return false;
            };
            let is_stale = entry
                .slots
                .get(slot)
                .and_then(|cell| cell.get())
                .is_some_and(stale);
            if is_stale { entry.slots.remove(slot) } else { None }
        };
        removed.is_some()
    }

    /// Drop the entries of every released owner. Returns how many owners
    /// were dropped.
    pub fn purge(&self) -> usize {
        let swept = {
            let mut state = self.state.lock();
            self.sweep_locked(&mut state)
        };
        swept.len()
    }

    fn sweep_locked(&self, state: &mut TableState<T>) -> Vec<OwnerEntry<T>> {
        let dead: Vec<usize> = state
            .owners
            .iter()
            .filter(|(_, entry)| !entry.is_alive())
            .map(|(address, _)| *address)
            .collect();
        let swept: Vec<OwnerEntry<T>> = dead
            .iter()
            .filter_map(|address| state.owners.remove(address))
            .collect();
        state.next_sweep = (state.owners.len() * 2).max(self.sweep_threshold);
        debug!(
            swept = swept.len(),
            live = state.owners.len(),
            next_sweep = state.next_sweep,
            "swept wire table"
        );
        swept
    }

    /// Number of tracked owners, including released ones not yet swept.
    pub fn len(&self) -> usize {
        self.state.lock().owners.len()
    }

    /// Check whether no owner is tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of initialized wires across all owners.
    pub fn wire_count(&self) -> usize {
        self.state
            .lock()
            .owners
            .values()
            .flat_map(|entry| entry.slots.values())
            .filter(|cell| cell.get().is_some())
            .count()
    }
}

impl<T> std::fmt::Debug for WireTable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WireTable")
            .field("owners", &self.state.lock().owners.len())
            .field("sweep_threshold", &self.sweep_threshold)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WireError;
    use prism_runtime::{PyClassObject, PyInstance};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn slot(name: &str) -> WireSlot {
        WireSlot::new(1, Arc::from(name))
    }

    fn instance() -> Value {
        let class = PyClassObject::new_simple("Owner");
        Value::object(PyInstance::new(&class))
    }

    #[test]
    fn test_init_runs_once_per_slot() {
        let table: WireTable<usize> = WireTable::new(64);
        let owner = instance();
        let calls = AtomicUsize::new(0);
        let init = || {
            Ok(calls.fetch_add(1, Ordering::SeqCst) + 100)
        };

        assert_eq!(table.get_or_try_init(&owner, &slot("a"), init).unwrap(), 100);
        assert_eq!(table.get_or_try_init(&owner, &slot("a"), init).unwrap(), 100);
        assert_eq!(table.get_or_try_init(&owner, &slot("b"), init).unwrap(), 101);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(table.get(&owner, &slot("a")), Some(100));
        assert_eq!(table.wire_count(), 2);
    }

    #[test]
    fn test_owners_are_distinct() {
        let table: WireTable<&'static str> = WireTable::new(64);
        let (a, b) = (instance(), instance());
        table.get_or_try_init(&a, &slot("m"), || Ok("a")).unwrap();
        assert_eq!(table.get(&b, &slot("m")), None);
        assert_eq!(table.get_or_try_init(&b, &slot("m"), || Ok("b")).unwrap(), "b");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_failed_init_retries() {
        let table: WireTable<i32> = WireTable::new(64);
        let owner = instance();
        let failed = table.get_or_try_init(&owner, &slot("m"), || {
            Err(ConfigurationError::InvalidOwner {
                type_name: "test".to_owned(),
            }
            .into())
        });
        assert!(failed.is_err());
        assert_eq!(table.get_or_try_init(&owner, &slot("m"), || Ok(7)).unwrap(), 7);
    }

    #[test]
    fn test_immediate_owner_is_rejected() {
        let table: WireTable<i32> = WireTable::new(64);
        let err = table
            .get_or_try_init(&Value::int(1), &slot("m"), || Ok(1))
            .unwrap_err();
        assert!(matches!(
            err,
            WireError::Configuration(ConfigurationError::InvalidOwner { .. })
        ));
    }

    #[test]
    fn test_evict() {
        let table: WireTable<i32> = WireTable::new(64);
        let owner = instance();
        table.get_or_try_init(&owner, &slot("a"), || Ok(1)).unwrap();
        table.get_or_try_init(&owner, &slot("b"), || Ok(2)).unwrap();

        assert!(table.evict_slot(&owner, &slot("a")));
        assert_eq!(table.get(&owner, &slot("a")), None);
        assert_eq!(table.evict(&owner), 1);
        assert!(table.is_empty());
        assert_eq!(table.evict(&owner), 0);
    }

    #[test]
    fn test_evict_counts_only_built_wires() {
        let table: WireTable<i32> = WireTable::new(64);
        let owner = instance();
        table.get_or_try_init(&owner, &slot("a"), || Ok(1)).unwrap();
        let failed = table.get_or_try_init(&owner, &slot("b"), || {
            Err(ConfigurationError::InvalidOwner {
                type_name: "test".to_owned(),
            }
            .into())
        });
        assert!(failed.is_err());
        assert_eq!(table.evict(&owner), 1);
    }

    #[test]
    fn test_evict_slot_if_checks_current_wire() {
        let table: WireTable<i32> = WireTable::new(64);
        let owner = instance();
        table.get_or_try_init(&owner, &slot("m"), || Ok(1)).unwrap();

        assert!(!table.evict_slot_if(&owner, &slot("m"), |&wire| wire == 2));
        assert_eq!(table.get(&owner, &slot("m")), Some(1));
        assert!(table.evict_slot_if(&owner, &slot("m"), |&wire| wire == 1));
        assert_eq!(table.get(&owner, &slot("m")), None);
        assert!(!table.evict_slot_if(&owner, &slot("other"), |_| true));
    }

    #[test]
    fn test_released_owners_are_swept() {
        let table: WireTable<i32> = WireTable::new(4);
        let keep = instance();
        table.get_or_try_init(&keep, &slot("m"), || Ok(0)).unwrap();
        for i in 0..10 {
            let transient = instance();
            table.get_or_try_init(&transient, &slot("m"), || Ok(i)).unwrap();
        }
        assert!(table.len() < 11);

        table.purge();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&keep, &slot("m")), Some(0));
    }

    #[test]
    fn test_concurrent_first_access_builds_once() {
        let table: Arc<WireTable<usize>> = Arc::new(WireTable::new(64));
        let owner = instance();
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let table = table.clone();
                let owner = owner.clone();
                let calls = calls.clone();
                std::thread::spawn(move || {
                    table
                        .get_or_try_init(&owner, &slot("m"), || {
                            std::thread::sleep(std::time::Duration::from_millis(5));
                            Ok(calls.fetch_add(1, Ordering::SeqCst))
                        })
                        .unwrap()
                })
            })
            .collect();

        let results: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.iter().all(|&r| r == 0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
