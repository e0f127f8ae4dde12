//! # Observer registry.
//!
//! Holds the value observers of one store, keyed by a per-store id.
//!
//! ## Rules
//! - Fan-out works on a **snapshot** of entries taken under the store lock;
//!   observers run after the lock is released, so an observer may subscribe,
//!   unsubscribe or `set` on the same store.
//! - Every entry remembers the newest value version it has seen. A delivery
//!   with an older version is skipped, so an observer never goes backwards
//!   even when its initial delivery races with an inbound frame.
//! - A panicking observer is isolated: the panic is caught and reported, and
//!   the remaining observers still run.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::events::panic_message;

/// Value callback.
pub(crate) type Observer<In> = Arc<dyn Fn(&In) + Send + Sync>;

/// One registered observer.
pub(crate) struct Entry<In> {
    pub id: u64,
    observer: Observer<In>,
    /// `version + 1` of the newest value delivered; `0` before the first delivery.
    seen: AtomicU64,
}

impl<In> Entry<In> {
    /// Calls the observer unless it already saw `version` or a newer value.
    ///
    /// Returns the panic message if the observer panicked.
    pub fn deliver(&self, value: &In, version: u64) -> Option<String> {
        if self.seen.fetch_max(version + 1, Ordering::AcqRel) > version {
            return None;
        }
        catch_unwind(AssertUnwindSafe(|| (self.observer)(value)))
            .err()
            .map(|payload| panic_message(&*payload))
    }
}

/// Ordered set of observers.
pub(crate) struct Registry<In> {
    next_id: u64,
    entries: Vec<Arc<Entry<In>>>,
}

impl<In> Registry<In> {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            entries: Vec::new(),
        }
    }

    /// Registers an observer and returns its entry.
    pub fn add(&mut self, observer: Observer<In>) -> Arc<Entry<In>> {
        let entry = Arc::new(Entry {
            id: self.next_id,
            observer,
            seen: AtomicU64::new(0),
        });
        self.next_id += 1;
        self.entries.push(Arc::clone(&entry));
        entry
    }

    /// Removes an observer. Returns `false` if it was already gone.
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in registration order, for fan-out outside the lock.
    pub fn snapshot(&self) -> Vec<Arc<Entry<In>>> {
        self.entries.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recording() -> (Observer<i32>, Arc<Mutex<Vec<i32>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (Arc::new(move |v: &i32| sink.lock().unwrap().push(*v)), seen)
    }

    #[test]
    fn remove_is_idempotent() {
        let mut reg = Registry::new();
        let (obs, _) = recording();
        let a = reg.add(Arc::clone(&obs));
        let b = reg.add(obs);
        assert_ne!(a.id, b.id);

        assert!(reg.remove(a.id));
        assert!(!reg.remove(a.id));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn older_versions_are_skipped() {
        let mut reg = Registry::new();
        let (obs, seen) = recording();
        let entry = reg.add(obs);

        assert!(entry.deliver(&2, 2).is_none());
        entry.deliver(&1, 1);
        entry.deliver(&2, 2);
        entry.deliver(&3, 3);
        assert_eq!(*seen.lock().unwrap(), vec![2, 3]);
    }

    #[test]
    fn panics_are_reported_not_propagated() {
        let mut reg: Registry<i32> = Registry::new();
        let entry = reg.add(Arc::new(|_: &i32| panic!("bad observer")));
        assert_eq!(entry.deliver(&0, 0).as_deref(), Some("bad observer"));
    }

    #[test]
    fn snapshot_is_detached_from_registry() {
        let mut reg = Registry::new();
        let (obs, _) = recording();
        let a = reg.add(obs);
        let snap = reg.snapshot();
        reg.remove(a.id);
        assert_eq!(snap.len(), 1);
        assert!(reg.is_empty());
    }
}
