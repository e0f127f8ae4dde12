//! # Connection status aggregator with sequence-based ordering.
//!
//! Maintains the authoritative `connected` flag of every store that reports
//! its status, using event sequence numbers to handle out-of-order updates
//! from several link actors.
//!
//! ## Architecture
//! ```text
//! link session (store A) ── Connected / Disconnected ──┐
//! link session (store B) ── Connected / Disconnected ──┼──► StatusBoard::update()
//! Store detach / teardown ─ LinkStopped ───────────────┘           │
//!                                                                  ▼
//!                                                   HashMap<store, {last_seq, connected}>
//! ```
//!
//! ## Rules
//! - `Connected` sets the flag, `Disconnected` / `LinkStopped` clear it
//! - Other events are ignored
//! - Events with `seq <= last_seq` are **rejected** (stale)
//! - Reads are plain snapshots; they never block on network activity

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::events::{Event, EventKind};

/// Per-store state for ordering validation.
#[derive(Debug, Clone, Copy)]
struct StoreStatus {
    /// Last applied sequence number for this store.
    last_seq: u64,
    /// Current flag.
    connected: bool,
}

/// Thread-safe map of store name → connected flag.
///
/// ### Rules
/// - **Ordering**: events with `seq <= last_seq` are rejected
/// - **Scope**: only stores built with `report_status` ever appear here
#[derive(Debug, Default)]
pub struct StatusBoard {
    state: RwLock<HashMap<Arc<str>, StoreStatus>>,
}

impl StatusBoard {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a status event if it is newer than the last one seen for its store.
    ///
    /// Returns `true` if the flag was written.
    ///
    /// ```text
    /// update(Disconnected, seq=100) → connected=false, last_seq=100
    /// update(Connected,    seq=99)  → rejected (stale)
    /// ```
    pub fn update(&self, ev: &Event) -> bool {
        let connected = match ev.kind {
            EventKind::Connected => true,
            EventKind::Disconnected | EventKind::LinkStopped => false,
            _ => return false,
        };
        let Some(name) = ev.store.as_ref() else {
            return false;
        };

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let entry = state.entry(Arc::clone(name)).or_insert(StoreStatus {
            last_seq: 0,
            connected: false,
        });
        if ev.seq <= entry.last_seq {
            return false;
        }
        entry.last_seq = ev.seq;
        entry.connected = connected;
        true
    }

    /// Returns a sorted list of `(store, connected)` pairs.
    pub fn snapshot(&self) -> Vec<(Arc<str>, bool)> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let mut out: Vec<(Arc<str>, bool)> = state
            .iter()
            .map(|(name, st)| (Arc::clone(name), st.connected))
            .collect();
        out.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Returns true if the store is currently connected.
    pub fn is_connected(&self, store: &str) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(store)
            .is_some_and(|st| st.connected)
    }

    /// Returns true if at least one store reported and every reporting store is connected.
    pub fn all_connected(&self) -> bool {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        !state.is_empty() && state.values().all(|st| st.connected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(kind: EventKind, store: &str) -> Event {
        Event::new(kind).with_store(store)
    }

    #[test]
    fn stale_events_are_rejected() {
        let board = StatusBoard::new();
        let older = ev(EventKind::Connected, "a");
        let newer = ev(EventKind::Disconnected, "a");

        assert!(board.update(&newer));
        assert!(!board.update(&older));
        assert!(!board.is_connected("a"));
    }

    #[test]
    fn unrelated_events_do_not_touch_state() {
        let board = StatusBoard::new();
        assert!(!board.update(&ev(EventKind::BackoffScheduled, "a")));
        assert!(!board.update(&Event::new(EventKind::Connected)));
        assert!(board.snapshot().is_empty());
        assert!(!board.all_connected());
    }

    #[test]
    fn aggregates_multiple_stores() {
        let board = StatusBoard::new();
        board.update(&ev(EventKind::Connected, "b"));
        board.update(&ev(EventKind::Connected, "a"));
        assert!(board.all_connected());

        board.update(&ev(EventKind::LinkStopped, "b"));
        assert!(!board.all_connected());
        assert_eq!(
            board.snapshot(),
            vec![(Arc::from("a"), true), (Arc::from("b"), false)]
        );
    }

    #[test]
    fn concurrent_reports_keep_latest() {
        let board = Arc::new(StatusBoard::new());
        let events: Vec<Event> = (0..64)
            .map(|i| {
                let kind = if i % 2 == 0 {
                    EventKind::Connected
                } else {
                    EventKind::Disconnected
                };
                ev(kind, "s")
            })
            .collect();
        let last_is_connected = matches!(events[63].kind, EventKind::Connected);

        std::thread::scope(|scope| {
            for chunk in events.chunks(8).rev() {
                let board = Arc::clone(&board);
                scope.spawn(move || {
                    for e in chunk.iter().rev() {
                        board.update(e);
                    }
                });
            }
        });
        assert_eq!(board.is_connected("s"), last_is_connected);
    }
}
