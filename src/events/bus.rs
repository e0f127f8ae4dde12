//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] shared by every
//! store created from one [`StoreContext`](crate::StoreContext).
//!
//! ## Architecture
//! ```text
//! Publishers (many):                   Consumers:
//!   LinkActor  (store A) ──┐
//!   LinkActor  (store B) ──┼──► Bus ──┬──► context listener ──► SubscriberSet ──► LogWriter, ...
//!   Store::set / registry ─┘          └──► StoreContext::events() receivers (tests, UIs)
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks; it calls `broadcast::Sender::send`.
//! - **Bounded capacity**: one ring buffer of recent events is shared by all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if there are no receivers at send time.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events.
///
/// Cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// If there are no receivers the event is dropped.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that observes events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn receivers_only_see_later_events() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::Connecting));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::Connected).with_store("status"));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::Connected);
        assert_eq!(ev.store.as_deref(), Some("status"));
    }
}
