//! # Connection event sinks.
//!
//! [`Subscribe`] is how applications watch the plumbing of a
//! [`StoreContext`](crate::StoreContext): reconnect storms, rejected frames,
//! dropped commands. Typical sinks are the built-in `LogWriter`, a metrics
//! exporter or a "server unreachable" banner.
//!
//! Sinks run off the store path. Every sink is fed by its own worker through a
//! queue of [`Subscribe::queue_capacity`] events; when that queue is full the
//! event is discarded for that sink only and `SubscriberOverflow` is
//! published. A panicking sink is reported as `SubscriberPanicked` and keeps
//! receiving later events.
//!
//! Sinks never see decoded values; register a value observer with
//! [`Store::subscribe`](crate::Store::subscribe) for that.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! use async_trait::async_trait;
//! use wirestate::{Event, EventKind, Subscribe};
//!
//! #[derive(Default)]
//! struct RejectCounter(AtomicU64);
//!
//! #[async_trait]
//! impl Subscribe for RejectCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::FrameRejected {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "reject-counter"
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Async sink for connection and frame events.
///
/// `on_event` is awaited on the sink's own worker, one event at a time and in
/// publication order. A slow sink only delays itself.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event.
    async fn on_event(&self, event: &Event);

    /// Name reported in `SubscriberOverflow` / `SubscriberPanicked` events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue depth for this sink's worker; values below 1 are raised to 1.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
