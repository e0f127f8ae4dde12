//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish connection lifecycle, frame and runtime events.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `LinkActor` (connect/close/backoff), link sessions
//!   (rejected frames, failed sends), `Store` (deferred/dropped sends, link
//!   start/stop), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the context listener (fans out to `SubscriberSet`),
//!   [`StoreContext::events`](crate::StoreContext::events) receivers.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
pub(crate) use event::panic_message;
