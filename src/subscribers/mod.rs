//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`]
//! fan-out used by [`StoreContext`](crate::StoreContext) to hand runtime
//! events to user code.
//!
//! ## Architecture
//! ```text
//! LinkActor ── publish(Event) ──► Bus ──► context listener ──► SubscriberSet::emit
//!                                                                  │
//!                                                   ┌──────────────┼─────────┐
//!                                                   ▼              ▼         ▼
//!                                               LogWriter       Metrics    Custom
//! ```
//!
//! The built-in [`LogWriter`] is installed automatically when
//! [`Config::log_events`](crate::Config::log_events) is set (feature `logging`).

#[cfg(feature = "logging")]
mod log;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
