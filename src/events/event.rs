//! # Runtime events emitted by stores and their connection managers.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Link events**: a store gained its first observer or lost its last one
//! - **Connection events**: connect attempts, open/close, scheduled retries
//! - **Frame events**: rejected inbound frames, deferred/dropped/failed sends, seeding
//! - **Runtime events**: observer/subscriber panics, overflow, shutdown
//!
//! The [`Event`] struct carries the store name, attempt numbers, delays and reasons.
//!
//! ## Ordering
//! `seq` is taken from one process-wide counter at construction, so it is
//! unique and increasing across all contexts. [`StatusBoard`](crate::StatusBoard) relies on it to ignore stale connect/disconnect reports.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use wirestate::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::BackoffScheduled)
//!     .with_store("status")
//!     .with_attempt(3)
//!     .with_delay(Duration::from_secs(10));
//!
//! assert_eq!(ev.kind, EventKind::BackoffScheduled);
//! assert_eq!(ev.store.as_deref(), Some("status"));
//! assert_eq!(ev.delay_ms, Some(10_000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

static EVENT_SEQ: AtomicU64 = AtomicU64::new(1);

/// What an [`Event`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Link events ===
    /// First observer subscribed; a connection manager was started.
    ///
    /// Sets: `store`
    LinkStarted,

    /// Last observer left (or the store was torn down); timer cancelled, socket closed.
    ///
    /// Sets: `store`
    LinkStopped,

    // === Connection events ===
    /// A connect attempt is starting.
    ///
    /// Sets: `store`, `attempt` (1-based, per link)
    Connecting,

    /// The socket opened; the retry counter was reset.
    ///
    /// Sets: `store`, `attempt`
    Connected,

    /// The connect attempt failed.
    ///
    /// Sets: `store`, `attempt`, `reason`
    ConnectFailed,

    /// An open socket closed (remote close, error, or teardown).
    ///
    /// Sets: `store`, `reason`
    Disconnected,

    /// Reconnect timer armed.
    ///
    /// Sets: `store`, `attempt` (retry counter after increment), `delay_ms`
    BackoffScheduled,

    // === Frame events ===
    /// An inbound frame could not be decoded; the cached value is unchanged.
    ///
    /// Sets: `store`, `reason`
    FrameRejected,

    /// Outbound frame kept as the pending send until the socket opens.
    ///
    /// Sets: `store`, `reason` (`"replaced"` when an earlier pending frame was overwritten)
    SendDeferred,

    /// Outbound frame discarded because the socket is not open.
    ///
    /// Sets: `store`, `reason` (only when the frame was lost with a closing socket)
    SendDropped,

    /// Writing an outbound frame to an open socket failed.
    ///
    /// Sets: `store`, `reason`
    SendFailed,

    /// Initial value fetched from the companion HTTP endpoint was applied.
    ///
    /// Sets: `store`, `attempt`
    SeedApplied,

    /// Companion HTTP fetch (or its decode) failed.
    ///
    /// Sets: `store`, `attempt`, `reason`
    SeedFailed,

    // === Runtime events ===
    /// A value observer panicked during fan-out.
    ///
    /// Sets: `store`, `reason`
    ObserverPanicked,

    /// An event subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `store` (subscriber name), `reason`
    SubscriberOverflow,

    /// An event subscriber panicked while handling an event.
    ///
    /// Sets: `store` (subscriber name), `reason`
    SubscriberPanicked,

    /// Shutdown requested (OS signal or explicit call).
    ShutdownRequested,
}

impl EventKind {
    /// Short stable label (snake_case) for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::LinkStarted => "link_started",
            EventKind::LinkStopped => "link_stopped",
            EventKind::Connecting => "connecting",
            EventKind::Connected => "connected",
            EventKind::ConnectFailed => "connect_failed",
            EventKind::Disconnected => "disconnected",
            EventKind::BackoffScheduled => "backoff_scheduled",
            EventKind::FrameRejected => "frame_rejected",
            EventKind::SendDeferred => "send_deferred",
            EventKind::SendDropped => "send_dropped",
            EventKind::SendFailed => "send_failed",
            EventKind::SeedApplied => "seed_applied",
            EventKind::SeedFailed => "seed_failed",
            EventKind::ObserverPanicked => "observer_panicked",
            EventKind::SubscriberOverflow => "subscriber_overflow",
            EventKind::SubscriberPanicked => "subscriber_panicked",
            EventKind::ShutdownRequested => "shutdown_requested",
        }
    }
}

/// One thing that happened to a store link or to the event plumbing.
///
/// Which optional fields are filled depends on [`EventKind`]; see the
/// `Sets:` line on each variant.
#[derive(Clone, Debug)]
pub struct Event {
    /// Process-wide publication order.
    pub seq: u64,
    pub at: SystemTime,
    pub kind: EventKind,
    /// Store name; subscriber name for `Subscriber*` kinds.
    pub store: Option<Arc<str>>,
    pub attempt: Option<u32>,
    /// Reconnect or seed delay, saturated at `u32::MAX` ms.
    pub delay_ms: Option<u32>,
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Stamps a fresh event with the next `seq` and the current time.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            store: None,
            attempt: None,
            delay_ms: None,
            reason: None,
        }
    }

    pub fn with_store(self, store: impl Into<Arc<str>>) -> Self {
        Self {
            store: Some(store.into()),
            ..self
        }
    }

    pub fn with_attempt(self, attempt: u32) -> Self {
        Self {
            attempt: Some(attempt),
            ..self
        }
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        let ms = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        Self {
            delay_ms: Some(ms),
            ..self
        }
    }

    pub fn with_reason(self, reason: impl Into<Arc<str>>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..self
        }
    }

    /// `delay_ms` as a [`Duration`].
    pub fn delay(&self) -> Option<Duration> {
        self.delay_ms.map(|ms| Duration::from_millis(u64::from(ms)))
    }

    pub(crate) fn subscriber_overflow(sink: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_store(sink)
            .with_reason(reason)
    }

    pub(crate) fn subscriber_panicked(sink: &'static str, message: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_store(sink)
            .with_reason(message)
    }

    pub(crate) fn is_subscriber_overflow(&self) -> bool {
        self.kind == EventKind::SubscriberOverflow
    }
}

/// Extracts a readable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
