//! # LogWriter: events to `tracing`
//!
//! A subscriber that turns every [`Event`] into a `tracing` record. The
//! library never installs a global tracing subscriber; the host application
//! decides where records go.
//!
//! ## Levels
//! ```text
//! warn   connect_failed, frame_rejected, send_failed, seed_failed, *_panicked, subscriber_overflow
//! info   connected, disconnected, shutdown_requested
//! debug  everything else (link start/stop, connecting, backoff, deferred/dropped sends, seeding)
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let store = e.store.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        let label = e.kind.as_label();

        match e.kind {
            EventKind::ConnectFailed
            | EventKind::FrameRejected
            | EventKind::SendFailed
            | EventKind::SeedFailed
            | EventKind::ObserverPanicked
            | EventKind::SubscriberPanicked
            | EventKind::SubscriberOverflow => {
                warn!(store, attempt = e.attempt, reason, "{label}");
            }
            EventKind::Connected | EventKind::Disconnected | EventKind::ShutdownRequested => {
                info!(store, attempt = e.attempt, reason, "{label}");
            }
            EventKind::BackoffScheduled => {
                debug!(store, retry = e.attempt, delay_ms = e.delay_ms, "{label}");
            }
            EventKind::LinkStarted
            | EventKind::LinkStopped
            | EventKind::Connecting
            | EventKind::SendDeferred
            | EventKind::SendDropped
            | EventKind::SeedApplied => {
                debug!(store, attempt = e.attempt, reason, "{label}");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
