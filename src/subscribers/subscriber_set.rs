//! # Event fan-out to [`Subscribe`] sinks.
//!
//! The context listener hands every bus event to [`SubscriberSet::emit`],
//! which copies it into one bounded queue per sink. Each queue is drained by
//! a worker task, so the listener (and therefore the link actors publishing
//! on the bus) never waits for a sink.
//!
//! ```text
//! listener ── emit(ev) ──┬─► queue(LogWriter) ─► worker ─► on_event
//!                        └─► queue(custom)    ─► worker ─► on_event
//!                               full? ──► SubscriberOverflow on the bus
//!                                              panic? ──► SubscriberPanicked on the bus
//! ```
//!
//! Overflow notices about overflow notices are not published, which keeps a
//! stuck sink from feeding the bus with its own reports.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::{runtime::Handle, sync::mpsc, task::JoinHandle};

use crate::events::{Bus, Event, panic_message};
use crate::subscribers::Subscribe;

/// Queue feeding one sink's worker.
struct Feed {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
}

/// Sinks attached to one context, each behind its own worker.
pub struct SubscriberSet {
    feeds: Vec<Feed>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Spawns one worker per sink on `runtime`.
    #[must_use]
    pub fn new(sinks: Vec<Arc<dyn Subscribe>>, bus: Bus, runtime: &Handle) -> Self {
        let mut feeds = Vec::with_capacity(sinks.len());
        let mut workers = Vec::with_capacity(sinks.len());

        for sink in sinks {
            let name = sink.name();
            let (tx, rx) = mpsc::channel::<Arc<Event>>(sink.queue_capacity().max(1));
            workers.push(runtime.spawn(drain(sink, rx, bus.clone())));
            feeds.push(Feed { name, tx });
        }
        Self {
            feeds,
            workers,
            bus,
        }
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }

    /// Queues `event` for every sink without waiting.
    pub fn emit(&self, event: Event) {
        let overflow_notice = event.is_subscriber_overflow();
        let event = Arc::new(event);

        for feed in &self.feeds {
            let reason = match feed.tx.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "queue full",
                Err(mpsc::error::TrySendError::Closed(_)) => "worker gone",
            };
            if !overflow_notice {
                self.bus.publish(Event::subscriber_overflow(feed.name, reason));
            }
        }
    }

    /// Closes every queue and waits until the workers have handled what was queued.
    pub async fn shutdown(self) {
        drop(self.feeds);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

/// Worker loop of one sink.
async fn drain(sink: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: Bus) {
    let name = sink.name();
    while let Some(ev) = rx.recv().await {
        let handled = AssertUnwindSafe(sink.on_event(&ev)).catch_unwind().await;
        if let Err(payload) = handled {
            bus.publish(Event::subscriber_panicked(name, panic_message(&*payload)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, ev: &Event) {
            self.seen.lock().unwrap().push(ev.kind);
        }
        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    struct Exploding;

    #[async_trait]
    impl Subscribe for Exploding {
        async fn on_event(&self, _ev: &Event) {
            panic!("boom");
        }
        fn name(&self) -> &'static str {
            "exploding"
        }
    }

    #[tokio::test]
    async fn delivers_in_order_and_isolates_panics() {
        let bus = Bus::new(16);
        let mut events = bus.subscribe();
        let recorder = Arc::new(Recorder::default());
        let set = SubscriberSet::new(
            vec![recorder.clone(), Arc::new(Exploding)],
            bus.clone(),
            &Handle::current(),
        );
        assert_eq!(set.len(), 2);

        set.emit(Event::new(EventKind::Connecting));
        set.emit(Event::new(EventKind::Connected));

        let ev = events.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::SubscriberPanicked);
        assert_eq!(ev.store.as_deref(), Some("exploding"));
        assert_eq!(ev.reason.as_deref(), Some("boom"));

        set.shutdown().await;
        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec![EventKind::Connecting, EventKind::Connected]
        );
    }
}
