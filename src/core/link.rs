//! # Shared per-store state.
//!
//! [`Shared`] is the meeting point between the [`Store`](crate::Store) façade
//! (called from any thread) and the link actor (one tokio task per live
//! connection). Everything mutable sits behind one short `std::sync::Mutex`
//! critical section; the lock is never held across an `.await` or while an
//! observer runs.
//!
//! ## Generations
//! Every link start bumps `generation`. Actor-side transitions carry the
//! generation they were started with and are ignored once a newer link (or
//! no link) is current, so a slow actor can never overwrite newer state.
//!
//! ```text
//! subscribe (first) ──► start_link: gen+1, Connecting, spawn LinkActor(gen)
//! detach (last)     ──► stop_link:  cancel token, Idle, LinkStopped
//! actor(gen)        ──► enter_connecting / enter_open / enter_closed  (no-op if gen is stale)
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::bootstrap::SeedSource;
use crate::codec::Decode;
use crate::core::actor::LinkActor;
use crate::core::registry::{Entry, Observer, Registry};
use crate::core::status::StatusBoard;
use crate::events::{Bus, Event, EventKind};
use crate::policies::{BackoffPolicy, SendPolicy};
use crate::store::Hook;
use crate::transport::Connector;

/// Lifecycle of one store's connection.
///
/// ```text
/// Idle ──first observer──► Connecting ──open──► Open
///  ▲                          ▲                  │ close / error
///  │ last observer leaves     └─── timer ─── Closed (awaiting retry)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No observers, no socket, no timer.
    Idle,
    /// A connect attempt is in flight.
    Connecting,
    /// The socket is open; `set` sends immediately.
    Open,
    /// The socket closed (or never opened); a reconnect timer is armed.
    Closed,
}

impl ConnectionState {
    /// Short stable label (snake_case) for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
        }
    }
}

/// Context-wide services every link needs.
pub(crate) struct Env {
    pub bus: Bus,
    pub status: Arc<StatusBoard>,
    pub connector: Arc<dyn Connector>,
    pub runtime: Handle,
    pub root: CancellationToken,
    pub seed_attempts: u32,
    pub seed_timeout: Option<Duration>,
}

/// Optional async callbacks around the socket lifecycle.
#[derive(Clone, Default)]
pub(crate) struct Hooks {
    pub before_open: Option<Arc<dyn Hook>>,
    pub on_open: Option<Arc<dyn Hook>>,
    pub on_close: Option<Arc<dyn Hook>>,
}

/// Immutable per-store settings.
pub(crate) struct Settings<In> {
    pub name: Arc<str>,
    pub endpoint: Arc<str>,
    pub decoder: Arc<dyn Decode<In>>,
    pub hooks: Hooks,
    pub send_policy: SendPolicy,
    pub backoff: BackoffPolicy,
    pub report_status: bool,
    pub seed: Option<Arc<dyn SeedSource>>,
}

/// Handle to the running actor.
struct Link {
    generation: u64,
    token: CancellationToken,
    outbound: mpsc::UnboundedSender<String>,
}

struct Inner<In> {
    cached: Arc<In>,
    version: u64,
    observers: Registry<In>,
    state: ConnectionState,
    link: Option<Link>,
    pending: Option<String>,
    generation: u64,
}

/// Outcome of handing an outbound frame to the link.
enum Dispatch {
    Sent,
    Deferred { replaced: bool },
    Dropped,
}

/// State shared between a store façade and its link actor.
pub(crate) struct Shared<In> {
    pub settings: Settings<In>,
    pub env: Arc<Env>,
    inner: Mutex<Inner<In>>,
}

impl<In: Send + Sync + 'static> Shared<In> {
    pub fn new(settings: Settings<In>, env: Arc<Env>, initial: In) -> Self {
        Self {
            settings,
            env,
            inner: Mutex::new(Inner {
                cached: Arc::new(initial),
                version: 0,
                observers: Registry::new(),
                state: ConnectionState::Idle,
                link: None,
                pending: None,
                generation: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<In>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn name(&self) -> &Arc<str> {
        &self.settings.name
    }

    /// Builds an event tagged with this store's name.
    pub fn event(&self, kind: EventKind) -> Event {
        Event::new(kind).with_store(Arc::clone(&self.settings.name))
    }

    pub fn publish(&self, ev: Event) {
        self.env.bus.publish(ev);
    }

    fn report(&self, ev: &Event) {
        if self.settings.report_status {
            self.env.status.update(ev);
        }
    }

    // ---- façade side ----

    pub fn get(&self) -> Arc<In> {
        Arc::clone(&self.lock().cached)
    }

    pub fn state(&self) -> ConnectionState {
        self.lock().state
    }

    pub fn observer_count(&self) -> usize {
        self.lock().observers.len()
    }

    #[cfg(test)]
    pub fn pending(&self) -> Option<String> {
        self.lock().pending.clone()
    }

    /// Registers an observer, delivers the cached value, then starts the link if needed.
    pub fn subscribe(self: &Arc<Self>, observer: Observer<In>) -> u64 {
        let (entry, value, version) = {
            let mut inner = self.lock();
            let entry = inner.observers.add(observer);
            (entry, Arc::clone(&inner.cached), inner.version)
        };
        self.deliver(&entry, &value, version);

        {
            let mut inner = self.lock();
            if inner.link.is_none() && !inner.observers.is_empty() {
                self.start_link(&mut inner);
            }
        }
        entry.id
    }

    /// Removes an observer; the last one out stops the link.
    pub fn detach(&self, id: u64) {
        let stopped = {
            let mut inner = self.lock();
            if !inner.observers.remove(id) || !inner.observers.is_empty() {
                return;
            }
            self.stop_link(&mut inner)
        };
        if let Some(ev) = stopped {
            self.publish(ev);
        }
    }

    /// Drops every observer and stops the link.
    pub fn teardown(&self) {
        let stopped = {
            let mut inner = self.lock();
            inner.observers.clear();
            self.stop_link(&mut inner)
        };
        if let Some(ev) = stopped {
            self.publish(ev);
        }
    }

    /// Stops the link but keeps observers (context shutdown).
    pub fn halt(&self) {
        let stopped = {
            let mut inner = self.lock();
            self.stop_link(&mut inner)
        };
        if let Some(ev) = stopped {
            self.publish(ev);
        }
    }

    fn start_link(self: &Arc<Self>, inner: &mut Inner<In>) {
        if self.env.root.is_cancelled() {
            return;
        }
        inner.generation += 1;
        let generation = inner.generation;
        let token = self.env.root.child_token();
        let (outbound, rx) = mpsc::unbounded_channel();
        inner.link = Some(Link {
            generation,
            token: token.clone(),
            outbound,
        });
        inner.state = ConnectionState::Connecting;
        self.publish(self.event(EventKind::LinkStarted));

        let actor = LinkActor::new(Arc::clone(self), generation, token, rx);
        self.env.runtime.spawn(actor.run());
    }

    fn stop_link(&self, inner: &mut Inner<In>) -> Option<Event> {
        let link = inner.link.take()?;
        link.token.cancel();
        inner.state = ConnectionState::Idle;
        let ev = self.event(EventKind::LinkStopped);
        self.report(&ev);
        Some(ev)
    }

    /// Sends now if open, otherwise applies the send policy.
    pub fn dispatch(&self, frame: String) {
        let outcome = {
            let mut inner = self.lock();
            let unsent = match (&inner.link, inner.state) {
                (Some(link), ConnectionState::Open) => link.outbound.send(frame).err().map(|e| e.0),
                _ => Some(frame),
            };
            match (unsent, self.settings.send_policy) {
                (None, _) => Dispatch::Sent,
                (Some(frame), SendPolicy::Defer) => Dispatch::Deferred {
                    replaced: inner.pending.replace(frame).is_some(),
                },
                (Some(_), SendPolicy::Drop) => Dispatch::Dropped,
            }
        };

        match outcome {
            Dispatch::Sent => {}
            Dispatch::Deferred { replaced } => {
                let mut ev = self.event(EventKind::SendDeferred);
                if replaced {
                    ev = ev.with_reason("replaced");
                }
                self.publish(ev);
            }
            Dispatch::Dropped => self.publish(self.event(EventKind::SendDropped)),
        }
    }

    /// Replaces the cached value and notifies every observer.
    pub fn accept(&self, value: In) {
        let (value, version, entries) = {
            let mut inner = self.lock();
            inner.version += 1;
            inner.cached = Arc::new(value);
            (
                Arc::clone(&inner.cached),
                inner.version,
                inner.observers.snapshot(),
            )
        };
        self.fan_out(&entries, &value, version);
    }

    /// Like [`accept`](Self::accept), but only if nothing was accepted since `baseline`.
    pub fn accept_if_unchanged(&self, value: In, baseline: u64) -> bool {
        let (value, version, entries) = {
            let mut inner = self.lock();
            if inner.version != baseline {
                return false;
            }
            inner.version += 1;
            inner.cached = Arc::new(value);
            (
                Arc::clone(&inner.cached),
                inner.version,
                inner.observers.snapshot(),
            )
        };
        self.fan_out(&entries, &value, version);
        true
    }

    pub fn version(&self) -> u64 {
        self.lock().version
    }

    fn fan_out(&self, entries: &[Arc<Entry<In>>], value: &In, version: u64) {
        for entry in entries {
            self.deliver(entry, value, version);
        }
    }

    fn deliver(&self, entry: &Entry<In>, value: &In, version: u64) {
        if let Some(msg) = entry.deliver(value, version) {
            self.publish(self.event(EventKind::ObserverPanicked).with_reason(msg));
        }
    }

    /// Decodes one inbound frame; a bad frame is reported and skipped.
    pub fn ingest(&self, raw: &str) {
        match self.settings.decoder.decode(raw) {
            Ok(value) => self.accept(value),
            Err(e) => self.publish(
                self.event(EventKind::FrameRejected)
                    .with_reason(e.to_string()),
            ),
        }
    }

    // ---- actor side ----

    fn is_current(inner: &Inner<In>, generation: u64) -> bool {
        inner
            .link
            .as_ref()
            .is_some_and(|l| l.generation == generation)
    }

    /// `Closed → Connecting`. Returns `false` if this link is no longer current.
    pub fn enter_connecting(&self, generation: u64) -> bool {
        let mut inner = self.lock();
        if !Self::is_current(&inner, generation) {
            return false;
        }
        inner.state = ConnectionState::Connecting;
        true
    }

    /// `Connecting → Open`. Returns the pending frame to flush, or `None` if stale.
    pub fn enter_open(&self, generation: u64, attempt: u32) -> Option<Option<String>> {
        let (pending, ev) = {
            let mut inner = self.lock();
            if !Self::is_current(&inner, generation) {
                return None;
            }
            inner.state = ConnectionState::Open;
            let ev = self.event(EventKind::Connected).with_attempt(attempt);
            self.report(&ev);
            (inner.pending.take(), ev)
        };
        self.publish(ev);
        Some(pending)
    }

    /// `Open → Closed` after a session ends.
    ///
    /// Frames still queued for the dead socket fall back to the send policy:
    /// under `Defer` the newest one becomes the pending frame unless a newer
    /// `set` already replaced it; under `Drop` each one is reported as
    /// `SendDropped`.
    pub fn enter_closed_after_session(
        &self,
        generation: u64,
        outbound: &mut mpsc::UnboundedReceiver<String>,
        reason: &str,
    ) {
        let (dropped, ev) = {
            let mut inner = self.lock();
            let mut unsent: Vec<String> = std::iter::from_fn(|| outbound.try_recv().ok()).collect();
            if self.settings.send_policy == SendPolicy::Defer {
                unsent = unsent.pop().into_iter().collect();
            }
            let dropped: Vec<Event> = unsent
                .into_iter()
                .filter_map(|frame| self.requeue_locked(&mut inner, frame))
                .collect();

            let ev = self.event(EventKind::Disconnected).with_reason(reason);
            if Self::is_current(&inner, generation) {
                inner.state = ConnectionState::Closed;
                self.report(&ev);
            }
            (dropped, ev)
        };
        for dropped in dropped {
            self.publish(dropped);
        }
        self.publish(ev);
    }

    /// Marks a failed connect attempt as awaiting retry.
    pub fn enter_closed(&self, generation: u64) -> bool {
        let mut inner = self.lock();
        if !Self::is_current(&inner, generation) {
            return false;
        }
        inner.state = ConnectionState::Closed;
        true
    }

    /// Puts back a frame the socket failed to write.
    pub fn requeue(&self, frame: String) {
        let dropped = {
            let mut inner = self.lock();
            self.requeue_locked(&mut inner, frame)
        };
        if let Some(ev) = dropped {
            self.publish(ev);
        }
    }

    /// Applies the send policy to a frame that never reached the socket.
    ///
    /// Returns the `SendDropped` event to publish once the lock is released.
    fn requeue_locked(&self, inner: &mut Inner<In>, frame: String) -> Option<Event> {
        match self.settings.send_policy {
            SendPolicy::Defer => {
                if inner.pending.is_none() {
                    inner.pending = Some(frame);
                }
                None
            }
            SendPolicy::Drop => Some(
                self.event(EventKind::SendDropped)
                    .with_reason("socket closed before send"),
            ),
        }
    }
}

/// Type-erased link control, so handles can outlive the value type.
pub(crate) trait LinkControl: Send + Sync {
    fn detach(&self, id: u64);
    fn halt(&self);
}

impl<In: Send + Sync + 'static> LinkControl for Shared<In> {
    fn detach(&self, id: u64) {
        Shared::detach(self, id);
    }

    fn halt(&self) {
        Shared::halt(self);
    }
}
