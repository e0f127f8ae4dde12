//! # StoreContext: owns the connector, event fan-out and every store link.
//!
//! The [`StoreContext`] replaces module-level singleton stores: an
//! application builds one context (via [`ContextBuilder`](crate::ContextBuilder))
//! and asks it for stores. All stores of a context share the event bus, the
//! status board, the connector and the root cancellation token.
//!
//! ## High-level architecture
//! ```text
//! ContextBuilder::build()
//!   - Bus::new(cfg.bus_capacity)
//!   - SubscriberSet::new(subscribers [+ LogWriter])
//!   - listener task: Bus.subscribe() ─► SubscriberSet::emit(Event)
//!
//! StoreContext::store(spec)
//!   - validate ws:// / wss:// endpoint
//!   - Shared { settings, env } ─► Store façade
//!
//! First Store::subscribe
//!   └──► LinkActor (child token = root.child_token())
//!           └─ publish(Event) ─► Bus ─► listener ─► SubscriberSet ─► LogWriter, ...
//!
//! Shutdown path:
//!   shutdown::wait_for_signal()      (run_until_signal only)
//!             └─► Bus.publish(ShutdownRequested)
//!             └─► root.cancel()      → every link token is a child
//!             └─► halt every store   → Idle, LinkStopped
//!             └─► stop listener, drain queued events into subscribers
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::core::link::{Env, LinkControl, Settings, Shared};
use crate::core::{Config, StatusBoard, shutdown};
use crate::error::{RuntimeError, StoreError};
use crate::events::{Event, EventKind};
use crate::policies::SendPolicy;
use crate::store::{Store, StoreSpec};

/// Application context for synchronized stores.
pub struct StoreContext {
    cfg: Config,
    env: Arc<Env>,
    links: Mutex<Vec<Weak<dyn LinkControl>>>,
    listener: Mutex<Option<JoinHandle<()>>>,
    listener_stop: CancellationToken,
}

impl fmt::Debug for StoreContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreContext")
            .field("cfg", &self.cfg)
            .field("shut_down", &self.is_shut_down())
            .finish_non_exhaustive()
    }
}

impl StoreContext {
    pub(crate) fn new(
        cfg: Config,
        env: Arc<Env>,
        listener: Option<JoinHandle<()>>,
        listener_stop: CancellationToken,
    ) -> Self {
        Self {
            cfg,
            env,
            links: Mutex::new(Vec::new()),
            listener: Mutex::new(listener),
            listener_stop,
        }
    }

    /// Configuration this context was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Builds a store from its spec.
    ///
    /// Fails with [`StoreError::InvalidEndpoint`] unless the endpoint is an
    /// absolute `ws://` or `wss://` URL with a host, and with
    /// [`StoreError::ContextClosed`] after [`shutdown`](Self::shutdown).
    /// No connection is opened until the first observer subscribes.
    pub fn store<In, Out>(&self, spec: StoreSpec<In, Out>) -> Result<Store<In, Out>, StoreError>
    where
        In: Send + Sync + 'static,
        Out: 'static,
    {
        if self.env.root.is_cancelled() {
            return Err(StoreError::ContextClosed);
        }
        validate_endpoint(&spec.endpoint)?;

        let settings = Settings {
            name: spec.name,
            endpoint: Arc::from(spec.endpoint),
            decoder: spec.decoder,
            hooks: spec.hooks,
            send_policy: spec
                .send_policy
                .unwrap_or_else(|| SendPolicy::for_mode(spec.mode)),
            backoff: spec.backoff.unwrap_or_else(|| self.cfg.backoff.clone()),
            report_status: spec.report_status,
            seed: spec.seed,
        };
        let shared = Arc::new(Shared::new(settings, Arc::clone(&self.env), spec.initial));

        let control: Arc<dyn LinkControl> = shared.clone();
        {
            let mut links = self.links.lock().unwrap_or_else(PoisonError::into_inner);
            links.retain(|w| w.strong_count() > 0);
            links.push(Arc::downgrade(&control));
        }
        Ok(Store::new(shared, spec.mode, spec.encoder, spec.echo))
    }

    /// Receiver for every event published after this call.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.env.bus.subscribe()
    }

    /// Shared connection-status board.
    pub fn status(&self) -> Arc<StatusBoard> {
        Arc::clone(&self.env.status)
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has started.
    pub fn is_shut_down(&self) -> bool {
        self.env.root.is_cancelled()
    }

    /// Stops every link and flushes queued events to subscribers.
    ///
    /// Stores keep their cached values and observers, but no longer connect.
    /// Calling it again is a no-op.
    pub async fn shutdown(&self) {
        self.shutdown_with(None).await;
    }

    /// Waits for SIGINT / SIGTERM / SIGQUIT (Ctrl-C elsewhere), then shuts down.
    pub async fn run_until_signal(&self) -> Result<(), RuntimeError> {
        let signal = shutdown::wait_for_signal().await?;
        self.shutdown_with(Some(signal)).await;
        Ok(())
    }

    async fn shutdown_with(&self, signal: Option<&'static str>) {
        if !self.env.root.is_cancelled() {
            let mut ev = Event::new(EventKind::ShutdownRequested);
            if let Some(signal) = signal {
                ev = ev.with_reason(signal);
            }
            self.env.bus.publish(ev);
            self.halt_links();
        }

        self.listener_stop.cancel();
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = listener {
            let _ = handle.await;
        }
    }

    fn halt_links(&self) {
        self.env.root.cancel();
        let links = std::mem::take(&mut *self.links.lock().unwrap_or_else(PoisonError::into_inner));
        for link in links.iter().filter_map(Weak::upgrade) {
            link.halt();
        }
    }
}

impl Drop for StoreContext {
    fn drop(&mut self) {
        self.halt_links();
        self.listener_stop.cancel();
    }
}

fn validate_endpoint(endpoint: &str) -> Result<(), StoreError> {
    let invalid = |reason: String| StoreError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };
    let url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "ws" | "wss") {
        return Err(invalid(format!(
            "unsupported scheme {:?}, expected ws or wss",
            url.scheme()
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(())
}
