//! # LinkActor: one store's connection manager.
//!
//! Owns the reconnect loop of a single link (one store, one generation):
//! - connects through the context [`Connector`](crate::transport::Connector),
//! - runs the open socket via [`run_session`],
//! - delays reconnects per the store's [`BackoffPolicy`](crate::BackoffPolicy),
//! - stops as soon as its [`CancellationToken`] is cancelled.
//!
//! ## Event flow
//! ```text
//! Connecting(attempt) → [connect] → Connected → [session] → Disconnected
//!                                 → ConnectFailed
//! then:
//!   → BackoffScheduled(retry, delay) → [sleep] → Connecting(attempt + 1)
//! ```
//!
//! ## Architecture
//! ```text
//! Store::subscribe (first observer) ──► Shared::start_link ──► LinkActor::run()
//!
//! loop {
//!   ├─► enter_connecting(gen)      (exit if a newer link replaced this one)
//!   ├─► before_open hook
//!   ├─► connector.connect(endpoint)
//!   │       ├─ Ok  → retries = 0, run_session() until close/error/cancel
//!   │       └─ Err → publish ConnectFailed
//!   ├─► delay = backoff.delay(retries); retries += 1
//!   ├─► enter_closed(gen), publish BackoffScheduled
//!   └─► sleep(delay)                (cancellable)
//! }
//! ```
//!
//! ## Rules
//! - Attempts run **sequentially** (never two sockets for one link)
//! - The retry counter **resets on every successful open**
//! - Cancellation is observed during the hook, the connect and the sleep;
//!   cancelling an already cancelled link is a no-op

use std::sync::Arc;

use tokio::{select, sync::mpsc, time};
use tokio_util::sync::CancellationToken;

use crate::bootstrap::seed_link;
use crate::core::link::Shared;
use crate::core::session::run_session;
use crate::events::EventKind;

/// Connection manager for one link generation of a store.
pub(crate) struct LinkActor<In> {
    shared: Arc<Shared<In>>,
    generation: u64,
    token: CancellationToken,
    outbound: mpsc::UnboundedReceiver<String>,
}

impl<In: Send + Sync + 'static> LinkActor<In> {
    pub fn new(
        shared: Arc<Shared<In>>,
        generation: u64,
        token: CancellationToken,
        outbound: mpsc::UnboundedReceiver<String>,
    ) -> Self {
        Self {
            shared,
            generation,
            token,
            outbound,
        }
    }

    /// Runs until the link is cancelled or superseded.
    pub async fn run(mut self) {
        let shared = Arc::clone(&self.shared);
        let settings = &shared.settings;
        let mut retries: u32 = 0;
        let mut attempt: u32 = 0;

        if let Some(source) = settings.seed.clone() {
            shared.env.runtime.spawn(seed_link(
                Arc::clone(&shared),
                source,
                self.token.child_token(),
            ));
        }

        loop {
            if self.token.is_cancelled() || !shared.enter_connecting(self.generation) {
                break;
            }
            attempt = attempt.saturating_add(1);
            shared.publish(shared.event(EventKind::Connecting).with_attempt(attempt));

            if let Some(hook) = &settings.hooks.before_open {
                select! {
                    _ = hook.call() => {}
                    _ = self.token.cancelled() => break,
                }
            }

            let connected = select! {
                res = shared.env.connector.connect(&settings.endpoint) => res,
                _ = self.token.cancelled() => break,
            };
            match connected {
                Ok(transport) => {
                    retries = 0;
                    run_session(
                        &shared,
                        self.generation,
                        &self.token,
                        transport,
                        &mut self.outbound,
                        attempt,
                    )
                    .await;
                }
                Err(e) => shared.publish(
                    shared
                        .event(EventKind::ConnectFailed)
                        .with_attempt(attempt)
                        .with_reason(e.as_message()),
                ),
            }

            if self.token.is_cancelled() || !shared.enter_closed(self.generation) {
                break;
            }
            let delay = settings.backoff.delay(retries);
            retries = retries.saturating_add(1);
            shared.publish(
                shared
                    .event(EventKind::BackoffScheduled)
                    .with_attempt(retries)
                    .with_delay(delay),
            );

            select! {
                _ = time::sleep(delay) => {}
                _ = self.token.cancelled() => break,
            }
        }
    }
}
