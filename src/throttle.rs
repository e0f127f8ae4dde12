//! # Rate-limited sends.
//!
//! [`Throttled`] wraps a store so that at most one frame per interval goes
//! out, while the most recent value always gets through.
//!
//! ```text
//! set(a) t=0.0  → sent now
//! set(b) t=0.2  → held (trailing)
//! set(c) t=0.5  → replaces b
//!        t=1.0  → c sent
//! set(d) t=2.5  → sent now
//! ```
//!
//! Local echo is unaffected by the throttle: on a `ReadWrite` store the
//! cached value follows every `set` only once its frame is handed over, so
//! observers see the values that were actually sent.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::warn;

use crate::error::StoreError;
use crate::store::{Store, StoreMode};

struct Window<Out> {
    last_sent: Option<Instant>,
    trailing: Option<Out>,
    scheduled: bool,
}

/// A store whose `set` is limited to one send per interval.
pub struct Throttled<In, Out = In> {
    store: Store<In, Out>,
    interval: Duration,
    window: Arc<Mutex<Window<Out>>>,
}

impl<In, Out> Clone for Throttled<In, Out> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            interval: self.interval,
            window: Arc::clone(&self.window),
        }
    }
}

impl<In, Out> Throttled<In, Out>
where
    In: Send + Sync + 'static,
    Out: Send + 'static,
{
    /// Wraps `store`; sends are spaced by at least `interval`.
    pub fn new(store: Store<In, Out>, interval: Duration) -> Self {
        Self {
            store,
            interval,
            window: Arc::new(Mutex::new(Window {
                last_sent: None,
                trailing: None,
                scheduled: false,
            })),
        }
    }

    /// The wrapped store.
    pub fn store(&self) -> &Store<In, Out> {
        &self.store
    }

    /// Sends now if the interval elapsed, otherwise schedules one trailing send.
    ///
    /// Usage errors are returned immediately; errors of a trailing send are logged.
    pub fn set(&self, value: Out) -> Result<(), StoreError> {
        if self.store.mode() == StoreMode::ReadOnly {
            return self.store.set(value);
        }
        let now = Instant::now();
        let mut window = self.window.lock().unwrap_or_else(PoisonError::into_inner);

        let wait = match window.last_sent {
            Some(at) => self.interval.saturating_sub(now.duration_since(at)),
            None => Duration::ZERO,
        };
        if wait.is_zero() && !window.scheduled {
            window.last_sent = Some(now);
            drop(window);
            return self.store.set(value);
        }

        window.trailing = Some(value);
        if !window.scheduled {
            window.scheduled = true;
            let store = self.store.clone();
            let shared_window = Arc::clone(&self.window);
            let runtime = store.runtime().clone();
            runtime.spawn(async move {
                time::sleep(wait).await;
                let next = {
                    let mut window = shared_window
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner);
                    window.scheduled = false;
                    window.last_sent = Some(Instant::now());
                    window.trailing.take()
                };
                if let Some(value) = next {
                    if let Err(e) = store.set(value) {
                        warn!(store = store.name(), error = %e, "trailing send failed");
                    }
                }
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::memory::MemoryConnector;
    use crate::{Config, ContextBuilder, StoreSpec};

    #[tokio::test(start_paused = true)]
    async fn leading_then_single_trailing_send() {
        let connector = Arc::new(MemoryConnector::new());
        let ctx = ContextBuilder::new(Config::default())
            .with_connector(connector.clone())
            .build()
            .unwrap();
        let store = ctx
            .store(StoreSpec::writable("settings", "ws://lab/usersettings", 0_u32))
            .unwrap();
        let _sub = store.subscribe(|_| {});
        let mut peer = connector.accept().await.unwrap();
        while store.state() != crate::ConnectionState::Open {
            tokio::task::yield_now().await;
        }

        let throttled = Throttled::new(store.clone(), Duration::from_secs(1));
        throttled.set(1).unwrap();
        throttled.set(2).unwrap();
        throttled.set(3).unwrap();

        assert_eq!(peer.recv().await.as_deref(), Some("1"));
        let before = Instant::now();
        assert_eq!(peer.recv().await.as_deref(), Some("3"));
        assert!(Instant::now() - before >= Duration::from_millis(999));
        assert_eq!(*store.get(), 3);

        time::sleep(Duration::from_secs(5)).await;
        assert!(peer.drain().is_empty());
        throttled.set(4).unwrap();
        assert_eq!(peer.recv().await.as_deref(), Some("4"));
    }

    #[tokio::test]
    async fn read_only_is_rejected_immediately() {
        let ctx = ContextBuilder::new(Config::default())
            .with_connector(Arc::new(MemoryConnector::refusing()))
            .build()
            .unwrap();
        let store = ctx
            .store(StoreSpec::<u32, ()>::readable("ro", "ws://lab/ro", 0))
            .unwrap();
        let throttled = Throttled::new(store, Duration::from_secs(1));
        assert!(throttled.set(()).unwrap_err().is_usage());
    }
}
