//! # `Store` and `Subscription`.
//!
//! ```text
//! Store::subscribe(f) ──► registry.add ──► f(current)  (synchronous, before any I/O)
//!                                  └──► first observer? → start LinkActor
//! Store::set(v)       ──► encode ──► Open? send : SendPolicy (defer / drop)
//!                             └──► ReadWrite: echo v into the cache → observers
//! Subscription::drop  ──► registry.remove ──► last observer? → cancel link, Idle
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use tokio::runtime::Handle;

use crate::codec::Encode;
use crate::core::{ConnectionState, LinkControl, Shared};
use crate::error::StoreError;
use crate::store::StoreMode;
use crate::store::spec::Echo;

/// Handle to a value synchronized with one WebSocket endpoint.
///
/// Cheap to clone; clones share the cached value, observers and connection.
///
/// ## Example
/// ```rust,no_run
/// use wirestate::{Config, ContextBuilder, StoreSpec};
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let ctx = ContextBuilder::new(Config::default()).build()?;
/// let volume = ctx.store(StoreSpec::writable("volume", "ws://localhost:8080/volume", 0_u8))?;
///
/// let _sub = volume.subscribe(|v| println!("volume is {v}"));
/// volume.set(11)?;
/// volume.update(|v| v.saturating_sub(1))?;
/// # Ok(())
/// # }
/// ```
pub struct Store<In, Out = In> {
    shared: Arc<Shared<In>>,
    mode: StoreMode,
    encoder: Option<Arc<dyn Encode<Out>>>,
    echo: Option<Echo<In, Out>>,
}

impl<In, Out> Clone for Store<In, Out> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            mode: self.mode,
            encoder: self.encoder.clone(),
            echo: self.echo.clone(),
        }
    }
}

impl<In, Out> fmt::Debug for Store<In, Out> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.shared.settings.name)
            .field("endpoint", &self.shared.settings.endpoint)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl<In, Out> Store<In, Out>
where
    In: Send + Sync + 'static,
    Out: 'static,
{
    pub(crate) fn new(
        shared: Arc<Shared<In>>,
        mode: StoreMode,
        encoder: Option<Arc<dyn Encode<Out>>>,
        echo: Option<Echo<In, Out>>,
    ) -> Self {
        Self {
            shared,
            mode,
            encoder,
            echo,
        }
    }

    /// Registers an observer.
    ///
    /// The observer is called with the current value before this returns,
    /// then once per accepted update. The first observer starts the
    /// connection; dropping the last [`Subscription`] stops it.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&In) + Send + Sync + 'static,
    {
        let id = self.shared.subscribe(Arc::new(observer));
        let shared: Arc<dyn LinkControl> = self.shared.clone();
        Subscription {
            id,
            target: Some(Arc::downgrade(&shared)),
        }
    }

    /// Sends a value.
    ///
    /// - `ReadWrite`: the value is also written to the local cache (unless built `without_echo`).
    /// - `Asymmetric`: only sent; the cached `In` value is untouched.
    /// - `ReadOnly`: returns [`StoreError::Usage`].
    ///
    /// While the socket is not open the frame is deferred or dropped per the
    /// store's [`SendPolicy`](crate::SendPolicy); that is not an error.
    pub fn set(&self, value: Out) -> Result<(), StoreError> {
        let encoder = match (&self.encoder, self.mode) {
            (Some(encoder), StoreMode::ReadWrite | StoreMode::Asymmetric) => encoder,
            _ => return Err(self.usage("set")),
        };
        if self.shared.env.root.is_cancelled() {
            return Err(StoreError::ContextClosed);
        }
        let frame = encoder.encode(&value).map_err(|source| StoreError::Encode {
            store: Arc::clone(self.shared.name()),
            source,
        })?;

        self.shared.dispatch(frame);
        if let Some(echo) = &self.echo {
            self.shared.accept(echo(&value));
        }
        Ok(())
    }

    /// Read-modify-write on a `ReadWrite` store: `set(f(&current))`.
    ///
    /// Fails with [`StoreError::Usage`] on read-only and asymmetric stores.
    pub fn update<F>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&In) -> Out,
    {
        if self.mode != StoreMode::ReadWrite {
            return Err(self.usage("update"));
        }
        let current = self.shared.get();
        self.set(f(&current))
    }

    /// Current cached value.
    pub fn get(&self) -> Arc<In> {
        self.shared.get()
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    pub fn name(&self) -> &str {
        self.shared.name()
    }

    pub fn mode(&self) -> StoreMode {
        self.mode
    }

    pub fn observer_count(&self) -> usize {
        self.shared.observer_count()
    }

    /// Removes every observer and stops the connection.
    ///
    /// Outstanding [`Subscription`]s become no-ops. A later `subscribe` starts
    /// a fresh connection with the retry counter at zero.
    pub fn teardown(&self) {
        self.shared.teardown();
    }

    pub(crate) fn runtime(&self) -> &Handle {
        &self.shared.env.runtime
    }

    fn usage(&self, operation: &'static str) -> StoreError {
        StoreError::Usage {
            store: Arc::clone(self.shared.name()),
            operation,
            mode: self.mode,
        }
    }

    #[cfg(test)]
    pub(crate) fn pending_frame(&self) -> Option<String> {
        self.shared.pending()
    }
}

/// Unsubscribe handle returned by [`Store::subscribe`].
///
/// Dropping it unsubscribes. Unsubscribing twice (or after the store was torn
/// down) is a no-op.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    target: Option<Weak<dyn LinkControl>>,
}

impl Subscription {
    /// Removes the observer.
    pub fn unsubscribe(&mut self) {
        if let Some(shared) = self.target.take().and_then(|w| w.upgrade()) {
            shared.detach(self.id);
        }
    }

    /// Keeps the observer registered for the lifetime of the store.
    pub fn forget(mut self) {
        self.target = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.target.is_some())
            .finish()
    }
}
