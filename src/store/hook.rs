//! # Lifecycle hooks.
//!
//! A [`Hook`] is an async callback run by the link actor around the socket
//! lifecycle of a store:
//!
//! - `before_open` runs before every connect attempt (refresh a token, wait for a prerequisite);
//! - `on_open` runs after the socket opened and before the pending frame is flushed;
//! - `on_close` runs after the socket closed, before the reconnect delay.
//!
//! [`HookFn`] wraps a closure that produces a fresh future per call.
//!
//! ## Example
//! ```rust
//! use wirestate::{Hook, HookFn};
//!
//! let hook = HookFn::arc(|| async {
//!     // request a full state dump, refresh auth, ...
//! });
//! let _fut = hook.call();
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by [`Hook::call`].
pub type BoxHookFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Async lifecycle callback.
///
/// Hooks run inside the link actor: a hook that never completes stalls that
/// store's connection (but `before_open` / `on_open` are abandoned on teardown).
pub trait Hook: Send + Sync + 'static {
    /// Produces the future for one invocation.
    fn call(&self) -> BoxHookFuture;
}

/// Function-backed hook.
#[derive(Debug)]
pub struct HookFn<F> {
    f: F,
}

impl<F> HookFn<F> {
    /// Creates a new function-backed hook.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the hook and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<F, Fut> Hook for HookFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn call(&self) -> BoxHookFuture {
        Box::pin((self.f)())
    }
}
