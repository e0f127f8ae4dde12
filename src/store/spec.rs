//! # Store specification.
//!
//! [`StoreSpec`] describes one store before it is bound to a
//! [`StoreContext`](crate::StoreContext): its mode, endpoint, initial value,
//! codecs and per-store overrides.
//!
//! ## Defaults
//! | Setting     | Writable          | Readable       | Asymmetric     |
//! |-------------|-------------------|----------------|----------------|
//! | decoder     | [`Json`]          | [`Json`]       | [`Json`]       |
//! | encoder     | [`Json`]          | none           | [`Json`]       |
//! | local echo  | yes               | -              | never          |
//! | send policy | `Defer`           | -              | `Drop`         |
//! | backoff     | `Config::backoff` | same           | same           |
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use wirestate::{BackoffPolicy, DoubleJson, StoreSpec};
//!
//! let spec = StoreSpec::<Vec<String>, ()>::readable("status", "ws://localhost:8080/status", Vec::new())
//!     .with_decoder(DoubleJson)
//!     .with_backoff(BackoffPolicy::constant(Duration::from_secs(1)))
//!     .report_status();
//! assert_eq!(spec.name(), "status");
//! ```

use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};

use crate::bootstrap::SeedSource;
use crate::codec::{Decode, Encode, Json};
use crate::core::Hooks;
use crate::policies::{BackoffPolicy, SendPolicy};
use crate::store::{Hook, StoreMode};

/// Maps an outbound value to the value echoed into the local cache.
pub(crate) type Echo<In, Out> = Arc<dyn Fn(&Out) -> In + Send + Sync>;

/// Description of a store, consumed by [`StoreContext::store`](crate::StoreContext::store).
pub struct StoreSpec<In, Out = In> {
    pub(crate) mode: StoreMode,
    pub(crate) name: Arc<str>,
    pub(crate) endpoint: String,
    pub(crate) initial: In,
    pub(crate) decoder: Arc<dyn Decode<In>>,
    pub(crate) encoder: Option<Arc<dyn Encode<Out>>>,
    pub(crate) echo: Option<Echo<In, Out>>,
    pub(crate) send_policy: Option<SendPolicy>,
    pub(crate) backoff: Option<BackoffPolicy>,
    pub(crate) hooks: Hooks,
    pub(crate) report_status: bool,
    pub(crate) seed: Option<Arc<dyn SeedSource>>,
}

impl<In, Out> StoreSpec<In, Out>
where
    In: Send + Sync + 'static,
    Out: 'static,
{
    fn base(mode: StoreMode, name: impl Into<Arc<str>>, endpoint: impl Into<String>, initial: In) -> Self
    where
        In: DeserializeOwned,
    {
        Self {
            mode,
            name: name.into(),
            endpoint: endpoint.into(),
            initial,
            decoder: Arc::new(Json),
            encoder: None,
            echo: None,
            send_policy: None,
            backoff: None,
            hooks: Hooks::default(),
            report_status: false,
            seed: None,
        }
    }

    /// Store name used in events and the status board.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store mode.
    pub fn mode(&self) -> StoreMode {
        self.mode
    }

    /// Replaces the inbound decoder.
    pub fn with_decoder(mut self, decoder: impl Decode<In>) -> Self {
        self.decoder = Arc::new(decoder);
        self
    }

    /// Overrides the reconnect delays for this store.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = Some(backoff);
        self
    }

    /// Runs `hook` before every connect attempt.
    pub fn before_open(mut self, hook: Arc<dyn Hook>) -> Self {
        self.hooks.before_open = Some(hook);
        self
    }

    /// Runs `hook` every time the socket opens.
    pub fn on_open(mut self, hook: Arc<dyn Hook>) -> Self {
        self.hooks.on_open = Some(hook);
        self
    }

    /// Runs `hook` every time an open socket closes.
    pub fn on_close(mut self, hook: Arc<dyn Hook>) -> Self {
        self.hooks.on_close = Some(hook);
        self
    }

    /// Reports this store's connected flag to the context [`StatusBoard`](crate::StatusBoard).
    pub fn report_status(mut self) -> Self {
        self.report_status = true;
        self
    }

    /// Fetches an initial value from `source` whenever the link starts.
    pub fn with_seed(mut self, source: Arc<dyn SeedSource>) -> Self {
        self.seed = Some(source);
        self
    }
}

impl<T> StoreSpec<T, T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Symmetric store: `set` sends and updates the local value.
    pub fn writable(name: impl Into<Arc<str>>, endpoint: impl Into<String>, initial: T) -> Self {
        let mut spec = Self::base(StoreMode::ReadWrite, name, endpoint, initial);
        spec.encoder = Some(Arc::new(Json));
        spec.echo = Some(Arc::new(|v: &T| v.clone()));
        spec
    }

    /// Keeps `set` from touching the local value; the server's echo updates it instead.
    pub fn without_echo(mut self) -> Self {
        self.echo = None;
        self
    }
}

impl<T> StoreSpec<T, ()>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    /// Read-only store: `set` and `update` fail with a usage error.
    pub fn readable(name: impl Into<Arc<str>>, endpoint: impl Into<String>, initial: T) -> Self {
        Self::base(StoreMode::ReadOnly, name, endpoint, initial)
    }
}

impl<In, Out> StoreSpec<In, Out>
where
    In: DeserializeOwned + Send + Sync + 'static,
    Out: Serialize + 'static,
{
    /// Asymmetric store: values of type `In` arrive, commands of type `Out` are sent.
    pub fn asymmetric(name: impl Into<Arc<str>>, endpoint: impl Into<String>, initial: In) -> Self {
        let mut spec = Self::base(StoreMode::Asymmetric, name, endpoint, initial);
        spec.encoder = Some(Arc::new(Json));
        spec
    }
}

impl<In, Out> StoreSpec<In, Out>
where
    In: Send + Sync + 'static,
    Out: 'static,
{
    /// Replaces the outbound encoder (ignored on read-only stores).
    pub fn with_encoder(mut self, encoder: impl Encode<Out>) -> Self {
        if self.mode != StoreMode::ReadOnly {
            self.encoder = Some(Arc::new(encoder));
        }
        self
    }

    /// Overrides what happens to `set` while the socket is not open.
    pub fn with_send_policy(mut self, policy: SendPolicy) -> Self {
        self.send_policy = Some(policy);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Text;

    #[test]
    fn writable_defaults() {
        let spec = StoreSpec::writable("w", "ws://h/w", 0_i32);
        assert_eq!(spec.mode(), StoreMode::ReadWrite);
        assert!(spec.encoder.is_some());
        assert!(spec.echo.is_some());
        assert!(spec.without_echo().echo.is_none());
    }

    #[test]
    fn readable_never_gets_an_encoder() {
        let spec = StoreSpec::<String, ()>::readable("r", "ws://h/r", String::new())
            .with_decoder(Text)
            .with_encoder(Json);
        assert!(spec.encoder.is_none());
        assert!(spec.echo.is_none());
    }

    #[test]
    fn asymmetric_has_no_echo() {
        let spec = StoreSpec::<Vec<u8>, String>::asymmetric("a", "ws://h/a", Vec::new())
            .with_send_policy(SendPolicy::Defer);
        assert!(spec.echo.is_none());
        assert_eq!(spec.send_policy, Some(SendPolicy::Defer));
    }
}
