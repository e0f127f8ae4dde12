//! # wirestate
//!
//! **wirestate** keeps locally cached values synchronized with a server over
//! persistent WebSocket connections.
//!
//! Each store mirrors one endpoint. Observers subscribe to a store and are
//! called with every new value; they never see the connection. The store
//! opens its socket when the first observer arrives, reconnects with a
//! fixed backoff table while observers remain, and closes when the last one
//! leaves.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐
//!     │ Writable<T>  │   │ Readable<T>  │   │ Asymmetric<I, O> │
//!     │ (settings)   │   │ (status)     │   │ (commands)       │
//!     └──────┬───────┘   └──────┬───────┘   └────────┬─────────┘
//!            ▼                  ▼                    ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  StoreContext (application context)                               │
//! │  - Bus (broadcast events)                                         │
//! │  - StatusBoard (connected flags, sequence-ordered)                │
//! │  - SubscriberSet (fans out to event subscribers)                  │
//! │  - Connector (tokio-tungstenite, or in-memory for tests)          │
//! └──────┬──────────────────┬────────────────────┬────────────────────┘
//!        ▼                  ▼                    ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  LinkActor   │   │  LinkActor   │   │  LinkActor   │
//!     │ (retry loop) │   │ (retry loop) │   │ (retry loop) │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘
//!      │ decode → cached value → observers (synchronous fan-out)
//!      │ Publishes: Connecting, Connected, Disconnected,
//!      │            BackoffScheduled, FrameRejected, ...
//!      ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                    (capacity: Config::bus_capacity)               │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │   context listener     │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                          ┌────────┼────────┐
//!                          ▼        ▼        ▼
//!                      LogWriter  metrics   custom
//! ```
//!
//! ### Lifecycle
//! ```text
//! Store::subscribe (first) ──► LinkActor::run()
//!
//! loop {
//!   ├─► publish Connecting{ store, attempt }
//!   ├─► before_open hook
//!   ├─► connect(endpoint)
//!   │       ├─ Ok  ──► retries = 0, publish Connected, on_open hook,
//!   │       │          flush pending frame, run until close/error
//!   │       │          ──► publish Disconnected, on_close hook
//!   │       └─ Err ──► publish ConnectFailed
//!   ├─► delay = backoff.delay(retries); retries += 1
//!   ├─► publish BackoffScheduled{ delay, attempt: retries }
//!   └─► sleep(delay) (cancellable)
//! }
//!
//! exit: last Subscription dropped, Store::teardown, or StoreContext::shutdown
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                              |
//! |-------------------|---------------------------------------------------------------|-------------------------------------------------|
//! | **Stores**        | One façade, three modes.                                      | [`Store`], [`StoreSpec`], [`StoreMode`]          |
//! | **Context**       | Owns connector, bus, status board and shutdown.               | [`StoreContext`], [`ContextBuilder`], [`Config`] |
//! | **Policies**      | Reconnect table, jitter, send-while-disconnected behavior.    | [`BackoffPolicy`], [`JitterPolicy`], [`SendPolicy`] |
//! | **Codecs**        | JSON, double-encoded JSON, raw text, closures.                | [`Decode`], [`Encode`], [`Json`], [`DoubleJson`] |
//! | **Transport**     | WebSocket connector and an in-memory one for tests.           | [`Connector`], [`WsConnector`], [`transport::memory`] |
//! | **Subscriber API**| Hook into connection events (logging, metrics, status bars).  | [`Subscribe`], [`Event`]                         |
//! | **Extras**        | HTTP seeding, rate-limited sends.                             | [`HttpSeed`], [`Throttled`]                      |
//! | **Errors**        | Typed errors with stable labels.                              | [`StoreError`], [`TransportError`], [`CodecError`] |
//!
//! ## Optional features
//! - `logging` (default): exports [`LogWriter`], installed when [`Config::log_events`] is set.
//!
//! ## Example
//! ```rust,no_run
//! use serde::{Deserialize, Serialize};
//! use wirestate::{Config, ContextBuilder, StoreSpec};
//!
//! #[derive(Clone, Debug, Default, Serialize, Deserialize)]
//! struct Settings {
//!     exposure_ms: u32,
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ctx = ContextBuilder::new(Config::default()).build()?;
//!
//!     let status = ctx.store(
//!         StoreSpec::<Vec<String>, ()>::readable("status", "ws://localhost:8080/status", Vec::new())
//!             .report_status(),
//!     )?;
//!     let settings = ctx.store(StoreSpec::writable(
//!         "settings",
//!         "ws://localhost:8080/usersettings",
//!         Settings::default(),
//!     ))?;
//!
//!     let _status_sub = status.subscribe(|lines| println!("status: {lines:?}"));
//!     let _settings_sub = settings.subscribe(|s| println!("exposure: {}ms", s.exposure_ms));
//!     settings.update(|s| Settings { exposure_ms: s.exposure_ms + 10 })?;
//!
//!     ctx.run_until_signal().await?;
//!     Ok(())
//! }
//! ```
mod bootstrap;
mod codec;
mod core;
mod error;
mod events;
mod policies;
mod store;
mod subscribers;
mod throttle;
pub mod transport;

// ---- Public re-exports ----

pub use bootstrap::{HttpSeed, SeedSource};
pub use codec::{Decode, DecodeFn, DoubleJson, Encode, Json, Text};
pub use crate::core::{Config, ConnectionState, ContextBuilder, StatusBoard, StoreContext};
pub use error::{CodecError, RuntimeError, StoreError, TransportError};
pub use events::{Bus, Event, EventKind};
pub use policies::{BackoffPolicy, JitterPolicy, SendPolicy};
pub use store::{
    Asymmetric, BoxHookFuture, Hook, HookFn, Readable, Store, StoreMode, StoreSpec, Subscription,
    Writable,
};
pub use subscribers::{Subscribe, SubscriberSet};
pub use throttle::Throttled;
pub use transport::{Connector, Frame, Transport, WsConnector};

// Built-in `tracing` event writer.
// Enabled by default; disable with `default-features = false`.
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
