//! Reconnect and send policies.
//!
//! This module groups the knobs that control **how long** to wait between
//! reconnect attempts and **what happens** to outbound values while the
//! socket is down.
//!
//! ## Contents
//! - [`BackoffPolicy`] retry counter → delay table (saturating)
//! - [`JitterPolicy`]  optional randomization of the table delay
//! - [`SendPolicy`]    defer-latest or drop while disconnected
//!
//! ## Quick wiring
//! ```text
//! StoreSpec { backoff: BackoffPolicy, send: SendPolicy, .. }
//!      └─► core::actor::LinkActor uses:
//!           - backoff.delay(retries) to arm the reconnect timer
//!      └─► Store::set uses:
//!           - send policy when the link is not Open
//! ```
//!
//! ## Defaults
//! - `BackoffPolicy::default()` → `[2s, 5s, 10s, 30s, 60s]`, jitter=None.
//! - `SendPolicy::for_mode(mode)` → `Defer` for read-write, `Drop` otherwise.

mod backoff;
mod jitter;
mod send;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use send::SendPolicy;
