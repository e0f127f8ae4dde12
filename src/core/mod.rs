//! Runtime core: context, links and lifecycle.
//!
//! The public API from this module is [`StoreContext`] (built by
//! [`ContextBuilder`] from a [`Config`]), the [`StatusBoard`] and
//! [`ConnectionState`].
//!
//! Internal modules:
//! - [`link`]: per-store shared state (cached value, observers, pending frame, generations);
//! - [`actor`]: the reconnect loop of one link, with backoff and cancellation;
//! - [`session`]: drives one open socket (inbound decode, outbound frames);
//! - [`registry`]: observer entries with per-observer version tracking;
//! - [`status`]: sequence-ordered connected flags;
//! - [`shutdown`]: OS signal handling.

mod actor;
mod builder;
mod config;
mod context;
mod link;
mod registry;
mod session;
mod shutdown;
mod status;

pub use builder::ContextBuilder;
pub use config::Config;
pub use context::StoreContext;
pub use link::ConnectionState;
pub use status::StatusBoard;

pub(crate) use link::{Hooks, LinkControl, Shared};
