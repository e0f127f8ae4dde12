//! # Transport abstraction for store connections.
//!
//! A store never talks to a socket directly. It asks its [`Connector`] for a
//! fresh [`Transport`] on every connect attempt and drives it until it closes.
//!
//! ```text
//! ┌────────────────────┐    ┌────────────────────┐
//! │   WsConnector      │    │  MemoryConnector   │
//! │ (tokio-tungstenite)│    │ (in-process peers) │
//! └─────────┬──────────┘    └─────────┬──────────┘
//!           └────────────┬────────────┘
//!                        ▼
//!             ┌──────────────────────┐
//!             │ LinkActor / session  │
//!             │  - reconnect backoff │
//!             │  - inbound decode    │
//!             │  - outbound frames   │
//!             └──────────────────────┘
//! ```
//!
//! Only text frames carry values. Binary frames are accepted when they are
//! valid UTF-8; ping/pong is handled below this layer.

pub mod memory;
mod ws;

use async_trait::async_trait;

pub use ws::WsConnector;

use crate::error::TransportError;

/// Inbound frame as seen by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Text frame (the normal case).
    Text(String),
    /// Binary frame.
    Binary(Vec<u8>),
    /// Remote closed the connection.
    Close,
}

/// One open connection.
#[async_trait]
pub trait Transport: Send {
    /// Writes a text frame.
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Waits for the next inbound frame. `None` means the stream ended.
    async fn recv(&mut self) -> Option<Result<Frame, TransportError>>;

    /// Closes the connection. Errors are informational only.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Opens connections to an endpoint.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Establishes a connection to `endpoint`.
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn Transport>, TransportError>;
}
