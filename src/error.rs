//! Error types used by stores, transports and codecs.
//!
//! This module defines four error enums:
//!
//! - [`StoreError`] misuse of a store or context (the only class that aborts a call).
//! - [`TransportError`] connect/send/receive failures, always recovered by reconnecting.
//! - [`CodecError`] a single frame that could not be decoded (or a value that could not be encoded).
//! - [`RuntimeError`] problems with the hosting runtime itself.
//!
//! All types provide helper methods (`as_label`, `as_message`) for logging/metrics.
//! Transport and decode errors never reach observers: they are published as
//! [`Event`](crate::Event)s and the last good value stays in place.

use std::sync::Arc;

use thiserror::Error;

use crate::store::StoreMode;

/// # Errors returned by store operations.
///
/// [`StoreError::Usage`] is a programming error (calling `set` on a read-only
/// store, `update` on an asymmetric one). It is returned instead of silently
/// ignoring the call so misuse surfaces during development.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StoreError {
    /// Operation is not allowed for this store mode.
    #[error("store {store:?}: `{operation}` is not allowed on a {mode} store")]
    Usage {
        /// Store name.
        store: Arc<str>,
        /// Rejected operation (`set`, `update`).
        operation: &'static str,
        /// Mode of the store.
        mode: StoreMode,
    },

    /// Outbound value could not be encoded into a frame.
    #[error("store {store:?}: {source}")]
    Encode {
        /// Store name.
        store: Arc<str>,
        /// Underlying codec error.
        #[source]
        source: CodecError,
    },

    /// Endpoint is not a usable `ws://` / `wss://` URL.
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint {
        /// Endpoint as supplied by the caller.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The owning context was shut down.
    #[error("store context is shut down")]
    ContextClosed,
}

impl StoreError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use wirestate::StoreError;
    ///
    /// assert_eq!(StoreError::ContextClosed.as_label(), "store_context_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            StoreError::Usage { .. } => "store_usage",
            StoreError::Encode { .. } => "store_encode",
            StoreError::InvalidEndpoint { .. } => "store_invalid_endpoint",
            StoreError::ContextClosed => "store_context_closed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            StoreError::Usage {
                store,
                operation,
                mode,
            } => format!("usage: {operation} on {mode} store {store}"),
            StoreError::Encode { store, source } => format!("encode: {store}: {source}"),
            StoreError::InvalidEndpoint { endpoint, reason } => {
                format!("endpoint: {endpoint}: {reason}")
            }
            StoreError::ContextClosed => "context closed".to_string(),
        }
    }

    /// Indicates a programming error rather than a runtime condition.
    pub fn is_usage(&self) -> bool {
        matches!(self, StoreError::Usage { .. })
    }
}

/// # Errors produced by a transport.
///
/// Every variant is recoverable: the connection manager logs it, closes the
/// socket and schedules a reconnect.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection could not be established.
    #[error("connect failed: {0}")]
    Connect(String),
    /// Outbound frame could not be written.
    #[error("send failed: {0}")]
    Send(String),
    /// Inbound stream reported an error.
    #[error("receive failed: {0}")]
    Receive(String),
    /// Transport was already closed.
    #[error("connection closed")]
    Closed,
    /// Companion HTTP request failed.
    #[error("http request failed: {0}")]
    Http(String),
}

impl TransportError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TransportError::Connect(_) => "transport_connect",
            TransportError::Send(_) => "transport_send",
            TransportError::Receive(_) => "transport_receive",
            TransportError::Closed => "transport_closed",
            TransportError::Http(_) => "transport_http",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }

    /// Indicates whether a reconnect can fix the condition.
    ///
    /// Always `true` for socket errors; the HTTP seed path is best-effort and
    /// treats its own failures as retryable too.
    ///
    /// # Example
    /// ```
    /// use wirestate::TransportError;
    ///
    /// assert!(TransportError::Connect("refused".into()).is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        true
    }
}

/// # Errors produced by a codec.
///
/// A decode error rejects one inbound frame; the connection stays open and
/// the cached value is left untouched.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Inbound frame was not a valid document for the store.
    #[error("frame rejected: {0}")]
    Decode(String),
    /// Outbound value could not be serialized.
    #[error("encode failed: {0}")]
    Encode(String),
}

impl CodecError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            CodecError::Decode(_) => "codec_decode",
            CodecError::Encode(_) => "codec_encode",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            CodecError::Decode(detail) => format!("decode: {detail}"),
            CodecError::Encode(detail) => format!("encode: {detail}"),
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(e: serde_json::Error) -> Self {
        CodecError::Decode(e.to_string())
    }
}

/// # Errors produced by the hosting runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// No tokio runtime was available when building the context.
    #[error("no tokio runtime available: {0}")]
    NoRuntime(String),

    /// Registering OS signal handlers failed.
    #[error("signal registration failed: {0}")]
    Signal(#[from] std::io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::NoRuntime(_) => "runtime_missing",
            RuntimeError::Signal(_) => "runtime_signal",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::NoRuntime(detail) => format!("no runtime: {detail}"),
            RuntimeError::Signal(e) => format!("signal: {e}"),
        }
    }
}
