//! # In-process transport.
//!
//! [`MemoryConnector`] stands in for a WebSocket server: every accepted
//! connection hands a [`MemoryPeer`] to the test (or embedding code), which
//! can push frames to the store and read what the store sends.
//!
//! Connect outcomes are scripted with [`Plan`]s; once the script runs out the
//! fallback plan applies to every further attempt.
//!
//! ## Example
//! ```rust
//! use wirestate::transport::memory::{MemoryConnector, Plan};
//!
//! let connector = MemoryConnector::new();
//! connector.script([Plan::Refuse, Plan::Accept]);
//! assert_eq!(connector.attempts(), 0);
//! ```

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tokio::time::Instant;

use super::{Connector, Frame, Transport};
use crate::error::TransportError;

/// Outcome of one connect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// Open a connection and hand the peer side to [`MemoryConnector::accept`].
    Accept,
    /// Fail the attempt with [`TransportError::Connect`].
    Refuse,
}

struct Script {
    queued: VecDeque<Plan>,
    fallback: Plan,
    attempts: Vec<(String, Instant)>,
}

/// Scripted in-process connector.
pub struct MemoryConnector {
    script: Mutex<Script>,
    accepted_tx: mpsc::UnboundedSender<MemoryPeer>,
    accepted_rx: AsyncMutex<mpsc::UnboundedReceiver<MemoryPeer>>,
}

impl MemoryConnector {
    /// Connector that accepts every attempt.
    #[must_use]
    pub fn new() -> Self {
        Self::with_fallback(Plan::Accept)
    }

    /// Connector that refuses every attempt (an unreachable endpoint).
    #[must_use]
    pub fn refusing() -> Self {
        Self::with_fallback(Plan::Refuse)
    }

    fn with_fallback(fallback: Plan) -> Self {
        let (accepted_tx, accepted_rx) = mpsc::unbounded_channel();
        Self {
            script: Mutex::new(Script {
                queued: VecDeque::new(),
                fallback,
                attempts: Vec::new(),
            }),
            accepted_tx,
            accepted_rx: AsyncMutex::new(accepted_rx),
        }
    }

    /// Queues outcomes for the next attempts, in order.
    pub fn script(&self, plans: impl IntoIterator<Item = Plan>) {
        self.lock().queued.extend(plans);
    }

    /// Replaces the outcome used once the script is exhausted.
    pub fn set_fallback(&self, plan: Plan) {
        self.lock().fallback = plan;
    }

    /// Number of connect attempts so far.
    pub fn attempts(&self) -> usize {
        self.lock().attempts.len()
    }

    /// Instants of every connect attempt (tokio clock, so paused time applies).
    pub fn attempt_times(&self) -> Vec<Instant> {
        self.lock().attempts.iter().map(|(_, at)| *at).collect()
    }

    /// Endpoints that were dialed, in order.
    pub fn endpoints(&self) -> Vec<String> {
        self.lock().attempts.iter().map(|(e, _)| e.clone()).collect()
    }

    /// Waits for the next accepted connection.
    pub async fn accept(&self) -> Option<MemoryPeer> {
        self.accepted_rx.lock().await.recv().await
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn Transport>, TransportError> {
        let plan = {
            let mut script = self.lock();
            script.attempts.push((endpoint.to_owned(), Instant::now()));
            let fallback = script.fallback;
            script.queued.pop_front().unwrap_or(fallback)
        };

        match plan {
            Plan::Refuse => Err(TransportError::Connect(format!("{endpoint}: refused"))),
            Plan::Accept => {
                let (to_store, from_peer) = mpsc::unbounded_channel();
                let (to_peer, from_store) = mpsc::unbounded_channel();
                let peer = MemoryPeer {
                    tx: Some(to_store),
                    rx: from_store,
                };
                self.accepted_tx
                    .send(peer)
                    .map_err(|_| TransportError::Connect("connector dropped".into()))?;
                Ok(Box::new(MemoryTransport {
                    tx: Some(to_peer),
                    rx: from_peer,
                }))
            }
        }
    }
}

/// Store side of an in-process connection.
struct MemoryTransport {
    tx: Option<mpsc::UnboundedSender<String>>,
    rx: mpsc::UnboundedReceiver<Frame>,
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        match &self.tx {
            Some(tx) => tx.send(text).map_err(|_| TransportError::Closed),
            None => Err(TransportError::Closed),
        }
    }

    async fn recv(&mut self) -> Option<Result<Frame, TransportError>> {
        self.rx.recv().await.map(Ok)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.tx = None;
        self.rx.close();
        Ok(())
    }
}

/// Server side of an in-process connection.
pub struct MemoryPeer {
    tx: Option<mpsc::UnboundedSender<Frame>>,
    rx: mpsc::UnboundedReceiver<String>,
}

impl MemoryPeer {
    /// Pushes a text frame to the store. Returns `false` once the store side is gone.
    pub fn send_text(&self, text: impl Into<String>) -> bool {
        self.send(Frame::Text(text.into()))
    }

    /// Pushes a binary frame to the store.
    pub fn send_binary(&self, data: impl Into<Vec<u8>>) -> bool {
        self.send(Frame::Binary(data.into()))
    }

    fn send(&self, frame: Frame) -> bool {
        self.tx.as_ref().is_some_and(|tx| tx.send(frame).is_ok())
    }

    /// Next frame the store sent; `None` after the store closed the connection.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Frames already sent by the store, without waiting.
    pub fn drain(&mut self) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(text) = self.rx.try_recv() {
            out.push(text);
        }
        out
    }

    /// Remote close: sends a close frame and hangs up.
    pub fn close(&mut self) {
        self.send(Frame::Close);
        self.tx = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn script_then_fallback() {
        let connector = MemoryConnector::refusing();
        connector.script([Plan::Accept]);

        let mut first = connector.connect("ws://a").await.unwrap();
        assert!(connector.connect("ws://a").await.is_err());
        assert!(connector.connect("ws://a").await.is_err());
        assert_eq!(connector.attempts(), 3);

        let mut peer = connector.accept().await.unwrap();
        first.send_text("hello".into()).await.unwrap();
        assert_eq!(peer.recv().await.as_deref(), Some("hello"));

        assert!(peer.send_text("42"));
        assert_eq!(
            first.recv().await.unwrap().unwrap(),
            Frame::Text("42".into())
        );
    }

    #[tokio::test]
    async fn peer_sees_store_hangup() {
        let connector = MemoryConnector::new();
        let mut transport = connector.connect("ws://a").await.unwrap();
        let mut peer = connector.accept().await.unwrap();

        transport.close().await.unwrap();
        assert_eq!(peer.recv().await, None);
        assert!(transport.send_text("late".into()).await.is_err());
    }

    #[tokio::test]
    async fn store_sees_remote_close() {
        let connector = MemoryConnector::new();
        let mut transport = connector.connect("ws://a").await.unwrap();
        let mut peer = connector.accept().await.unwrap();

        peer.close();
        assert_eq!(transport.recv().await.unwrap().unwrap(), Frame::Close);
        assert!(transport.recv().await.is_none());
        assert!(!peer.send_text("gone"));
    }
}
