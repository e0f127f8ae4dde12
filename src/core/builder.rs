use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{Config, StatusBoard, context::StoreContext, link::Env};
use crate::{
    error::RuntimeError,
    events::{Bus, Event},
    subscribers::{Subscribe, SubscriberSet},
    transport::{Connector, WsConnector},
};

/// Builder for constructing a [`StoreContext`] with optional features.
pub struct ContextBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    connector: Option<Arc<dyn Connector>>,
    status: Option<Arc<StatusBoard>>,
    runtime: Option<Handle>,
}

impl ContextBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            connector: None,
            status: None,
            runtime: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (connects, retries, rejected frames)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Replaces the default [`WsConnector`].
    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Shares an existing status board, e.g. one a subscriber also reads.
    pub fn with_status_board(mut self, board: Arc<StatusBoard>) -> Self {
        self.status = Some(board);
        self
    }

    /// Spawns link actors on `runtime` instead of the current one.
    ///
    /// Needed when stores are created from threads outside the runtime.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Builds and returns the context.
    ///
    /// This consumes the builder and initializes:
    /// - the event bus
    /// - subscriber workers (plus `LogWriter` when `log_events` is set)
    /// - the bus → subscriber listener
    ///
    /// Fails with [`RuntimeError::NoRuntime`] when called outside a tokio
    /// runtime without [`with_runtime`](Self::with_runtime).
    pub fn build(self) -> Result<Arc<StoreContext>, RuntimeError> {
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|e| RuntimeError::NoRuntime(e.to_string()))?,
        };
        let bus = Bus::new(self.cfg.bus_capacity_clamped());

        #[allow(unused_mut)]
        let mut subscribers = self.subscribers;
        #[cfg(feature = "logging")]
        if self.cfg.log_events {
            subscribers.push(Arc::new(crate::subscribers::LogWriter::new()));
        }

        let listener_stop = CancellationToken::new();
        let listener = if subscribers.is_empty() {
            None
        } else {
            let set = SubscriberSet::new(subscribers, bus.clone(), &runtime);
            Some(spawn_listener(
                &runtime,
                bus.subscribe(),
                set,
                listener_stop.clone(),
            ))
        };

        let env = Arc::new(Env {
            bus,
            status: self.status.unwrap_or_default(),
            connector: self.connector.unwrap_or_else(|| Arc::new(WsConnector)),
            runtime,
            root: CancellationToken::new(),
            seed_attempts: self.cfg.seed_attempts,
            seed_timeout: self.cfg.seed_timeout(),
        });
        Ok(Arc::new(StoreContext::new(
            self.cfg,
            env,
            listener,
            listener_stop,
        )))
    }
}

/// Forwards bus events to the subscriber set until stopped, then drains and shuts it down.
fn spawn_listener(
    runtime: &Handle,
    mut rx: broadcast::Receiver<Event>,
    set: SubscriberSet,
    stop: CancellationToken,
) -> JoinHandle<()> {
    runtime.spawn(async move {
        loop {
            tokio::select! {
                biased;
                ev = rx.recv() => match ev {
                    Ok(ev) => set.emit(ev),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = stop.cancelled() => break,
            }
        }
        loop {
            match rx.try_recv() {
                Ok(ev) => set.emit(ev),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        set.shutdown().await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::memory::MemoryConnector;

    #[tokio::test]
    async fn shares_supplied_status_board() {
        let board = Arc::new(StatusBoard::new());
        let ctx = ContextBuilder::new(Config {
            log_events: false,
            ..Config::default()
        })
        .with_status_board(Arc::clone(&board))
        .with_connector(Arc::new(MemoryConnector::refusing()))
        .build()
        .unwrap();
        assert!(Arc::ptr_eq(&board, &ctx.status()));
    }

    #[test]
    fn explicit_runtime_allows_building_outside_it() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let ctx = ContextBuilder::new(Config::default())
            .with_runtime(rt.handle().clone())
            .build()
            .unwrap();
        assert!(!ctx.is_shut_down());
        rt.block_on(ctx.shutdown());
        assert!(ctx.is_shut_down());
    }
}
