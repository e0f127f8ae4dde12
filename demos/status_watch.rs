//! # Example: status_watch
//!
//! Mirrors an instrument server's status feed and user settings, and prints
//! the connection board whenever a status link connects or drops.
//!
//! Shows how to:
//! - Build a [`StoreContext`] with a custom [`Subscribe`] that shares its [`StatusBoard`].
//! - Create a read-only status store that reports to the [`StatusBoard`].
//! - Create a writable settings store and update it with `update`.
//! - Shut down cleanly on Ctrl-C / SIGTERM.
//!
//! ## Flow
//! ```text
//! ContextBuilder::build()
//!     ├─► ctx.store(readable "status").report_status()
//!     ├─► ctx.store(writable "settings")
//!     ├─► subscribe ──► LinkActor::run() per store
//!     │     └─► publish(Connecting / Connected / Disconnected / BackoffScheduled)
//!     └─► context listener ──► LogWriter, BoardPrinter.on_event()
//! ```
//!
//! ## Run
//! Point it at any server exposing `/status` and `/usersettings` sockets:
//! ```bash
//! RUST_LOG=info WIRESTATE_HOST=localhost:8080 cargo run --example status_watch
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use wirestate::{
    Config, ContextBuilder, Event, EventKind, StatusBoard, StoreContext, StoreSpec, Subscribe,
};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Settings {
    #[serde(default)]
    exposure_ms: u32,
    #[serde(default)]
    gain: f32,
}

/// Prints the board after every status transition.
struct BoardPrinter {
    board: Arc<StatusBoard>,
}

#[async_trait::async_trait]
impl Subscribe for BoardPrinter {
    async fn on_event(&self, ev: &Event) {
        if !matches!(
            ev.kind,
            EventKind::Connected | EventKind::Disconnected | EventKind::LinkStopped
        ) {
            return;
        }
        let line = self
            .board
            .snapshot()
            .into_iter()
            .map(|(name, up)| format!("{name}={}", if up { "up" } else { "down" }))
            .collect::<Vec<_>>()
            .join(" ");
        println!("[board] {line} (all connected: {})", self.board.all_connected());
    }

    fn name(&self) -> &'static str {
        "board-printer"
    }
}

fn build_context() -> Result<Arc<StoreContext>, wirestate::RuntimeError> {
    let board = Arc::new(StatusBoard::new());
    let printer: Arc<dyn Subscribe> = Arc::new(BoardPrinter {
        board: Arc::clone(&board),
    });
    ContextBuilder::new(Config::default())
        .with_status_board(board)
        .with_subscribers(vec![printer])
        .build()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let host = std::env::var("WIRESTATE_HOST").unwrap_or_else(|_| "localhost:8080".to_string());
    let ctx = build_context()?;

    let status = ctx.store(
        StoreSpec::<Vec<String>, ()>::readable("status", format!("ws://{host}/status"), Vec::new())
            .report_status(),
    )?;
    let settings = ctx.store(StoreSpec::writable(
        "settings",
        format!("ws://{host}/usersettings"),
        Settings::default(),
    ))?;

    let _status_sub = status.subscribe(|lines| {
        for line in lines {
            println!("[status] {line}");
        }
    });
    let _settings_sub =
        settings.subscribe(|s| println!("[settings] exposure={}ms gain={}", s.exposure_ms, s.gain));

    // Deferred until the socket opens.
    settings.update(|s| Settings {
        exposure_ms: s.exposure_ms.max(10),
        ..s.clone()
    })?;

    ctx.run_until_signal().await?;
    println!("[main] stopped; last status had {} lines", status.get().len());
    Ok(())
}
