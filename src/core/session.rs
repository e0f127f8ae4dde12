//! # Run one open socket.
//!
//! Drives a connected [`Transport`] until it closes, fails or the link is
//! cancelled, and publishes the frame-level events.
//!
//! ## Event flow
//! ```text
//! open:    enter_open → Connected → on_open hook → flush pending frame
//! loop:    outbound frame ──► send_text     (error → SendFailed, session ends)
//!          inbound text   ──► decode → accept → observers
//!                                    └─► FrameRejected (socket stays open)
//!          Close / end    ──► session ends
//!          cancelled      ──► close socket, session ends
//! close:   enter_closed_after_session → Disconnected → on_close hook
//! ```
//!
//! ## Rules
//! - Cancellation wins over pending I/O (`biased` select)
//! - Inbound frames are applied in transport order
//! - A frame that fails to write is handed back to the send policy

use tokio::{select, sync::mpsc};
use tokio_util::sync::CancellationToken;

use crate::core::link::Shared;
use crate::events::EventKind;
use crate::transport::{Frame, Transport};

/// Runs a connected transport to completion.
pub(crate) async fn run_session<In: Send + Sync + 'static>(
    shared: &Shared<In>,
    generation: u64,
    token: &CancellationToken,
    mut transport: Box<dyn Transport>,
    outbound: &mut mpsc::UnboundedReceiver<String>,
    attempt: u32,
) {
    let Some(pending) = shared.enter_open(generation, attempt) else {
        let _ = transport.close().await;
        return;
    };
    let hooks = &shared.settings.hooks;

    let reason = 'session: {
        if let Some(hook) = &hooks.on_open {
            select! {
                _ = hook.call() => {}
                _ = token.cancelled() => {
                    let _ = transport.close().await;
                    break 'session "cancelled".to_string();
                }
            }
        }
        if let Some(frame) = pending {
            if let Err(reason) = send(shared, transport.as_mut(), frame).await {
                break 'session reason;
            }
        }

        loop {
            select! {
                biased;
                _ = token.cancelled() => {
                    let _ = transport.close().await;
                    break "cancelled".to_string();
                }
                Some(frame) = outbound.recv() => {
                    if let Err(reason) = send(shared, transport.as_mut(), frame).await {
                        break reason;
                    }
                }
                msg = transport.recv() => match msg {
                    Some(Ok(Frame::Text(text))) => shared.ingest(&text),
                    Some(Ok(Frame::Binary(data))) => match String::from_utf8(data) {
                        Ok(text) => shared.ingest(&text),
                        Err(e) => shared.publish(
                            shared
                                .event(EventKind::FrameRejected)
                                .with_reason(format!("binary frame is not utf-8: {e}")),
                        ),
                    },
                    Some(Ok(Frame::Close)) | None => break "closed by peer".to_string(),
                    Some(Err(e)) => break e.as_message(),
                },
            }
        }
    };

    shared.enter_closed_after_session(generation, outbound, &reason);
    if let Some(hook) = &hooks.on_close {
        hook.call().await;
    }
}

/// Writes one frame; on failure the frame goes back to the send policy.
async fn send<In: Send + Sync + 'static>(
    shared: &Shared<In>,
    transport: &mut dyn Transport,
    frame: String,
) -> Result<(), String> {
    match transport.send_text(frame.clone()).await {
        Ok(()) => Ok(()),
        Err(e) => {
            shared.requeue(frame);
            let reason = e.as_message();
            shared.publish(
                shared
                    .event(EventKind::SendFailed)
                    .with_reason(reason.clone()),
            );
            Err(reason)
        }
    }
}
