//! Notification channel to the protection service.
//!
//! # Data Flow
//! ```text
//! WebSocket frames
//!     → reader task (decode_notification, drop malformed)
//!     → mpsc<Notification>
//!     → consumer loop (events + approval signals)
//! ```
//!
//! One connection per session, no automatic reconnection.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;

use crate::approval::{ApprovalSender, ApprovalSignal};
use crate::events::{EventKind, EventLog};
use crate::observability::metrics;
use crate::protection::types::{decode_notification, InboundMessage, Notification, ProtectionError};

const INBOUND_QUEUE: usize = 64;

/// Why the channel stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelClosed {
    /// The session was torn down.
    Teardown,
    /// The service closed the connection or the transport failed.
    Remote,
}

pub struct NotificationChannel {
    ws_url: String,
    events: EventLog,
    approvals: ApprovalSender,
}

impl NotificationChannel {
    pub fn new(ws_url: impl Into<String>, events: EventLog, approvals: ApprovalSender) -> Self {
        Self {
            ws_url: ws_url.into(),
            events,
            approvals,
        }
    }

    /// Connect, then dispatch notifications until teardown or remote close.
    ///
    /// Only a failed connect is an error; once open, the channel always ends
    /// with a disconnect event.
    pub async fn run(self, cancel: CancellationToken) -> Result<ChannelClosed, ProtectionError> {
        let connect = tokio::select! {
            _ = cancel.cancelled() => return Ok(ChannelClosed::Teardown),
            result = connect_async(self.ws_url.as_str()) => result,
        };
        let (ws, _) = connect.map_err(|e| ProtectionError::Transport(e.to_string()))?;

        tracing::info!(url = %self.ws_url, "Notification channel open");
        self.events.append(
            EventKind::NotificationConnected,
            "Connected to protection service",
            None,
        );

        let (mut sink, mut stream) = ws.split();
        let (inbound_tx, mut inbound) = mpsc::channel::<Notification>(INBOUND_QUEUE);

        let reader = tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Text(text)) => match decode_notification(&text) {
                        Ok(notification) => {
                            if inbound_tx.send(notification).await.is_err() {
                                break;
                            }
                        }
                        Err(ProtectionError::Unrecognized(kind)) => {
                            metrics::record_notification("unrecognized");
                            tracing::warn!(kind = %kind, "Ignoring unrecognized notification");
                        }
                        Err(e) => {
                            metrics::record_notification("malformed");
                            tracing::warn!(error = %e, "Error parsing notification, discarding");
                        }
                    },
                    Ok(Message::Close(frame)) => {
                        tracing::info!(frame = ?frame, "Protection service closed the channel");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "Notification transport error");
                        break;
                    }
                }
            }
        });

        let closed = loop {
            tokio::select! {
                _ = cancel.cancelled() => break ChannelClosed::Teardown,
                notification = inbound.recv() => match notification {
                    Some(notification) => self.dispatch(notification).await,
                    None => break ChannelClosed::Remote,
                },
            }
        };

        if closed == ChannelClosed::Teardown {
            if let Err(e) = sink.send(Message::Close(None)).await {
                tracing::debug!(error = %e, "Close frame not delivered");
            }
            reader.abort();
        }

        self.events.append(
            EventKind::NotificationDisconnected,
            "Disconnected from protection service",
            None,
        );
        tracing::info!(reason = ?closed, "Notification channel closed");
        Ok(closed)
    }

    async fn dispatch(&self, notification: Notification) {
        metrics::record_notification(notification.message.kind());

        match notification.message {
            InboundMessage::ApprovalDetected { tx_hash, .. } => {
                self.events.append(
                    EventKind::ApprovalDetected,
                    "Malicious approval detected!",
                    Some(notification.raw),
                );
                if self.approvals.send(ApprovalSignal::remote(tx_hash)).await.is_err() {
                    tracing::warn!("Approval watcher gone, notification dropped");
                }
            }
            InboundMessage::FreezeTriggered { .. } => {
                self.events.append(
                    EventKind::FreezeTriggered,
                    "Protection activated! Tokens frozen across all networks",
                    Some(notification.raw),
                );
            }
        }
    }
}
