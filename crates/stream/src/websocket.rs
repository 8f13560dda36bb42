//! WebSocket delivery endpoint for alert subscriptions
//!
//! One connection carries exactly one scope: the client's first text frame
//! names the scope, the server answers with an acknowledgment and then
//! streams subscription events until either side closes. Alerts cross the
//! socket as [`WireAlert`]s with flattened timestamps.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{error, info, warn};

use siren_domain::AlertId;

use crate::distributor::{RealtimeDistributor, SubscriptionEvent};
use crate::scope::Scope;
use crate::wire::WireAlert;

/// Frames sent to a subscribed client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// Scope accepted, snapshot follows
    Ack {
        /// Human-readable status message
        message: String,
    },
    /// Full current matching set
    Snapshot {
        /// Matching alerts
        alerts: Vec<WireAlert>,
    },
    /// One alert entered the scope or changed while in it
    Upserted {
        /// The changed alert
        alert: WireAlert,
    },
    /// A previously delivered alert left the scope
    Removed {
        /// Identifier of the departed alert
        id: AlertId,
    },
    /// Protocol error; the connection stays open
    Error {
        /// Human-readable reason
        message: String,
    },
}

/// WebSocket server fronting the realtime distributor
pub struct WsServer {
    distributor: Arc<RealtimeDistributor>,
    addr: SocketAddr,
}

impl WsServer {
    /// Create a server delivering the given distributor's subscriptions
    pub fn new(addr: SocketAddr, distributor: Arc<RealtimeDistributor>) -> Self {
        Self { distributor, addr }
    }

    /// Accept connections until the task is cancelled
    pub async fn run(self: Arc<Self>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let listener = TcpListener::bind(self.addr).await?;
        info!("subscription endpoint listening on {}", self.addr);

        loop {
            match listener.accept().await {
                Ok((stream, peer_addr)) => {
                    let server = Arc::clone(&self);
                    tokio::spawn(async move {
                        if let Err(e) = server.handle_connection(stream, peer_addr).await {
                            warn!("connection {} ended with error: {}", peer_addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("failed to accept connection: {}", e);
                }
            }
        }
    }

    async fn handle_connection(
        &self,
        stream: TcpStream,
        peer_addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ws_stream = accept_async(stream).await?;
        let (mut ws_sender, mut ws_receiver) = ws_stream.split();

        // First frame must name the scope for this session.
        let scope = loop {
            match ws_receiver.next().await {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<Scope>(&text) {
                    Ok(scope) => break scope,
                    Err(e) => {
                        let reply = WsMessage::Error {
                            message: format!("invalid scope: {e}"),
                        };
                        ws_sender
                            .send(Message::Text(serde_json::to_string(&reply)?))
                            .await?;
                    }
                },
                Some(Ok(Message::Close(_))) | None => return Ok(()),
                Some(Err(e)) => return Err(e.into()),
                _ => {}
            }
        };

        info!(peer = %peer_addr, ?scope, "subscription opened");
        let mut subscription = self.distributor.subscribe(scope);
        let ack = WsMessage::Ack { message: "subscribed".to_string() };
        ws_sender.send(Message::Text(serde_json::to_string(&ack)?)).await?;

        loop {
            tokio::select! {
                msg = ws_receiver.next() => {
                    match msg {
                        Some(Ok(Message::Text(_))) => {
                            // One scope per session; a second subscribe is a
                            // protocol error, not a re-scope.
                            let reply = WsMessage::Error {
                                message: "scope already set for this session".to_string(),
                            };
                            ws_sender
                                .send(Message::Text(serde_json::to_string(&reply)?))
                                .await?;
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            info!(peer = %peer_addr, "client closed subscription");
                            break;
                        }
                        Some(Err(e)) => {
                            warn!(peer = %peer_addr, "receive error: {}", e);
                            break;
                        }
                        _ => {}
                    }
                }

                event = subscription.recv() => {
                    match event {
                        Some(event) => {
                            let frame = event_to_message(event);
                            if let Err(e) = ws_sender
                                .send(Message::Text(serde_json::to_string(&frame)?))
                                .await
                            {
                                warn!(peer = %peer_addr, "send error: {}", e);
                                break;
                            }
                        }
                        None => {
                            info!(peer = %peer_addr, "subscription ended upstream");
                            break;
                        }
                    }
                }
            }
        }

        // Dropping the subscription aborts its fan-out task.
        subscription.close();
        Ok(())
    }
}

fn event_to_message(event: SubscriptionEvent) -> WsMessage {
    match event {
        SubscriptionEvent::Snapshot(alerts) => WsMessage::Snapshot {
            alerts: alerts.iter().map(WireAlert::from).collect(),
        },
        SubscriptionEvent::Upserted(alert) => {
            WsMessage::Upserted { alert: WireAlert::from(&alert) }
        }
        SubscriptionEvent::Removed(id) => WsMessage::Removed { id },
    }
}
