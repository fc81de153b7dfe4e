//! WebSocket transports for the quote feed.
//!
//! Each [`WsTransport`] is backed by its own connection task. A task does
//! not dial until the task of the transport it replaced has finished, so a
//! symbol switch always closes the old socket before the new one opens.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tungstenite::Message;

use super::{connect, subscribe, unsubscribe};
use crate::Result;
use crate::error::CoinwatchError;
use crate::feed::{ConnectionId, Connector, EventSender, Transport, TransportEvent};
use crate::models::{Action, SubscriptionRequest};

/// Commands from a [`WsTransport`] to its connection task.
enum Outbound {
    Request(SubscriptionRequest),
    Close,
}

/// Handle to one feed connection task.
pub struct WsTransport {
    id: ConnectionId,
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl WsTransport {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Transport for WsTransport {
    fn send(&mut self, request: &SubscriptionRequest) -> Result<()> {
        self.outbound
            .send(Outbound::Request(request.clone()))
            .map_err(|_| CoinwatchError::ConnectionClosed)
    }

    fn close(&mut self) {
        // Queued behind any pending directives.
        let _ = self.outbound.send(Outbound::Close);
    }
}

/// Opens Finnhub feed connections, one task per transport.
pub struct WsConnector {
    url: String,
    tls_config: Arc<rustls::ClientConfig>,
    events: EventSender,
    previous: Option<JoinHandle<()>>,
}

impl WsConnector {
    /// Creates a connector for the feed at `url`; every transport reports
    /// its events on `events`.
    #[must_use]
    pub fn new(url: String, tls_config: Arc<rustls::ClientConfig>, events: EventSender) -> Self {
        Self {
            url,
            tls_config,
            events,
            previous: None,
        }
    }
}

impl Connector for WsConnector {
    type Transport = WsTransport;

    fn open(&mut self, id: ConnectionId, credential: &str) -> Result<WsTransport> {
        let url = feed_url(&self.url, credential)?;
        let (outbound, outbound_rx) = mpsc::unbounded_channel();

        let previous = self.previous.take();
        let task = tokio::spawn(run_connection(
            id,
            url,
            self.tls_config.clone(),
            outbound_rx,
            self.events.clone(),
            previous,
        ));
        self.previous = Some(task);

        Ok(WsTransport { id, outbound })
    }
}

/// Builds the authenticated feed URL, e.g. `wss://ws.finnhub.io/?token=...`.
///
/// # Errors
///
/// Returns [`CoinwatchError::Config`] if `base` is not a valid URL.
pub fn feed_url(base: &str, credential: &str) -> Result<String> {
    let url = reqwest::Url::parse_with_params(base, &[("token", credential)])
        .map_err(|e| CoinwatchError::Config(format!("invalid feed URL {base}: {e}")))?;

    Ok(url.to_string())
}

async fn run_connection(
    id: ConnectionId,
    url: String,
    tls_config: Arc<rustls::ClientConfig>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    events: EventSender,
    previous: Option<JoinHandle<()>>,
) {
    if let Some(previous) = previous {
        let _ = previous.await;
    }

    debug!(connection = %id, "Dialing feed");
    let (mut write, mut read) = tokio::select! {
        biased;

        // Directives are only sent after Open, so this is a close or a drop.
        // Checked first so a transport closed before its turn never dials.
        _ = outbound.recv() => {
            debug!(connection = %id, "Connection abandoned before handshake");
            return;
        }
        result = connect(&url, tls_config) => match result {
            Ok(pair) => pair,
            Err(e) => {
                warn!(connection = %id, "Connection failed: {e}");
                let _ = events.send((id, TransportEvent::Error(e.to_string())));
                let _ = events.send((id, TransportEvent::Close));
                return;
            }
        },
    };

    if events.send((id, TransportEvent::Open)).is_ok() {
        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            let event = TransportEvent::Message(text.to_string());
                            if events.send((id, event)).is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            debug!(connection = %id, ?frame, "Server closed connection");
                            break;
                        }
                        Some(Ok(_)) => {} // Binary/Ping/Pong frames
                        Some(Err(e)) => {
                            warn!(connection = %id, "WebSocket error: {e}");
                            let _ = events.send((id, TransportEvent::Error(e.to_string())));
                            break;
                        }
                        None => {
                            warn!(connection = %id, "WebSocket stream ended");
                            break;
                        }
                    }
                }

                cmd = outbound.recv() => {
                    match cmd {
                        Some(Outbound::Request(request)) => {
                            let symbol = &request.symbol;
                            let result = match request.action {
                                Action::Subscribe => subscribe(&mut write, symbol).await,
                                Action::Unsubscribe => unsubscribe(&mut write, symbol).await,
                            };
                            if let Err(e) = result {
                                warn!(connection = %id, "Failed to send directive: {e}");
                                let _ = events.send((id, TransportEvent::Error(e.to_string())));
                                break;
                            }
                        }
                        Some(Outbound::Close) | None => {
                            if let Err(e) = write.close().await {
                                debug!(connection = %id, "Close handshake failed: {e}");
                            }
                            break;
                        }
                    }
                }
            }
        }
    }

    let _ = events.send((id, TransportEvent::Close));
    info!(connection = %id, "Connection closed");
}
