//! Async WebSocket client for the Finnhub real-time feed.
//!
//! This module is organized by domain:
//! - [`subscription`] - Symbol subscribe/unsubscribe directives
//! - [`handler`] - Incoming message parsing
//! - [`connection`] - Per-symbol connection tasks driven by the quote feed

mod connection;
mod handler;
mod subscription;

use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::stream::{SplitSink, SplitStream};
use tokio::net::TcpStream;
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream};
use tracing::info;
use tungstenite::Message;

use crate::Result;

// Re-export submodule items at the module level for convenience
pub use connection::{WsConnector, WsTransport, feed_url};
pub use handler::latest_trade;
pub use subscription::{subscribe, unsubscribe};

/// Write half of a feed WebSocket connection.
pub type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Read half of a feed WebSocket connection.
pub type WsReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Establishes a WebSocket connection to the given URL using the
/// provided TLS configuration.
///
/// # Errors
///
/// Returns a [`CoinwatchError`](crate::CoinwatchError) if the connection or
/// TLS handshake fails.
pub async fn connect(
    url: &str,
    tls_config: Arc<rustls::ClientConfig>,
) -> Result<(WsWriter, WsReader)> {
    let (ws_stream, _) = tokio_tungstenite::connect_async_tls_with_config(
        url,
        None,
        false,
        Some(Connector::Rustls(tls_config)),
    )
    .await?;
    info!("WebSocket handshake completed");

    Ok(ws_stream.split())
}
