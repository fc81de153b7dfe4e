//! Symbol subscription and unsubscription operations.

use futures_util::SinkExt;
use tracing::{debug, info};
use tungstenite::Message;

use super::WsWriter;
use crate::Result;
use crate::models::SubscriptionRequest;

/// Subscribes to trades for `symbol`.
///
/// # Errors
///
/// Returns a [`CoinwatchError`](crate::CoinwatchError) if sending the subscription message fails.
pub async fn subscribe(write: &mut WsWriter, symbol: &str) -> Result<()> {
    let request = SubscriptionRequest::subscribe(symbol);
    send_request(write, &request).await?;
    info!(symbol, "Subscribed to symbol");

    Ok(())
}

/// Unsubscribes from trades for `symbol`.
///
/// # Errors
///
/// Returns a [`CoinwatchError`](crate::CoinwatchError) if sending the unsubscribe message fails.
pub async fn unsubscribe(write: &mut WsWriter, symbol: &str) -> Result<()> {
    let request = SubscriptionRequest::unsubscribe(symbol);
    send_request(write, &request).await?;
    info!(symbol, "Unsubscribed from symbol");

    Ok(())
}

async fn send_request(write: &mut WsWriter, request: &SubscriptionRequest) -> Result<()> {
    let json = serde_json::to_string(request)?;
    debug!("Sending {} request: {}", request.action.as_str(), json);
    write.send(Message::Text(json.into())).await?;

    Ok(())
}
