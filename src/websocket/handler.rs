//! Incoming feed message processing.

use tracing::{debug, warn};

use crate::Result;
use crate::error::CoinwatchError;
use crate::models::FeedMessage;
use crate::models::trade::TradeData;

/// Parses an inbound text frame and returns the most recent trade in it.
///
/// Only `trade` messages with a non-empty `data` array yield a trade; the
/// last element of the batch is taken as most recent and is the only one
/// decoded. Every other message type yields `Ok(None)`.
///
/// # Errors
///
/// Returns [`CoinwatchError::MalformedMessage`] if the frame is not valid
/// JSON, does not match any known message shape, or its last trade record
/// is unreadable.
pub fn latest_trade(text: &str) -> Result<Option<TradeData>> {
    let message: FeedMessage =
        serde_json::from_str(text).map_err(|e| CoinwatchError::MalformedMessage(e.to_string()))?;

    match message {
        FeedMessage::Trade { mut data } => match data.pop() {
            Some(record) => serde_json::from_value(record)
                .map(Some)
                .map_err(|e| CoinwatchError::MalformedMessage(e.to_string())),
            None => Ok(None),
        },
        FeedMessage::Ping => {
            debug!("Received ping");
            Ok(None)
        }
        FeedMessage::Error { msg } => {
            warn!(msg = %msg, "Feed reported an error");
            Ok(None)
        }
        FeedMessage::Other => Ok(None),
    }
}
