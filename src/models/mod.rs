//! Wire models for the Finnhub real-time feed and the CoinGecko REST API.
//!
//! Contains the subscribe/unsubscribe directives sent over the feed and the
//! envelope used to route inbound feed messages.

pub mod coin;
pub mod trade;

use serde::{Deserialize, Serialize};

/// Directive kind carried in the `type` field of outbound feed messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Subscribe,
    Unsubscribe,
}

impl Action {
    /// Returns the wire-format name expected by the feed.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Subscribe => "subscribe",
            Action::Unsubscribe => "unsubscribe",
        }
    }
}

/// A `subscribe` or `unsubscribe` directive for a single symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionRequest {
    #[serde(rename = "type")]
    pub action: Action,
    pub symbol: String,
}

impl SubscriptionRequest {
    pub fn subscribe(symbol: &str) -> Self {
        Self {
            action: Action::Subscribe,
            symbol: symbol.to_string(),
        }
    }

    pub fn unsubscribe(symbol: &str) -> Self {
        Self {
            action: Action::Unsubscribe,
            symbol: symbol.to_string(),
        }
    }
}

/// Inbound feed message, routed on its `type` field.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FeedMessage {
    /// A batch of executed trades, oldest first. Records are kept raw;
    /// only the most recent one is decoded into a
    /// [`TradeData`](trade::TradeData).
    Trade {
        #[serde(default)]
        data: Vec<serde_json::Value>,
    },
    /// Keep-alive sent by the server.
    Ping,
    /// Server-side rejection (bad token, unknown symbol, rate limit).
    Error {
        #[serde(default)]
        msg: String,
    },
    /// Any other message type.
    #[serde(other)]
    Other,
}
