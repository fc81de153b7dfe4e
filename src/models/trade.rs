//! Trade feed models.

use rust_decimal::Decimal;
use serde::Deserialize;

/// A single executed trade from the `trade` feed message.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeData {
    #[serde(rename = "p")]
    pub price: Decimal,
    #[serde(rename = "b", default)]
    pub bid: Option<Decimal>,
    #[serde(rename = "a", default)]
    pub ask: Option<Decimal>,
    /// Exchange trade time in epoch milliseconds.
    #[serde(rename = "t", default)]
    pub timestamp: Option<i64>,
    #[serde(rename = "s", default)]
    pub symbol: Option<String>,
    #[serde(rename = "v", default)]
    pub volume: Option<Decimal>,
}

/// Latest known price snapshot for the subscribed symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub symbol: String,
    pub price: Decimal,
    pub bid: Option<Decimal>,
    pub ask: Option<Decimal>,
    /// Exchange-reported trade time in epoch milliseconds.
    pub timestamp: Option<i64>,
}

impl Quote {
    /// Builds a quote for `symbol` from a trade record.
    ///
    /// The quote carries `symbol` (the active subscription), not the
    /// symbol echoed in the trade record.
    pub fn from_trade(symbol: &str, trade: &TradeData) -> Self {
        Self {
            symbol: symbol.to_string(),
            price: trade.price,
            bid: trade.bid,
            ask: trade.ask,
            timestamp: trade.timestamp,
        }
    }
}
