//! CoinGecko market data models.

use std::collections::HashMap;

use chrono::DateTime;
use rust_decimal::Decimal;
use serde::Deserialize;

/// One row of the `/coins/markets` listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Coin {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub image: String,
    pub current_price: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    pub market_cap_rank: Option<u32>,
    pub price_change_percentage_24h: Option<Decimal>,
    pub circulating_supply: Option<Decimal>,
}

/// Response of the `/coins/{id}` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinDetail {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub market_data: MarketData,
    /// Project description keyed by locale (`"en"`, `"de"`, ...).
    #[serde(default)]
    pub description: HashMap<String, String>,
    #[serde(default)]
    pub image: CoinImage,
}

impl CoinDetail {
    /// Returns the description for `locale`, if present and non-empty.
    pub fn description_in(&self, locale: &str) -> Option<&str> {
        self.description
            .get(locale)
            .map(String::as_str)
            .filter(|d| !d.is_empty())
    }
}

/// Market figures of a [`CoinDetail`]; per-currency maps are keyed by
/// lowercase currency code.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketData {
    #[serde(default)]
    pub current_price: HashMap<String, Decimal>,
    pub price_change_percentage_24h: Option<Decimal>,
    #[serde(default)]
    pub market_cap: HashMap<String, Decimal>,
    #[serde(default)]
    pub total_volume: HashMap<String, Decimal>,
    #[serde(default)]
    pub ath: HashMap<String, Decimal>,
    #[serde(default)]
    pub atl: HashMap<String, Decimal>,
    pub circulating_supply: Option<Decimal>,
}

impl MarketData {
    pub fn price_in(&self, currency: &str) -> Option<Decimal> {
        self.current_price.get(currency).copied()
    }

    pub fn market_cap_in(&self, currency: &str) -> Option<Decimal> {
        self.market_cap.get(currency).copied()
    }

    pub fn volume_in(&self, currency: &str) -> Option<Decimal> {
        self.total_volume.get(currency).copied()
    }

    pub fn ath_in(&self, currency: &str) -> Option<Decimal> {
        self.ath.get(currency).copied()
    }

    pub fn atl_in(&self, currency: &str) -> Option<Decimal> {
        self.atl.get(currency).copied()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoinImage {
    #[serde(default)]
    pub thumb: Option<String>,
    #[serde(default)]
    pub small: Option<String>,
    #[serde(default)]
    pub large: Option<String>,
}

/// Response of the `/coins/{id}/market_chart` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketChart {
    /// `[timestamp_ms, price]` pairs, oldest first.
    pub prices: Vec<(i64, Decimal)>,
}

/// A chart-ready price sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartPoint {
    pub timestamp: i64,
    /// Short UTC date, e.g. `"Mar 7"`.
    pub label: String,
    /// Price rounded to two decimal places.
    pub price: Decimal,
}

impl MarketChart {
    /// Converts the raw series into labelled points, skipping samples whose
    /// timestamp is out of range.
    pub fn points(&self) -> Vec<ChartPoint> {
        self.prices
            .iter()
            .filter_map(|&(timestamp, price)| {
                let date = DateTime::from_timestamp_millis(timestamp)?;
                Some(ChartPoint {
                    timestamp,
                    label: date.format("%b %-d").to_string(),
                    price: price.round_dp(2),
                })
            })
            .collect()
    }
}
