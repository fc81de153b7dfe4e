//! Market listing state: fetched coins plus the search and sort controls.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::Result;
use crate::models::coin::Coin;

/// Column the listing is sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    Price,
    #[default]
    MarketCap,
    PriceChange24h,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Price => "price",
            SortBy::MarketCap => "market_cap",
            SortBy::PriceChange24h => "price_change_24h",
        }
    }

    /// Sort key of `coin`; missing figures count as zero.
    fn key(&self, coin: &Coin) -> Decimal {
        let value = match self {
            SortBy::Price => coin.current_price,
            SortBy::MarketCap => coin.market_cap,
            SortBy::PriceChange24h => coin.price_change_percentage_24h,
        };
        value.unwrap_or(Decimal::ZERO)
    }
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "price" => Ok(SortBy::Price),
            "market_cap" => Ok(SortBy::MarketCap),
            "price_change_24h" | "change" => Ok(SortBy::PriceChange24h),
            other => Err(format!("unknown sort column: {other}")),
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

/// Coins fetched from the market listing together with the view controls.
#[derive(Debug, Clone, Default)]
pub struct CoinList {
    pub items: Vec<Coin>,
    pub loading: bool,
    pub error: Option<String>,
    pub search_query: String,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

impl CoinList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a fetch as in flight and clears the previous error.
    pub fn begin_fetch(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Stores the outcome of a fetch started with [`begin_fetch`](Self::begin_fetch).
    ///
    /// On failure the previous items are kept and the error message is
    /// recorded for display.
    pub fn finish_fetch(&mut self, result: Result<Vec<Coin>>) {
        self.loading = false;
        match result {
            Ok(items) => self.items = items,
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    pub fn set_search_query(&mut self, query: &str) {
        self.search_query = query.to_string();
    }

    pub fn set_sort_by(&mut self, sort_by: SortBy) {
        self.sort_by = sort_by;
    }

    pub fn set_sort_order(&mut self, sort_order: SortOrder) {
        self.sort_order = sort_order;
    }

    pub fn toggle_sort_order(&mut self) {
        self.sort_order = self.sort_order.toggled();
    }

    /// Coins matching the search query (case-insensitive, on name or
    /// symbol), sorted by the selected column and order.
    pub fn visible(&self) -> Vec<&Coin> {
        let query = self.search_query.trim().to_lowercase();
        let mut coins: Vec<&Coin> = self
            .items
            .iter()
            .filter(|coin| {
                coin.name.to_lowercase().contains(&query)
                    || coin.symbol.to_lowercase().contains(&query)
            })
            .collect();

        coins.sort_by(|a, b| {
            let (a, b) = (self.sort_by.key(a), self.sort_by.key(b));
            match self.sort_order {
                SortOrder::Asc => a.cmp(&b),
                SortOrder::Desc => b.cmp(&a),
            }
        });
        coins
    }
}
