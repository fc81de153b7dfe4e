//! Recently selected feed symbols. Lives for the session only.

/// Symbols offered before anything has been selected.
pub const DEFAULT_RECENT_SYMBOLS: [&str; 2] = ["BINANCE:BTCUSDT", "AAPL"];

pub const MAX_RECENT_SYMBOLS: usize = 10;

/// Recently selected symbols, newest first.
#[derive(Debug, Clone)]
pub struct RecentSymbols {
    items: Vec<String>,
}

impl Default for RecentSymbols {
    fn default() -> Self {
        Self {
            items: DEFAULT_RECENT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl RecentSymbols {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a selection. A new symbol goes to the front and the oldest
    /// entry falls off past [`MAX_RECENT_SYMBOLS`]; a symbol already in the
    /// list keeps its position.
    pub fn record(&mut self, symbol: &str) {
        let symbol = symbol.trim();
        if symbol.is_empty() || self.items.iter().any(|item| item == symbol) {
            return;
        }
        self.items.insert(0, symbol.to_string());
        self.items.truncate(MAX_RECENT_SYMBOLS);
    }

    /// Entry at a zero-based position.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(String::as_str)
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }
}
