//! In-memory state containers consumed by the presentation layer.

mod coins;
mod favorites;
mod history;

pub use coins::{CoinList, SortBy, SortOrder};
pub use favorites::Favorites;
pub use history::{DEFAULT_RECENT_SYMBOLS, MAX_RECENT_SYMBOLS, RecentSymbols};
