//! Crypto market dashboard library.
//!
//! Provides a CoinGecko REST client for market listings, coin details and
//! price history, in-memory list/favorites stores, and a live quote feed
//! over the Finnhub WebSocket API that keeps exactly one subscription open
//! for the currently selected symbol.

pub mod coingecko;
pub mod config;
pub mod error;
pub mod feed;
pub mod models;
pub mod store;
pub mod tls;
pub mod websocket;

pub use error::{CoinwatchError, Result};
