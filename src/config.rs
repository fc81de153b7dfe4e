//! Application configuration loaded from environment variables.
//!
//! - `FINNHUB_TOKEN`: access token for the real-time quote feed
//! - `FINNHUB_WEBSOCKET_URL`: overrides the default feed endpoint
//! - `COINGECKO_API_URL`: overrides the default market data endpoint
//! - `COINWATCH_VS_CURRENCY`: quote currency for market data (default `usd`)
//! - `COINWATCH_CA_BUNDLE`: PEM file with extra trusted root certificates
//!
//! Empty values are treated the same as unset ones.

use std::path::PathBuf;

/// Default real-time feed endpoint.
const DEFAULT_WEBSOCKET_URL: &str = "wss://ws.finnhub.io";

/// Default market data endpoint.
const DEFAULT_API_URL: &str = "https://api.coingecko.com/api/v3";

const DEFAULT_VS_CURRENCY: &str = "usd";

/// Top-level application configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub finnhub: FinnhubConfig,
    pub coingecko: CoinGeckoConfig,
    pub ca_bundle: Option<PathBuf>,
}

/// Real-time feed configuration.
#[derive(Debug, Clone)]
pub struct FinnhubConfig {
    pub websocket_url: String,
    pub token: Option<String>,
}

/// Market data REST configuration.
#[derive(Debug, Clone)]
pub struct CoinGeckoConfig {
    pub api_url: String,
    pub vs_currency: String,
}

/// Loads the application configuration from environment variables.
///
/// # Errors
///
/// Returns [`CoinwatchError::Config`](crate::CoinwatchError::Config) if an
/// endpoint override does not use the expected URL scheme.
pub fn fetch_config() -> crate::Result<AppConfig> {
    let websocket_url = non_empty_var("FINNHUB_WEBSOCKET_URL")
        .unwrap_or_else(|| DEFAULT_WEBSOCKET_URL.to_string());
    let api_url = non_empty_var("COINGECKO_API_URL")
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    require_scheme("FINNHUB_WEBSOCKET_URL", &websocket_url, &["ws://", "wss://"])?;
    require_scheme("COINGECKO_API_URL", &api_url, &["http://", "https://"])?;

    let vs_currency = non_empty_var("COINWATCH_VS_CURRENCY")
        .map(|c| c.to_lowercase())
        .unwrap_or_else(|| DEFAULT_VS_CURRENCY.to_string());

    Ok(AppConfig {
        finnhub: FinnhubConfig {
            websocket_url,
            token: non_empty_var("FINNHUB_TOKEN"),
        },
        coingecko: CoinGeckoConfig {
            api_url: api_url.trim_end_matches('/').to_string(),
            vs_currency,
        },
        ca_bundle: non_empty_var("COINWATCH_CA_BUNDLE").map(PathBuf::from),
    })
}

fn require_scheme(name: &str, url: &str, schemes: &[&str]) -> crate::Result<()> {
    if schemes.iter().any(|s| url.starts_with(s)) {
        return Ok(());
    }
    Err(crate::CoinwatchError::Config(format!(
        "{name} must start with one of {}: {url}",
        schemes.join(", ")
    )))
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}
