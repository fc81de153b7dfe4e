//! CoinGecko REST client for market listings, coin details and price history.

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::CoinwatchError;
use crate::Result;
use crate::config::CoinGeckoConfig;
use crate::models::coin::{Coin, CoinDetail, MarketChart};

/// Page size used for the market listing.
const MARKETS_PER_PAGE: u32 = 50;

/// Days of history shown on the coin detail view.
pub const DETAIL_CHART_DAYS: u32 = 7;

/// Thin async client over the public CoinGecko v3 API.
pub struct CoinGeckoClient {
    http: reqwest::Client,
    api_url: String,
    vs_currency: String,
}

impl CoinGeckoClient {
    /// Creates a client using the given TLS configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoinwatchError::Tls`] if the HTTP client cannot be built.
    pub fn new(config: &CoinGeckoConfig, tls_config: rustls::ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .use_preconfigured_tls(tls_config)
            .user_agent(concat!("coinwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CoinwatchError::Tls(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            vs_currency: config.vs_currency.clone(),
        })
    }

    /// Currency all prices are quoted in.
    pub fn vs_currency(&self) -> &str {
        &self.vs_currency
    }

    /// Fetches the first page of coins ordered by market cap.
    ///
    /// # Errors
    ///
    /// Returns [`CoinwatchError::Http`] on transport failure, a non-success
    /// status, or an undecodable body.
    pub async fn fetch_markets(&self) -> Result<Vec<Coin>> {
        let per_page = MARKETS_PER_PAGE.to_string();
        let coins: Vec<Coin> = self
            .get(
                "coins/markets",
                &[
                    ("vs_currency", self.vs_currency.as_str()),
                    ("order", "market_cap_desc"),
                    ("per_page", per_page.as_str()),
                    ("page", "1"),
                    ("sparkline", "false"),
                ],
            )
            .await?;

        info!(count = coins.len(), "Fetched market listing");
        Ok(coins)
    }

    /// Fetches market data and description for one coin.
    ///
    /// # Errors
    ///
    /// Returns [`CoinwatchError::Http`] if the request fails or the coin
    /// does not exist.
    pub async fn fetch_coin_detail(&self, coin_id: &str) -> Result<CoinDetail> {
        let detail: CoinDetail = self
            .get(
                &format!("coins/{coin_id}"),
                &[
                    ("localization", "false"),
                    ("market_data", "true"),
                    ("sparkline", "false"),
                ],
            )
            .await?;

        info!(coin = coin_id, "Fetched coin detail");
        Ok(detail)
    }

    /// Fetches `days` of price history for one coin.
    ///
    /// # Errors
    ///
    /// Returns [`CoinwatchError::Http`] if the request fails.
    pub async fn fetch_market_chart(&self, coin_id: &str, days: u32) -> Result<MarketChart> {
        let days = days.to_string();
        let chart: MarketChart = self
            .get(
                &format!("coins/{coin_id}/market_chart"),
                &[
                    ("vs_currency", self.vs_currency.as_str()),
                    ("days", days.as_str()),
                ],
            )
            .await?;

        info!(coin = coin_id, samples = chart.prices.len(), "Fetched price history");
        Ok(chart)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/{path}", self.api_url);
        debug!(%url, "GET");

        let response = self.http.get(&url).query(query).send().await?;
        let response = response.error_for_status()?;

        Ok(response.json().await?)
    }
}
