use super::util::with_retry;
use crate::core::market::{Coin, FetchError, MarketDataProvider};
use async_trait::async_trait;
use tracing::{debug, error, instrument};

pub struct CoinGeckoProvider {
    base_url: String,
    retries: usize,
}

impl CoinGeckoProvider {
    pub fn new(base_url: &str, retries: usize) -> Self {
        CoinGeckoProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            retries,
        }
    }
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    #[instrument(name = "CoinGeckoMarkets", skip(self))]
    async fn fetch_top_coins(&self, n: usize) -> Result<Vec<Coin>, FetchError> {
        let url = format!(
            "{}/api/v3/coins/markets?vs_currency=usd&order=market_cap_desc&per_page={}&page=1",
            self.base_url, n
        );
        debug!("Requesting market data from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("cryptoverse/0.1")
            .build()?;
        let response = with_retry(|| async { client.get(&url).send().await }, self.retries, 500)
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let response_text = response.text().await?;
        let coins: Vec<Coin> = match serde_json::from_str(&response_text) {
            Ok(coins) => coins,
            Err(e) => {
                error!(
                    error = ?e,
                    response = %response_text,
                    "Failed to parse market data response"
                );
                return Err(e.into());
            }
        };

        debug!(count = coins.len(), "Received market data");
        Ok(coins)
    }
}
