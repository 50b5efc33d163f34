//! Market data abstractions and the last-good snapshot shown to the user.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    #[serde(default)]
    pub id: Option<String>,
    pub symbol: String,
    pub name: String,
    pub current_price: f64,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Market data request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Market data source returned status {0}")]
    Status(u16),

    #[error("Failed to parse market data: {0}")]
    Decode(#[from] serde_json::Error),
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_top_coins(&self, n: usize) -> Result<Vec<Coin>, FetchError>;
}

#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub coins: Vec<Coin>,
    pub fetched_at: DateTime<Utc>,
}

impl MarketSnapshot {
    pub fn find(&self, name_or_symbol: &str) -> Option<&Coin> {
        self.coins.iter().find(|coin| {
            coin.name.eq_ignore_ascii_case(name_or_symbol)
                || coin.symbol.eq_ignore_ascii_case(name_or_symbol)
        })
    }
}

/// Keeps the most recent successful quote list. A failed refresh leaves the
/// previous snapshot in place.
#[derive(Clone)]
pub struct MarketFeed {
    provider: Arc<dyn MarketDataProvider>,
    per_page: usize,
    snapshot: Arc<RwLock<Option<MarketSnapshot>>>,
}

impl MarketFeed {
    pub fn new(provider: Arc<dyn MarketDataProvider>, per_page: usize) -> Self {
        Self {
            provider,
            per_page,
            snapshot: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn snapshot(&self) -> Option<MarketSnapshot> {
        self.snapshot.read().await.clone()
    }

    pub async fn refresh(&self) -> Result<(), FetchError> {
        match self.provider.fetch_top_coins(self.per_page).await {
            Ok(coins) => {
                debug!(count = coins.len(), "Market snapshot refreshed");
                *self.snapshot.write().await = Some(MarketSnapshot {
                    coins,
                    fetched_at: Utc::now(),
                });
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Could not load market data, keeping last snapshot");
                Err(e)
            }
        }
    }

    /// Refreshes on every tick of `interval`, starting immediately. The task
    /// runs until the returned handle is stopped or dropped.
    pub fn spawn(&self, interval: Duration) -> FeedHandle {
        let feed = self.clone();
        let (updates, _) = tokio::sync::broadcast::channel(4);
        let sender = updates.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let ok = feed.refresh().await.is_ok();
                // No receivers is fine
                let _ = sender.send(ok);
            }
        });
        info!(?interval, "Market refresh started");
        FeedHandle {
            task: Some(task),
            updates,
        }
    }
}

pub struct FeedHandle {
    task: Option<JoinHandle<()>>,
    updates: tokio::sync::broadcast::Sender<bool>,
}

impl FeedHandle {
    /// Receives `true` after each successful refresh and `false` after a
    /// failed one.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<bool> {
        self.updates.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("Market refresh stopped");
        }
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
