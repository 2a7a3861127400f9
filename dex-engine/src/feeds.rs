//! Market ticker and news feeds.

use crate::config::FeedConfig;
use crate::schedule::{spawn_periodic, RefreshHandle};
use anyhow::{Context, Result};
use chrono::Utc;
use dex_core::{CryptoPrice, NewsItem};
use parking_lot::RwLock;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub struct PriceFeed {
    client: Client,
    url: String,
    latest: RwLock<Vec<CryptoPrice>>,
}

impl PriceFeed {
    pub fn new(cfg: &FeedConfig, timeout_ms: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .context("build reqwest client")?;
        Ok(Self {
            client,
            url: cfg.prices_url.clone(),
            latest: RwLock::new(Vec::new()),
        })
    }

    async fn fetch(&self) -> Result<Vec<CryptoPrice>> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("price request")?
            .error_for_status()
            .context("price response status")?;
        resp.json().await.context("decode price list")
    }

    /// Replaces the ticker with fresh prices, or with the built-in snapshot
    /// when the market API is unreachable.
    pub async fn refresh(&self) -> usize {
        let prices = match self.fetch().await {
            Ok(p) => {
                debug!(target: "feeds", count=p.len(), "prices refreshed");
                p
            }
            Err(err) => {
                warn!(target: "feeds", error=%err, "price fetch failed, using snapshot");
                fallback_prices()
            }
        };
        let n = prices.len();
        *self.latest.write() = prices;
        n
    }

    pub fn latest(&self) -> Vec<CryptoPrice> {
        self.latest.read().clone()
    }

    pub fn start(self: &Arc<Self>, every: Duration) -> RefreshHandle {
        let feed = Arc::clone(self);
        spawn_periodic("prices", every, move || {
            let feed = Arc::clone(&feed);
            async move {
                feed.refresh().await;
            }
        })
    }
}

#[derive(Default)]
pub struct NewsFeed {
    latest: RwLock<Vec<NewsItem>>,
}

impl NewsFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn refresh(&self) -> usize {
        let items = builtin_news(Utc::now().timestamp());
        let n = items.len();
        *self.latest.write() = items;
        debug!(target: "feeds", count=n, "news refreshed");
        n
    }

    pub fn latest(&self) -> Vec<NewsItem> {
        self.latest.read().clone()
    }

    pub fn start(self: &Arc<Self>, every: Duration) -> RefreshHandle {
        let feed = Arc::clone(self);
        spawn_periodic("news", every, move || {
            let feed = Arc::clone(&feed);
            async move {
                feed.refresh().await;
            }
        })
    }
}

/// Relative age such as `"45m ago"`.
pub fn format_age(published_at: i64, now: i64) -> String {
    let mins = (now - published_at).max(0) / 60;
    if mins < 1 {
        "just now".to_string()
    } else if mins < 60 {
        format!("{}m ago", mins)
    } else if mins < 60 * 24 {
        format!("{}h ago", mins / 60)
    } else {
        format!("{}d ago", mins / (60 * 24))
    }
}

fn price(id: &str, symbol: &str, name: &str, usd: f64, change: f64) -> CryptoPrice {
    CryptoPrice {
        id: id.to_string(),
        symbol: symbol.to_string(),
        name: name.to_string(),
        current_price: usd,
        price_change_percentage_24h: Some(change),
        image: String::new(),
    }
}

pub fn fallback_prices() -> Vec<CryptoPrice> {
    vec![
        price("bitcoin", "btc", "Bitcoin", 67_234.12, 2.34),
        price("ethereum", "eth", "Ethereum", 3_456.78, -1.23),
        price("solana", "sol", "Solana", 178.45, 5.67),
        price("binancecoin", "bnb", "BNB", 567.89, 0.89),
        price("ripple", "xrp", "XRP", 0.5234, -2.45),
        price("cardano", "ada", "Cardano", 0.4567, 3.21),
        price("avalanche-2", "avax", "Avalanche", 34.56, 1.78),
        price("dogecoin", "doge", "Dogecoin", 0.1234, -0.56),
        price("chainlink", "link", "Chainlink", 14.56, 4.32),
        price("uniswap", "uni", "Uniswap", 9.87, 1.45),
        price("arbitrum", "arb", "Arbitrum", 1.23, 1.56),
        price("optimism", "op", "Optimism", 2.34, 2.78),
    ]
}

fn news(id: &str, title: &str, source: &str, url: &str, at: i64, currencies: &[&str]) -> NewsItem {
    NewsItem {
        id: id.to_string(),
        title: title.to_string(),
        source: source.to_string(),
        url: url.to_string(),
        published_at: at,
        currencies: currencies.iter().map(|c| c.to_string()).collect(),
    }
}

pub fn builtin_news(now: i64) -> Vec<NewsItem> {
    let mins = |m: i64| now - m * 60;
    vec![
        news("1", "Rise testnet opens to public builders", "CoinDesk", "https://coindesk.com", mins(30), &["RISE", "ETH"]),
        news("2", "Ethereum gas fees fall after network upgrade", "The Block", "https://theblock.co", mins(60), &["ETH"]),
        news("3", "DeFi total value locked climbs again", "Decrypt", "https://decrypt.co", mins(90), &["DeFi"]),
        news("4", "Spot bitcoin fund inflows reach new high", "Bloomberg Crypto", "https://bloomberg.com", mins(120), &["BTC"]),
        news("5", "Stablecoin supply grows on layer 2 networks", "The Defiant", "https://thedefiant.io", mins(180), &["USDC", "USDT"]),
        news("6", "Prediction markets see record testnet activity", "Blockworks", "https://blockworks.co", mins(240), &["RISE"]),
    ]
}
