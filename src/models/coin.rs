use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Stablecoin ids excluded from every trending category.
pub const STABLECOIN_IDS: &[&str] = &["tether", "usd-coin", "dai", "binance-usd", "true-usd"];

pub fn is_stablecoin(id: &str) -> bool {
    STABLECOIN_IDS.contains(&id)
}

/// Canonical identity and market snapshot for one asset. `id` is the stable
/// key across all caches and the directory; every other field is refreshed
/// in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinSummary {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub price: Option<f64>,
    pub change_24h: Option<f64>,
    pub market_cap: Option<f64>,
    /// Up to 24 hourly USD prices, most-recent-last. Empty when the upstream
    /// payload had no sparkline.
    pub sparkline: Vec<f64>,
    pub image: String,
    pub last_fetched: DateTime<Utc>,
}

/// Lightweight record from the full coin universe, used only for text and
/// contract resolution. Not market data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinDirectoryEntry {
    pub id: String,
    pub name: String,
    pub symbol: String,
    /// Chain name -> contract address. Both sides compared case-insensitively.
    #[serde(default)]
    pub platforms: HashMap<String, String>,
}

impl CoinDirectoryEntry {
    pub fn has_contract(&self, address: &str) -> bool {
        self.platforms.values().any(|a| a.eq_ignore_ascii_case(address))
    }

    pub fn contract_on(&self, chain: &str) -> Option<&str> {
        self.platforms.get(chain).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendingCategory {
    Crypto,
    Ethereum,
    Solana,
}

/// Three capped, ranked leaderboards. Regenerated wholesale on each refresh,
/// never mutated incrementally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendingSet {
    pub crypto: Vec<CoinSummary>,
    pub ethereum: Vec<CoinSummary>,
    pub solana: Vec<CoinSummary>,
}

impl TrendingSet {
    pub fn category(&self, category: TrendingCategory) -> &[CoinSummary] {
        match category {
            TrendingCategory::Crypto => &self.crypto,
            TrendingCategory::Ethereum => &self.ethereum,
            TrendingCategory::Solana => &self.solana,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.crypto.is_empty() && self.ethereum.is_empty() && self.solana.is_empty()
    }
}
