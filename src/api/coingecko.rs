use crate::models::coin::{CoinDirectoryEntry, CoinSummary};
use crate::queue::RequestQueue;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Hourly points kept from the 7-day sparkline payload.
const SPARKLINE_POINTS: usize = 24;

/// Entry from the bulk `/coins/list` id map. Platform addresses may be
/// null or empty upstream; they are dropped on conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinListItem {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub platforms: HashMap<String, Option<String>>,
}

impl From<CoinListItem> for CoinDirectoryEntry {
    fn from(item: CoinListItem) -> Self {
        let platforms = item
            .platforms
            .into_iter()
            .filter_map(|(chain, address)| match address {
                Some(address) if !address.is_empty() => Some((chain, address)),
                _ => None,
            })
            .collect();
        Self {
            id: item.id,
            name: item.name,
            symbol: item.symbol,
            platforms,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sparkline {
    #[serde(default)]
    pub price: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageUrls {
    pub thumb: Option<String>,
    pub small: Option<String>,
    pub large: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoinMarketData {
    pub current_price: Option<HashMap<String, f64>>,
    pub price_change_percentage_24h: Option<f64>,
    pub market_cap: Option<HashMap<String, f64>>,
    pub sparkline_7d: Option<Sparkline>,
}

/// Detailed payload from `/coins/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinDetail {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub image: Option<ImageUrls>,
    pub market_data: Option<CoinMarketData>,
}

impl CoinDetail {
    /// Missing upstream fields degrade to absent, never fail the record.
    pub fn into_summary(self) -> CoinSummary {
        let market_data = self.market_data.unwrap_or_default();
        CoinSummary {
            id: self.id,
            name: self.name,
            symbol: self.symbol.to_uppercase(),
            price: market_data
                .current_price
                .as_ref()
                .and_then(|prices| prices.get("usd").copied()),
            change_24h: market_data.price_change_percentage_24h,
            market_cap: market_data
                .market_cap
                .as_ref()
                .and_then(|caps| caps.get("usd").copied()),
            sparkline: tail(market_data.sparkline_7d),
            image: self
                .image
                .and_then(|urls| urls.thumb.or(urls.small).or(urls.large))
                .unwrap_or_default(),
            last_fetched: Utc::now(),
        }
    }
}

/// Row from the bulk `/coins/markets` listing.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinMarket {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub image: Option<String>,
    pub current_price: Option<f64>,
    pub price_change_percentage_24h: Option<f64>,
    pub market_cap: Option<f64>,
    pub sparkline_in_7d: Option<Sparkline>,
}

impl From<CoinMarket> for CoinSummary {
    fn from(row: CoinMarket) -> Self {
        Self {
            id: row.id,
            name: row.name,
            symbol: row.symbol.to_uppercase(),
            price: row.current_price,
            change_24h: row.price_change_percentage_24h,
            market_cap: row.market_cap,
            sparkline: tail(row.sparkline_in_7d),
            image: row.image.unwrap_or_default(),
            last_fetched: Utc::now(),
        }
    }
}

fn tail(sparkline: Option<Sparkline>) -> Vec<f64> {
    let prices = sparkline.map(|s| s.price).unwrap_or_default();
    let skip = prices.len().saturating_sub(SPARKLINE_POINTS);
    prices[skip..].to_vec()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyPrice {
    pub usd: Option<f64>,
}

/// Typed calls against the CoinGecko-shaped market provider. Every call
/// rides the shared request queue; `None` means "no data after retries".
#[derive(Clone)]
pub struct MarketApi {
    queue: Arc<RequestQueue>,
    base_url: String,
}

impl MarketApi {
    pub fn new(queue: Arc<RequestQueue>, base_url: String) -> Self {
        Self { queue, base_url }
    }

    pub async fn list_all_coins(&self) -> Option<Vec<CoinListItem>> {
        let url = format!("{}/coins/list?include_platform=true", self.base_url);
        self.queue.fetch_json(&url).await
    }

    pub async fn coin_detail(&self, id: &str) -> Option<CoinDetail> {
        let url = format!(
            "{}/coins/{}?localization=false&tickers=false&market_data=true&community_data=false&developer_data=false&sparkline=true",
            self.base_url, id
        );
        self.queue.fetch_json(&url).await
    }

    pub async fn markets_page(&self, per_page: u32, page: u32) -> Option<Vec<CoinMarket>> {
        let url = format!(
            "{}/coins/markets?vs_currency=usd&order=market_cap_desc&per_page={}&page={}&sparkline=true",
            self.base_url, per_page, page
        );
        self.queue.fetch_json(&url).await
    }

    pub async fn simple_price(&self, ids: &[&str]) -> Option<HashMap<String, CurrencyPrice>> {
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies=usd",
            self.base_url,
            ids.join(",")
        );
        self.queue.fetch_json(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_with_missing_market_data_degrades_to_absent_fields() {
        let detail = CoinDetail {
            id: "newcoin".to_string(),
            symbol: "new".to_string(),
            name: "New Coin".to_string(),
            image: None,
            market_data: None,
        };
        let summary = detail.into_summary();
        assert_eq!(summary.symbol, "NEW");
        assert!(summary.price.is_none());
        assert!(summary.market_cap.is_none());
        assert!(summary.sparkline.is_empty());
        assert_eq!(summary.image, "");
    }

    #[test]
    fn sparkline_keeps_only_the_most_recent_points() {
        let prices: Vec<f64> = (0..168).map(|i| i as f64).collect();
        let trimmed = tail(Some(Sparkline { price: prices }));
        assert_eq!(trimmed.len(), SPARKLINE_POINTS);
        assert_eq!(trimmed[0], 144.0);
        assert_eq!(*trimmed.last().unwrap(), 167.0);
    }

    #[test]
    fn list_item_conversion_drops_empty_platform_addresses() {
        let mut platforms = HashMap::new();
        platforms.insert("ethereum".to_string(), Some("0xabc".to_string()));
        platforms.insert("solana".to_string(), Some(String::new()));
        platforms.insert("tron".to_string(), None);
        let item = CoinListItem {
            id: "token".to_string(),
            symbol: "tkn".to_string(),
            name: "Token".to_string(),
            platforms,
        };
        let entry = CoinDirectoryEntry::from(item);
        assert_eq!(entry.platforms.len(), 1);
        assert_eq!(entry.platforms.get("ethereum").unwrap(), "0xabc");
    }
}
