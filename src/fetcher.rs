use crate::api::coingecko::MarketApi;
use crate::api::sentiment::SentimentClient;
use crate::config::CacheConfig;
use crate::directory::CoinDirectory;
use crate::models::coin::{is_stablecoin, CoinSummary, TrendingSet};
use crate::storage::LocalStore;
use crate::utils::cache::Cache;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub const TRENDING_KEY: &str = "trending_watchlists";
pub const PRICES_KEY: &str = "all_prices";
pub const SENTIMENT_KEY: &str = "fear_greed";

/// Reference assets for the header ticker and portfolio valuation.
pub const REFERENCE_IDS: &[&str] = &["bitcoin", "ethereum", "solana", "ripple"];

const MARKETS_PAGE_SIZE: u32 = 250;
const TRENDING_CAP: usize = 10;

fn coin_key(id: &str) -> String {
    format!("coin_{}", id)
}

/// Typed accessors layered on the cache tiers and the request queue. Every
/// network failure is absorbed here: callers get the freshest value the
/// tiers can produce, or absent — never an error.
pub struct Fetcher {
    api: MarketApi,
    sentiment: SentimentClient,
    store: Arc<LocalStore>,
    coin_cache: Cache<CoinSummary>,
    price_cache: Cache<HashMap<String, f64>>,
    coin_ttl: Duration,
    persistent_ttl: Duration,
}

impl Fetcher {
    pub fn new(
        api: MarketApi,
        sentiment: SentimentClient,
        store: Arc<LocalStore>,
        cache: &CacheConfig,
    ) -> Self {
        Self {
            api,
            sentiment,
            store,
            coin_cache: Cache::new(Duration::from_secs(cache.coin_ttl_secs)),
            price_cache: Cache::new(Duration::from_secs(cache.price_ttl_secs)),
            coin_ttl: Duration::from_secs(cache.coin_ttl_secs),
            persistent_ttl: Duration::from_secs(cache.persistent_ttl_secs),
        }
    }

    pub fn api(&self) -> &MarketApi {
        &self.api
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn persistent_ttl(&self) -> Duration {
        self.persistent_ttl
    }

    /// The fetch-else-fallback policy shared by every entity type: fresh
    /// store hit, else network with write-back, else whatever stale value
    /// the store still holds.
    async fn cached_fetch<T, F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        if let Some(value) = self.store.get::<T>(key, ttl) {
            return Some(value);
        }
        match fetch().await {
            Some(value) => {
                self.store.set(key, &value);
                Some(value)
            }
            None => self.store.get_stale::<T>(key),
        }
    }

    /// Single-coin record: memory tier, then store (short TTL, same class
    /// as the memory tier), then network, with the stale store value as the
    /// outage fallback.
    pub async fn coin(&self, id: &str) -> Option<CoinSummary> {
        if let Some(cached) = self.coin_cache.get(id).await {
            return Some(cached);
        }
        let key = coin_key(id);
        let summary = self
            .cached_fetch(&key, self.coin_ttl, || async {
                self.api
                    .coin_detail(id)
                    .await
                    .map(|detail| detail.into_summary())
            })
            .await?;
        self.coin_cache.set(id.to_string(), summary.clone()).await;
        Some(summary)
    }

    /// The three trending leaderboards, regenerated from one bulk markets
    /// page. Chain membership comes from the directory's platform map, and
    /// stablecoins are dropped before the top-10 cut.
    pub async fn trending(&self, directory: &CoinDirectory, force: bool) -> TrendingSet {
        if !force {
            if let Some(set) = self
                .store
                .get::<TrendingSet>(TRENDING_KEY, self.persistent_ttl)
            {
                if !set.is_empty() {
                    self.warm_coin_cache(&set).await;
                    return set;
                }
            }
        }
        match self.api.markets_page(MARKETS_PAGE_SIZE, 1).await {
            Some(rows) => {
                let coins: Vec<CoinSummary> = rows
                    .into_iter()
                    .filter(|row| !is_stablecoin(&row.id))
                    .map(CoinSummary::from)
                    .collect();
                let set = TrendingSet {
                    crypto: coins.iter().take(TRENDING_CAP).cloned().collect(),
                    ethereum: coins
                        .iter()
                        .filter(|c| directory.on_platform(&c.id, "ethereum"))
                        .take(TRENDING_CAP)
                        .cloned()
                        .collect(),
                    solana: coins
                        .iter()
                        .filter(|c| directory.on_platform(&c.id, "solana"))
                        .take(TRENDING_CAP)
                        .cloned()
                        .collect(),
                };
                self.store.set(TRENDING_KEY, &set);
                self.warm_coin_cache(&set).await;
                set
            }
            None => self
                .store
                .get_stale::<TrendingSet>(TRENDING_KEY)
                .unwrap_or_default(),
        }
    }

    async fn warm_coin_cache(&self, set: &TrendingSet) {
        for coin in set
            .crypto
            .iter()
            .chain(set.ethereum.iter())
            .chain(set.solana.iter())
        {
            self.coin_cache.set(coin.id.clone(), coin.clone()).await;
        }
    }

    /// USD prices for the fixed reference assets. Far hotter than per-coin
    /// detail, so it gets its own key and a longer memory TTL.
    pub async fn simple_prices(&self) -> HashMap<String, f64> {
        if let Some(prices) = self.price_cache.get(PRICES_KEY).await {
            return prices;
        }
        let prices = self
            .cached_fetch(PRICES_KEY, self.persistent_ttl, || async {
                self.api.simple_price(REFERENCE_IDS).await.map(|raw| {
                    raw.into_iter()
                        .filter_map(|(id, price)| price.usd.map(|usd| (id, usd)))
                        .collect::<HashMap<String, f64>>()
                })
            })
            .await
            .unwrap_or_default();
        self.price_cache
            .set(PRICES_KEY.to_string(), prices.clone())
            .await;
        prices
    }

    /// Fear & Greed index, store-cached for an hour.
    pub async fn sentiment(&self) -> Option<u32> {
        self.cached_fetch(SENTIMENT_KEY, self.persistent_ttl, || async {
            self.sentiment.fear_greed_index().await
        })
        .await
    }

    /// Cached market caps by id, feeding the resolver's popularity tiebreak.
    pub async fn market_caps(&self) -> HashMap<String, f64> {
        self.coin_cache
            .entries()
            .await
            .into_iter()
            .filter_map(|(id, coin)| coin.market_cap.map(|cap| (id, cap)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::RequestQueue;
    use crate::tests::common::{
        detail_body, markets_body, sample_directory, test_queue_options, ScriptedTransport,
    };
    use serde_json::json;

    fn test_cache_config() -> CacheConfig {
        CacheConfig {
            coin_ttl_secs: 60,
            price_ttl_secs: 300,
            persistent_ttl_secs: 3600,
        }
    }

    fn fetcher(transport: Arc<ScriptedTransport>) -> (Fetcher, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalStore::open(dir.path().join("store.json")));
        let queue = Arc::new(RequestQueue::new(transport.clone(), test_queue_options()));
        let api = MarketApi::new(queue, "http://x".to_string());
        let sentiment = SentimentClient::new(transport, "http://x/fng/".to_string());
        (
            Fetcher::new(api, sentiment, store, &test_cache_config()),
            dir,
        )
    }

    #[tokio::test]
    async fn second_coin_fetch_is_served_from_memory() {
        let transport = ScriptedTransport::new();
        transport.on(
            "coins/bitcoin",
            200,
            &detail_body("bitcoin", "btc", "Bitcoin", 42_000.0, 1.2, 8.0e11, &[1.0, 2.0]),
        );
        let (fetcher, _dir) = fetcher(transport.clone());

        let first = fetcher.coin("bitcoin").await.unwrap();
        let second = fetcher.coin("bitcoin").await.unwrap();
        assert_eq!(first.price, Some(42_000.0));
        assert_eq!(second.id, "bitcoin");
        assert_eq!(transport.request_count("coins/bitcoin"), 1);
    }

    #[tokio::test]
    async fn failed_coin_fetch_falls_back_to_the_stale_store() {
        let transport = ScriptedTransport::new();
        transport.on("coins/bitcoin", 500, "");
        let (fetcher, _dir) = fetcher(transport);

        let stale = CoinSummary {
            id: "bitcoin".to_string(),
            name: "Bitcoin".to_string(),
            symbol: "BTC".to_string(),
            price: Some(40_000.0),
            change_24h: Some(-2.0),
            market_cap: Some(7.9e11),
            sparkline: vec![],
            image: String::new(),
            last_fetched: chrono::Utc::now(),
        };
        let two_hours_ago = chrono::Utc::now().timestamp_millis() - 2 * 3600 * 1000;
        fetcher
            .store
            .set_with_timestamp("coin_bitcoin", &stale, two_hours_ago);

        let coin = fetcher.coin("bitcoin").await.unwrap();
        assert_eq!(coin.price, Some(40_000.0));
    }

    #[tokio::test]
    async fn failed_coin_fetch_with_no_cache_is_absent() {
        let transport = ScriptedTransport::new();
        transport.on("coins/unknown", 404, "");
        let (fetcher, _dir) = fetcher(transport);
        assert!(fetcher.coin("unknown-coin").await.is_none());
    }

    #[tokio::test]
    async fn trending_excludes_stablecoins_and_partitions_by_platform() {
        let transport = ScriptedTransport::new();
        transport.on(
            "coins/markets",
            200,
            &markets_body(&[
                ("bitcoin", "btc", "Bitcoin", 42_000.0, 8.0e11),
                ("tether", "usdt", "Tether", 1.0, 9.0e10),
                ("uniswap", "uni", "Uniswap", 6.0, 4.5e9),
                ("bonk", "bonk", "Bonk", 0.00002, 1.4e9),
            ]),
        );
        let (fetcher, _dir) = fetcher(transport);
        let directory = CoinDirectory::new(sample_directory());

        let set = fetcher.trending(&directory, true).await;
        assert!(set.crypto.iter().all(|c| c.id != "tether"));
        assert!(set.ethereum.iter().all(|c| c.id != "tether"));
        assert!(set.solana.iter().all(|c| c.id != "tether"));
        assert_eq!(set.crypto.len(), 3);
        assert_eq!(set.ethereum.len(), 1);
        assert_eq!(set.ethereum[0].id, "uniswap");
        assert_eq!(set.solana.len(), 1);
        assert_eq!(set.solana[0].id, "bonk");
    }

    #[tokio::test]
    async fn trending_is_cached_for_the_epoch_and_warms_the_coin_cache() {
        let transport = ScriptedTransport::new();
        transport.on(
            "coins/markets",
            200,
            &markets_body(&[("bitcoin", "btc", "Bitcoin", 42_000.0, 8.0e11)]),
        );
        let (fetcher, _dir) = fetcher(transport.clone());
        let directory = CoinDirectory::new(sample_directory());

        fetcher.trending(&directory, true).await;
        fetcher.trending(&directory, false).await;
        assert_eq!(transport.request_count("coins/markets"), 1);

        // Trending rows land in the memory tier for the resolver tiebreak.
        let caps = fetcher.market_caps().await;
        assert_eq!(caps.get("bitcoin"), Some(&8.0e11));
    }

    #[tokio::test]
    async fn trending_outage_serves_the_stale_set() {
        let transport = ScriptedTransport::new();
        transport.on(
            "coins/markets",
            200,
            &markets_body(&[("bitcoin", "btc", "Bitcoin", 42_000.0, 8.0e11)]),
        );
        transport.on("coins/markets", 500, "");
        let (fetcher, _dir) = fetcher(transport);
        let directory = CoinDirectory::new(sample_directory());

        let fresh = fetcher.trending(&directory, true).await;
        assert_eq!(fresh.crypto.len(), 1);
        // Force refetch; the scripted 500 now applies, so the stale store copy
        // is returned instead of an empty set.
        let fallback = fetcher.trending(&directory, true).await;
        assert_eq!(fallback.crypto.len(), 1);
    }

    #[tokio::test]
    async fn simple_prices_have_their_own_cache_key() {
        let transport = ScriptedTransport::new();
        transport.on(
            "simple/price",
            200,
            &json!({
                "bitcoin": {"usd": 42_000.0},
                "ethereum": {"usd": 2_500.0},
                "solana": {"usd": 95.0},
                "ripple": {"usd": 0.5},
            })
            .to_string(),
        );
        let (fetcher, _dir) = fetcher(transport.clone());

        let prices = fetcher.simple_prices().await;
        assert_eq!(prices.get("ripple"), Some(&0.5));
        // Second read is memory-cached; no further dispatch.
        fetcher.simple_prices().await;
        assert_eq!(transport.request_count("simple/price"), 1);
    }

    #[tokio::test]
    async fn sentiment_is_cached_persistently() {
        let transport = ScriptedTransport::new();
        transport.on("fng", 200, r#"{"data":[{"value":"71"}]}"#);
        let (fetcher, _dir) = fetcher(transport.clone());

        assert_eq!(fetcher.sentiment().await, Some(71));
        assert_eq!(fetcher.sentiment().await, Some(71));
        assert_eq!(transport.request_count("fng"), 1);
    }
}
