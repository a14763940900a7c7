use crate::api::coingecko::MarketApi;
use crate::api::sentiment::SentimentClient;
use crate::api::{HttpTransport, Transport};
use crate::config::Config;
use crate::directory::CoinDirectory;
use crate::error::Result;
use crate::fetcher::Fetcher;
use crate::models::coin::{CoinSummary, TrendingSet};
use crate::portfolio::Portfolio;
use crate::queue::{QueueOptions, RequestQueue};
use crate::resolver::{self, Suggestion};
use crate::storage::LocalStore;
use crate::wallet::solana::SolanaRpc;
use crate::wallet::xrpl::XrplSocket;
use crate::wallet::{SolanaBalanceSource, XrplBalanceSource};
use crate::watchlist::Watchlist;
use log::info;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Warmed into the coin cache after load so early searches rank well.
const POPULAR_IDS: &[&str] = &["bitcoin", "ethereum", "solana", "pepe"];

/// One dashboard session. Owns the request queue, both cache tiers, the
/// coin directory and all user state; constructed once per process and torn
/// down with it. Presentation layers talk only to this object — it never
/// reaches into rendering, and nothing here touches the network except
/// through the fetchers.
pub struct DashboardService {
    config: Config,
    fetcher: Fetcher,
    directory: CoinDirectory,
    watchlist: Watchlist,
    portfolio: Portfolio,
    solana: Box<dyn SolanaBalanceSource>,
    xrpl: Box<dyn XrplBalanceSource>,
    trending: TrendingSet,
    header_prices: HashMap<String, f64>,
    sentiment_index: Option<u32>,
    portfolio_value: f64,
    last_refresh: Option<Instant>,
}

impl DashboardService {
    pub fn new(config: Config) -> Self {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new());
        let solana = Box::new(SolanaRpc::new(config.api.solana_rpc_url.clone()));
        let xrpl = Box::new(XrplSocket::new(config.api.xrpl_ws_url.clone()));
        Self::with_parts(config, transport, solana, xrpl)
    }

    /// Construction seam: tests inject a scripted transport and fake
    /// balance sources.
    pub fn with_parts(
        config: Config,
        transport: Arc<dyn Transport>,
        solana: Box<dyn SolanaBalanceSource>,
        xrpl: Box<dyn XrplBalanceSource>,
    ) -> Self {
        let store = Arc::new(LocalStore::open(&config.storage.path));
        let queue = Arc::new(RequestQueue::new(
            transport.clone(),
            QueueOptions::from(&config.queue),
        ));
        let api = MarketApi::new(queue, config.api.market_base_url.clone());
        let sentiment = SentimentClient::new(transport, config.api.sentiment_url.clone());
        let fetcher = Fetcher::new(api, sentiment, store.clone(), &config.cache);
        let watchlist = Watchlist::new(store.clone());
        let portfolio = Portfolio::new(store);
        Self {
            config,
            fetcher,
            directory: CoinDirectory::default(),
            watchlist,
            portfolio,
            solana,
            xrpl,
            trending: TrendingSet::default(),
            header_prices: HashMap::new(),
            sentiment_index: None,
            portfolio_value: 0.0,
            last_refresh: None,
        }
    }

    /// Session rehydration: directory, trending, header prices, watchlist,
    /// sentiment, wallet addresses, then a popular-coin warmup.
    pub async fn load(&mut self) {
        self.directory = CoinDirectory::load(
            self.fetcher.api(),
            self.fetcher.store(),
            self.fetcher.persistent_ttl(),
        )
        .await;
        self.trending = self.fetcher.trending(&self.directory, true).await;
        self.header_prices = self.fetcher.simple_prices().await;
        self.watchlist.load(&self.fetcher).await;
        self.sentiment_index = self.fetcher.sentiment().await;
        self.portfolio.load();
        for id in POPULAR_IDS {
            let _ = self.fetcher.coin(id).await;
        }
        self.refresh_portfolio().await;
        self.last_refresh = Some(Instant::now());
        info!(
            "Session loaded: {} directory entries, {} watchlist coins",
            self.directory.len(),
            self.watchlist.len()
        );
    }

    /// Periodic tick. Returns false when skipped because the last completed
    /// refresh is still inside the configured window. A refresh already in
    /// flight is never cancelled; the guard only debounces the next one.
    pub async fn refresh_all(&mut self) -> bool {
        let window = Duration::from_secs(self.config.refresh.min_refresh_secs);
        if let Some(last) = self.last_refresh {
            if last.elapsed() < window {
                return false;
            }
        }
        self.trending = self.fetcher.trending(&self.directory, false).await;
        self.header_prices = self.fetcher.simple_prices().await;
        self.sentiment_index = self.fetcher.sentiment().await;
        self.watchlist.refresh(&self.fetcher).await;
        self.refresh_portfolio().await;
        self.last_refresh = Some(Instant::now());
        true
    }

    async fn refresh_portfolio(&mut self) {
        self.portfolio_value = self
            .portfolio
            .total_value(
                self.solana.as_ref(),
                self.xrpl.as_ref(),
                &self.header_prices,
                &self.directory,
                &self.fetcher,
            )
            .await;
    }

    // Read accessors. All return snapshots or borrows; no network.

    pub fn watchlist(&self) -> &[CoinSummary] {
        self.watchlist.entries()
    }

    pub fn trending(&self) -> &TrendingSet {
        &self.trending
    }

    pub fn header_prices(&self) -> &HashMap<String, f64> {
        &self.header_prices
    }

    pub fn sentiment_index(&self) -> Option<u32> {
        self.sentiment_index
    }

    pub fn portfolio_value(&self) -> f64 {
        self.portfolio_value
    }

    pub fn sol_wallet(&self) -> &str {
        self.portfolio.sol_address()
    }

    pub fn xrp_wallet(&self) -> &str {
        self.portfolio.xrp_address()
    }

    /// Ranked suggestions for a partial query. Synchronous ranking over the
    /// directory; the market-cap tiebreak reads the warm coin cache.
    pub async fn suggestions(&self, query: &str) -> Vec<Suggestion> {
        let caps = self.fetcher.market_caps().await;
        resolver::rank_suggestions(query, self.directory.entries(), &caps)
    }

    // Mutators.

    pub async fn add_coin(&mut self, query: &str) -> Result<CoinSummary> {
        self.watchlist
            .add(query, &self.directory, &self.fetcher)
            .await
    }

    pub fn remove_coin(&mut self, id: &str) -> bool {
        self.watchlist.remove(id)
    }

    pub fn reorder(&mut self, ordered_ids: &[String]) {
        self.watchlist.reorder(ordered_ids)
    }

    pub async fn set_sol_wallet(&mut self, address: &str) {
        self.portfolio.set_sol_address(address);
        self.refresh_portfolio().await;
    }

    pub async fn set_xrp_wallet(&mut self, address: &str) {
        self.portfolio.set_xrp_address(address);
        self.refresh_portfolio().await;
    }
}
