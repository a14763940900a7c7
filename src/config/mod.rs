use serde::{Deserialize, Serialize};
use std::path::Path;
use std::fs;
use std::time::Duration;
use anyhow::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub queue: QueueConfig,
    pub cache: CacheConfig,
    pub refresh: RefreshConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiConfig {
    pub market_base_url: String,
    pub sentiment_url: String,
    pub solana_rpc_url: String,
    pub xrpl_ws_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QueueConfig {
    /// Minimum delay between consecutive market API requests.
    pub request_delay_ms: u64,
    pub max_retries: u32,
    /// Base for the linear backoff applied after a 429 response.
    pub backoff_base_ms: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    /// Memory TTL for per-coin detail records.
    pub coin_ttl_secs: u64,
    /// Memory TTL for the simple reference-price snapshot.
    pub price_ttl_secs: u64,
    /// Persistent TTL for the directory, trending sets and coin fallbacks.
    pub persistent_ttl_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshConfig {
    pub interval_secs: u64,
    /// A tick is skipped if the last completed refresh is younger than this.
    pub min_refresh_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    pub path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                market_base_url: "https://api.coingecko.com/api/v3".to_string(),
                sentiment_url: "https://api.alternative.me/fng/".to_string(),
                solana_rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
                xrpl_ws_url: "wss://xrplcluster.com".to_string(),
            },
            queue: QueueConfig {
                request_delay_ms: 500,
                max_retries: 3,
                backoff_base_ms: 2000,
            },
            cache: CacheConfig {
                coin_ttl_secs: 60,
                price_ttl_secs: 300,
                persistent_ttl_secs: 3600,
            },
            refresh: RefreshConfig {
                interval_secs: 60,
                min_refresh_secs: 60,
            },
            storage: StorageConfig {
                path: "coinwatch_store.json".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&config_str)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        fs::write(path, config_str)?;
        Ok(())
    }
}

impl QueueConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }
}
