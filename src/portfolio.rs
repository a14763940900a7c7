use crate::directory::CoinDirectory;
use crate::fetcher::Fetcher;
use crate::storage::LocalStore;
use crate::wallet::{SolanaBalanceSource, XrplBalanceSource};
use log::warn;
use std::collections::HashMap;
use std::sync::Arc;

pub const SOL_WALLET_KEY: &str = "sol_wallet";
pub const XRP_WALLET_KEY: &str = "xrp_wallet";

// Smallest-unit divisors, applied exactly once, here.
const LAMPORTS_PER_SOL: f64 = 1e9;
const DROPS_PER_XRP: f64 = 1e6;

/// The two wallet address strings plus best-effort USD valuation. Each
/// chain contributes independently: an unset address skips the chain
/// entirely, and a failed lookup contributes zero without touching the
/// other chain.
pub struct Portfolio {
    sol_address: String,
    xrp_address: String,
    store: Arc<LocalStore>,
}

impl Portfolio {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self {
            sol_address: String::new(),
            xrp_address: String::new(),
            store,
        }
    }

    pub fn load(&mut self) {
        self.sol_address = self.store.get_stale(SOL_WALLET_KEY).unwrap_or_default();
        self.xrp_address = self.store.get_stale(XRP_WALLET_KEY).unwrap_or_default();
    }

    pub fn sol_address(&self) -> &str {
        &self.sol_address
    }

    pub fn xrp_address(&self) -> &str {
        &self.xrp_address
    }

    pub fn set_sol_address(&mut self, address: &str) {
        self.sol_address = address.trim().to_string();
        self.store.set(SOL_WALLET_KEY, &self.sol_address);
    }

    pub fn set_xrp_address(&mut self, address: &str) {
        self.xrp_address = address.trim().to_string();
        self.store.set(XRP_WALLET_KEY, &self.xrp_address);
    }

    pub async fn total_value(
        &self,
        solana: &dyn SolanaBalanceSource,
        xrpl: &dyn XrplBalanceSource,
        prices: &HashMap<String, f64>,
        directory: &CoinDirectory,
        fetcher: &Fetcher,
    ) -> f64 {
        let mut total = 0.0;
        if !self.sol_address.is_empty() {
            total += self.solana_value(solana, prices, directory, fetcher).await;
        }
        if !self.xrp_address.is_empty() {
            total += self.xrpl_value(xrpl, prices).await;
        }
        total
    }

    async fn solana_value(
        &self,
        solana: &dyn SolanaBalanceSource,
        prices: &HashMap<String, f64>,
        directory: &CoinDirectory,
        fetcher: &Fetcher,
    ) -> f64 {
        let sol_price = prices.get("solana").copied().unwrap_or(0.0);
        let mut value = match solana.native_balance(&self.sol_address).await {
            Ok(lamports) => lamports as f64 / LAMPORTS_PER_SOL * sol_price,
            Err(e) => {
                warn!(
                    "Failed to fetch Solana balance for {}: {}",
                    self.sol_address, e
                );
                return 0.0;
            }
        };
        match solana.token_accounts(&self.sol_address).await {
            Ok(accounts) => {
                for account in accounts {
                    // Only tokens the directory can name are valued.
                    let Some(entry) = directory.by_platform_contract("solana", &account.mint)
                    else {
                        continue;
                    };
                    if let Some(coin) = fetcher.coin(&entry.id).await {
                        value += account.ui_amount * coin.price.unwrap_or(0.0);
                    }
                }
            }
            Err(e) => warn!(
                "Failed to fetch Solana token accounts for {}: {}",
                self.sol_address, e
            ),
        }
        value
    }

    async fn xrpl_value(&self, xrpl: &dyn XrplBalanceSource, prices: &HashMap<String, f64>) -> f64 {
        let xrp_price = prices.get("ripple").copied().unwrap_or(0.0);
        match xrpl.account_balance(&self.xrp_address).await {
            Ok(drops) => drops as f64 / DROPS_PER_XRP * xrp_price,
            Err(e) => {
                warn!("Failed to fetch XRPL balance for {}: {}", self.xrp_address, e);
                0.0
            }
        }
    }
}
