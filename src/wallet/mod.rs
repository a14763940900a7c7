use crate::error::Result;
use async_trait::async_trait;

pub mod solana;
pub mod xrpl;

/// A parsed SPL token account balance, in display units.
#[derive(Debug, Clone)]
pub struct TokenAccountBalance {
    pub mint: String,
    pub ui_amount: f64,
}

/// Account-model chain: native balance in smallest units plus the owner's
/// token accounts.
#[async_trait]
pub trait SolanaBalanceSource: Send + Sync {
    async fn native_balance(&self, address: &str) -> Result<u64>;
    async fn token_accounts(&self, address: &str) -> Result<Vec<TokenAccountBalance>>;
}

/// Ledger-model chain: a single native balance in smallest units.
#[async_trait]
pub trait XrplBalanceSource: Send + Sync {
    async fn account_balance(&self, address: &str) -> Result<u64>;
}
