use std::io;
use std::result::Result as StdResult;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Coin not found: {0}")]
    CoinNotFound(String),
    #[error("Contract not found: {0}")]
    ContractNotFound(String),
    #[error("Already on watchlist: {0}")]
    DuplicateEntry(String),
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("No data available: {0}")]
    NoData(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Wallet RPC error: {0}")]
    WalletRpc(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

impl Error {
    /// Failures the user must be told about. Everything else is absorbed at
    /// the fetcher boundary as "use cached value or absent".
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::CoinNotFound(_)
                | Error::ContractNotFound(_)
                | Error::DuplicateEntry(_)
                | Error::InvalidInput(_)
                | Error::NoData(_)
        )
    }
}

pub type Result<T> = StdResult<T, Error>;
