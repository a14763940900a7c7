use crate::api::coingecko::MarketApi;
use crate::models::coin::CoinDirectoryEntry;
use crate::storage::LocalStore;
use log::{info, warn};
use std::time::Duration;

pub const DIRECTORY_KEY: &str = "coin_list";

/// The universe of known coins, loaded once per cache epoch via one bulk
/// call. Used only for resolution; never for live pricing.
#[derive(Debug, Default)]
pub struct CoinDirectory {
    entries: Vec<CoinDirectoryEntry>,
}

impl CoinDirectory {
    pub fn new(entries: Vec<CoinDirectoryEntry>) -> Self {
        Self { entries }
    }

    /// Store-cached bulk load. On network failure any stale copy is used;
    /// with no cache at all the directory stays empty and resolution
    /// degrades to "no matches".
    pub async fn load(api: &MarketApi, store: &LocalStore, ttl: Duration) -> Self {
        if let Some(entries) = store.get::<Vec<CoinDirectoryEntry>>(DIRECTORY_KEY, ttl) {
            info!("Loaded coin directory from cache ({} entries)", entries.len());
            return Self::new(entries);
        }
        match api.list_all_coins().await {
            Some(items) => {
                let entries: Vec<CoinDirectoryEntry> =
                    items.into_iter().map(CoinDirectoryEntry::from).collect();
                store.set(DIRECTORY_KEY, &entries);
                info!("Fetched coin directory ({} entries)", entries.len());
                Self::new(entries)
            }
            None => match store.get_stale::<Vec<CoinDirectoryEntry>>(DIRECTORY_KEY) {
                Some(entries) => {
                    warn!(
                        "Directory fetch failed, using stale copy ({} entries)",
                        entries.len()
                    );
                    Self::new(entries)
                }
                None => {
                    warn!("No coin directory available; searches will find nothing");
                    Self::default()
                }
            },
        }
    }

    pub fn entries(&self) -> &[CoinDirectoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn by_id(&self, id: &str) -> Option<&CoinDirectoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Exact match on id, symbol or name, case-insensitive.
    pub fn exact_match(&self, query: &str) -> Option<&CoinDirectoryEntry> {
        self.entries.iter().find(|e| {
            e.id == query
                || e.symbol.eq_ignore_ascii_case(query)
                || e.name.eq_ignore_ascii_case(query)
        })
    }

    /// First entry holding `address` on any platform, case-insensitive.
    pub fn by_contract(&self, address: &str) -> Option<&CoinDirectoryEntry> {
        self.entries.iter().find(|e| e.has_contract(address))
    }

    /// Entry holding `address` on the named chain.
    pub fn by_platform_contract(&self, chain: &str, address: &str) -> Option<&CoinDirectoryEntry> {
        self.entries.iter().find(|e| {
            e.contract_on(chain)
                .map_or(false, |a| a.eq_ignore_ascii_case(address))
        })
    }

    pub fn on_platform(&self, id: &str, chain: &str) -> bool {
        self.by_id(id)
            .map_or(false, |e| e.contract_on(chain).is_some())
    }
}
