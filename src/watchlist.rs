use crate::directory::CoinDirectory;
use crate::error::{Error, Result};
use crate::fetcher::Fetcher;
use crate::models::coin::CoinSummary;
use crate::resolver;
use crate::storage::LocalStore;
use log::{info, warn};
use std::sync::Arc;

pub const WATCHLIST_KEY: &str = "watchlist";
/// Key used by older releases; migrated on first load.
const LEGACY_WATCHLIST_KEY: &str = "crypto_watchlist";

/// The user's ordered coin list. Entries are owned here exclusively;
/// presentation layers get cloned snapshots. Ids — not full records — are
/// persisted on every mutation.
pub struct Watchlist {
    entries: Vec<CoinSummary>,
    store: Arc<LocalStore>,
}

impl Watchlist {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self {
            entries: Vec::new(),
            store,
        }
    }

    pub fn entries(&self) -> &[CoinSummary] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|coin| coin.id == id)
    }

    /// Rehydrate from the persisted id list, dropping ids that no longer
    /// resolve to any record (network and cache both empty-handed).
    pub async fn load(&mut self, fetcher: &Fetcher) {
        let mut ids: Vec<String> = self.store.get_stale(WATCHLIST_KEY).unwrap_or_default();
        if ids.is_empty() {
            if let Some(legacy) = self.store.get_stale::<Vec<String>>(LEGACY_WATCHLIST_KEY) {
                if !legacy.is_empty() {
                    info!("Migrating {} legacy watchlist ids", legacy.len());
                    ids = legacy;
                    self.store.set(WATCHLIST_KEY, &ids);
                    self.store.remove(LEGACY_WATCHLIST_KEY);
                }
            }
        }
        let expected = ids.len();
        for id in ids {
            match fetcher.coin(&id).await {
                Some(coin) => self.entries.push(coin),
                None => warn!("Dropping watchlist id with no data: {}", id),
            }
        }
        if self.entries.len() != expected {
            self.persist();
        }
    }

    /// The add flow: validate, resolve, fetch, commit. Nothing is mutated
    /// on any failure path.
    pub async fn add(
        &mut self,
        query: &str,
        directory: &CoinDirectory,
        fetcher: &Fetcher,
    ) -> Result<CoinSummary> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Err(Error::InvalidInput(
                "enter a coin id, symbol, name or contract address".to_string(),
            ));
        }
        // Duplicates are rejected before any resolution or network work.
        if self.contains(&query) {
            return Err(Error::DuplicateEntry(query));
        }
        let entry = resolver::resolve_for_add(&query, directory)?;
        let id = entry.id.clone();
        if self.contains(&id) {
            return Err(Error::DuplicateEntry(id));
        }
        let coin = fetcher
            .coin(&id)
            .await
            .ok_or_else(|| Error::NoData(id.clone()))?;
        self.entries.push(coin.clone());
        self.persist();
        info!("Added {} to the watchlist", id);
        Ok(coin)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|coin| coin.id != id);
        if self.entries.len() != before {
            self.persist();
            true
        } else {
            false
        }
    }

    /// Reorder by id lookup, never by blind index replacement: ids that are
    /// not present are ignored, and entries not named keep their relative
    /// order after the named ones. Safe against a refresh landing mid-drag.
    pub fn reorder(&mut self, ordered_ids: &[String]) {
        let mut reordered = Vec::with_capacity(self.entries.len());
        for id in ordered_ids {
            if let Some(position) = self.entries.iter().position(|coin| &coin.id == id) {
                reordered.push(self.entries.remove(position));
            }
        }
        reordered.append(&mut self.entries);
        self.entries = reordered;
        self.persist();
    }

    /// Refresh market fields in place. Ids and positions are preserved; a
    /// coin with no fresh data keeps its previous snapshot.
    pub async fn refresh(&mut self, fetcher: &Fetcher) {
        for slot in self.entries.iter_mut() {
            if let Some(updated) = fetcher.coin(&slot.id).await {
                *slot = updated;
            }
        }
    }

    fn persist(&self) {
        let ids: Vec<String> = self.entries.iter().map(|coin| coin.id.clone()).collect();
        self.store.set(WATCHLIST_KEY, &ids);
    }
}
