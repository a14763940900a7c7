use crate::directory::CoinDirectory;
use crate::error::{Error, Result};
use crate::models::coin::CoinDirectoryEntry;
use std::cmp::Ordering;
use std::collections::HashMap;

/// The "pepe" ticker collides badly; the entry carrying this exact Ethereum
/// contract is forced to the top of the ranking for that query.
const PEPE_ID: &str = "pepe";
const PEPE_ETH_CONTRACT: &str = "0x6982508145454ce325ddbe47a25d4ec3d2311933";

const MAX_SUGGESTIONS: usize = 5;

// Match-component weights. The score of an entry is the maximum component,
// not the sum, so one strong match is never diluted by weak ones.
const EXACT_SYMBOL: f64 = 5.0;
const EXACT_NAME: f64 = 4.0;
const EXACT_ID: f64 = 3.0;
const PARTIAL_SYMBOL: f64 = 2.0;
const PARTIAL_NAME: f64 = 1.0;
const PARTIAL_ID: f64 = 1.0;
const CONTRACT_MATCH: f64 = 10.0;

/// How a raw query string is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Contract,
    Text,
}

pub fn classify(query: &str) -> QueryKind {
    if looks_like_evm_contract(query) || looks_like_solana_contract(query) {
        QueryKind::Contract
    } else {
        QueryKind::Text
    }
}

fn looks_like_evm_contract(query: &str) -> bool {
    query.len() == 42
        && query.starts_with("0x")
        && query[2..].chars().all(|c| c.is_ascii_hexdigit())
}

fn looks_like_solana_contract(query: &str) -> bool {
    (32..=44).contains(&query.len()) && query.chars().all(|c| c.is_ascii_alphanumeric())
}

#[derive(Debug, Clone)]
pub struct Suggestion {
    pub entry: CoinDirectoryEntry,
    pub score: f64,
}

/// Rank directory entries against a free-text query for suggestion display.
/// Entries with no textual or contract match are excluded; the rest sort by
/// descending score with case-insensitive name order breaking ties, capped
/// at five.
pub fn rank_suggestions(
    query: &str,
    entries: &[CoinDirectoryEntry],
    market_caps: &HashMap<String, f64>,
) -> Vec<Suggestion> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }
    let mut matches: Vec<Suggestion> = entries
        .iter()
        .filter_map(|entry| {
            let score = score_entry(entry, &query, market_caps);
            if score > 0.0 {
                Some(Suggestion {
                    entry: entry.clone(),
                    score,
                })
            } else {
                None
            }
        })
        .collect();
    matches.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                a.entry
                    .name
                    .to_lowercase()
                    .cmp(&b.entry.name.to_lowercase())
            })
    });
    matches.truncate(MAX_SUGGESTIONS);
    matches
}

fn score_entry(
    entry: &CoinDirectoryEntry,
    query: &str,
    market_caps: &HashMap<String, f64>,
) -> f64 {
    let symbol = entry.symbol.to_lowercase();
    let name = entry.name.to_lowercase();

    let symbol_score = if symbol == query {
        EXACT_SYMBOL
    } else if symbol.contains(query) {
        PARTIAL_SYMBOL
    } else {
        0.0
    };
    let name_score = if name == query {
        EXACT_NAME
    } else if name.contains(query) {
        PARTIAL_NAME
    } else {
        0.0
    };
    let id_score = if entry.id == query {
        EXACT_ID
    } else if entry.id.contains(query) {
        PARTIAL_ID
    } else {
        0.0
    };
    let contract_score = if entry.has_contract(query) {
        CONTRACT_MATCH
    } else {
        0.0
    };

    let base = symbol_score
        .max(name_score)
        .max(id_score)
        .max(contract_score);
    if base <= 0.0 {
        return 0.0;
    }

    // Among equally-matched tickers the larger-cap asset ranks first.
    let cap_weight = market_caps
        .get(&entry.id)
        .filter(|cap| **cap > 1.0)
        .map(|cap| cap.log10() / 10.0)
        .unwrap_or(0.0);
    let mut score = base + cap_weight;

    if query == PEPE_ID {
        let canonical = entry.id == PEPE_ID
            && entry
                .contract_on("ethereum")
                .map_or(false, |a| a.eq_ignore_ascii_case(PEPE_ETH_CONTRACT));
        if canonical {
            score = 100.0;
        } else if symbol == PEPE_ID {
            score += 2.0;
        }
    }
    score
}

/// Resolve a committed "add" to a canonical entry. Contract-shaped input
/// resolves through platform addresses; anything else must match an id,
/// symbol or name exactly — fuzzy candidates are for suggestion display
/// only, never a silent add target.
pub fn resolve_for_add<'a>(query: &str, directory: &'a CoinDirectory) -> Result<&'a CoinDirectoryEntry> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Err(Error::InvalidInput("empty query".to_string()));
    }
    match classify(&query) {
        QueryKind::Contract => directory
            .by_contract(&query)
            .ok_or(Error::ContractNotFound(query)),
        QueryKind::Text => directory
            .exact_match(&query)
            .ok_or(Error::CoinNotFound(query)),
    }
}
