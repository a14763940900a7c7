use crate::api::{Transport, TransportResponse};
use crate::error::{Error, Result};
use crate::models::coin::CoinDirectoryEntry;
use crate::queue::QueueOptions;
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Reply {
    Response(u16, String),
    NetworkError,
}

struct Rule {
    pattern: String,
    replies: Vec<Reply>,
    served: usize,
}

/// Scripted transport: replies are matched by URL substring, in the order
/// they were registered for that pattern; the last reply repeats once the
/// script runs out. Every request is logged for ordering and count
/// assertions.
pub struct ScriptedTransport {
    rules: Mutex<Vec<Rule>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            rules: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn on(&self, pattern: &str, status: u16, body: &str) {
        self.push(pattern, Reply::Response(status, body.to_string()));
    }

    pub fn on_error(&self, pattern: &str) {
        self.push(pattern, Reply::NetworkError);
    }

    fn push(&self, pattern: &str, reply: Reply) {
        let mut rules = self.rules.lock().unwrap();
        if let Some(rule) = rules.iter_mut().find(|r| r.pattern == pattern) {
            rule.replies.push(reply);
        } else {
            rules.push(Rule {
                pattern: pattern.to_string(),
                replies: vec![reply],
                served: 0,
            });
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, pattern: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|url| url.contains(pattern))
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<TransportResponse> {
        self.requests.lock().unwrap().push(url.to_string());
        let mut rules = self.rules.lock().unwrap();
        let rule = rules.iter_mut().find(|r| url.contains(&r.pattern));
        let reply = match rule {
            Some(rule) => {
                let index = rule.served.min(rule.replies.len() - 1);
                rule.served += 1;
                rule.replies[index].clone()
            }
            None => Reply::Response(404, String::new()),
        };
        match reply {
            Reply::Response(status, body) => Ok(TransportResponse { status, body }),
            Reply::NetworkError => Err(Error::Network(format!("scripted failure for {}", url))),
        }
    }
}

/// Millisecond-scale queue options so tests finish fast.
pub fn test_queue_options() -> QueueOptions {
    QueueOptions {
        request_delay: Duration::from_millis(1),
        max_retries: 3,
        backoff_base: Duration::from_millis(1),
    }
}

pub fn entry(id: &str, symbol: &str, name: &str) -> CoinDirectoryEntry {
    CoinDirectoryEntry {
        id: id.to_string(),
        symbol: symbol.to_string(),
        name: name.to_string(),
        platforms: HashMap::new(),
    }
}

pub fn entry_with_platform(
    id: &str,
    symbol: &str,
    name: &str,
    chain: &str,
    address: &str,
) -> CoinDirectoryEntry {
    let mut e = entry(id, symbol, name);
    e.platforms.insert(chain.to_string(), address.to_string());
    e
}

/// A small but representative coin universe.
pub fn sample_directory() -> Vec<CoinDirectoryEntry> {
    vec![
        entry("bitcoin", "btc", "Bitcoin"),
        entry("ethereum", "eth", "Ethereum"),
        entry("ethereum-classic", "etc", "Ethereum Classic"),
        entry("solana", "sol", "Solana"),
        entry("ripple", "xrp", "XRP"),
        entry("tether", "usdt", "Tether"),
        entry_with_platform(
            "pepe",
            "pepe",
            "Pepe",
            "ethereum",
            "0x6982508145454Ce325dDbE47a25d4ec3d2311933",
        ),
        entry_with_platform(
            "pepe-classic",
            "pepe",
            "Pepe Classic",
            "ethereum",
            "0x1111111111111111111111111111111111111111",
        ),
        entry_with_platform(
            "uniswap",
            "uni",
            "Uniswap",
            "ethereum",
            "0x1f9840a85d5aF5bf1D1762F925BDADdC4201F984",
        ),
        entry_with_platform(
            "bonk",
            "bonk",
            "Bonk",
            "solana",
            "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263",
        ),
    ]
}

/// JSON body for a `/coins/{id}` detail response.
pub fn detail_body(
    id: &str,
    symbol: &str,
    name: &str,
    price: f64,
    change: f64,
    market_cap: f64,
    sparkline: &[f64],
) -> String {
    json!({
        "id": id,
        "symbol": symbol,
        "name": name,
        "image": { "thumb": format!("https://img.test/{}.png", id) },
        "market_data": {
            "current_price": { "usd": price },
            "price_change_percentage_24h": change,
            "market_cap": { "usd": market_cap },
            "sparkline_7d": { "price": sparkline },
        }
    })
    .to_string()
}

/// JSON body for a `/coins/markets` page; rows are (id, symbol, name,
/// price, market_cap).
pub fn markets_body(rows: &[(&str, &str, &str, f64, f64)]) -> String {
    let rows: Vec<_> = rows
        .iter()
        .map(|(id, symbol, name, price, cap)| {
            json!({
                "id": id,
                "symbol": symbol,
                "name": name,
                "image": format!("https://img.test/{}.png", id),
                "current_price": price,
                "price_change_percentage_24h": 1.5,
                "market_cap": cap,
                "sparkline_in_7d": { "price": [1.0, 2.0, 3.0] },
            })
        })
        .collect();
    serde_json::to_string(&rows).unwrap()
}
