use crate::api::Transport;
use log::error;
use serde::Deserialize;
use std::sync::Arc;

/// Fear & Greed index client. A different upstream from the market API, so
/// it does not ride the rate-limited queue.
#[derive(Clone)]
pub struct SentimentClient {
    transport: Arc<dyn Transport>,
    url: String,
}

#[derive(Debug, Deserialize)]
struct FearGreedResponse {
    data: Vec<FearGreedPoint>,
}

#[derive(Debug, Deserialize)]
struct FearGreedPoint {
    value: String,
}

impl SentimentClient {
    pub fn new(transport: Arc<dyn Transport>, url: String) -> Self {
        Self { transport, url }
    }

    /// Current index value, 0..=100. `None` on any failure; the caller falls
    /// back to its cache.
    pub async fn fear_greed_index(&self) -> Option<u32> {
        let response = match self.transport.get(&self.url).await {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                error!("Sentiment provider returned HTTP {}", response.status);
                return None;
            }
            Err(e) => {
                error!("Failed to fetch sentiment index: {}", e);
                return None;
            }
        };
        let payload: FearGreedResponse = match serde_json::from_str(&response.body) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to parse sentiment payload: {}", e);
                return None;
            }
        };
        payload
            .data
            .first()
            .and_then(|point| point.value.parse::<u32>().ok())
            .map(|value| value.min(100))
    }
}
