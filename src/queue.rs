use crate::api::Transport;
use crate::config;
use log::{error, warn};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Tuning for the serial request queue. Defaults match the free-tier market
/// API limits.
#[derive(Debug, Clone)]
pub struct QueueOptions {
    pub request_delay: Duration,
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            request_delay: Duration::from_millis(500),
            max_retries: 3,
            backoff_base: Duration::from_secs(2),
        }
    }
}

impl From<&config::QueueConfig> for QueueOptions {
    fn from(config: &config::QueueConfig) -> Self {
        Self {
            request_delay: config.request_delay(),
            max_retries: config.max_retries,
            backoff_base: config.backoff_base(),
        }
    }
}

struct QueuedRequest {
    url: String,
    reply: oneshot::Sender<Option<String>>,
}

/// Serialises every market API call through one worker task so the whole
/// process stays under the upstream rate limit. Requests run strictly in
/// submission order, one at a time, each preceded by the fixed delay. A
/// request that exhausts its retries resolves to `None` ("no data"), never
/// an error — callers treat absence as a valid outcome.
#[derive(Clone)]
pub struct RequestQueue {
    tx: mpsc::UnboundedSender<QueuedRequest>,
}

impl RequestQueue {
    pub fn new(transport: Arc<dyn Transport>, options: QueueOptions) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<QueuedRequest>();
        tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                tokio::time::sleep(options.request_delay).await;
                let result = execute(transport.as_ref(), &request.url, &options).await;
                // The caller may have given up waiting; that is fine.
                let _ = request.reply.send(result);
            }
        });
        Self { tx }
    }

    /// Queue a GET and wait for its turn. `None` means retries exhausted.
    pub async fn fetch(&self, url: &str) -> Option<String> {
        let (reply, rx) = oneshot::channel();
        let request = QueuedRequest {
            url: url.to_string(),
            reply,
        };
        if self.tx.send(request).is_err() {
            error!("Request queue worker is gone, dropping fetch for {}", url);
            return None;
        }
        rx.await.unwrap_or(None)
    }

    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Option<T> {
        let body = self.fetch(url).await?;
        match serde_json::from_str(&body) {
            Ok(value) => Some(value),
            Err(e) => {
                error!("Failed to parse response from {}: {}", url, e);
                None
            }
        }
    }
}

async fn execute(transport: &dyn Transport, url: &str, options: &QueueOptions) -> Option<String> {
    for attempt in 1..=options.max_retries {
        match transport.get(url).await {
            Ok(response) if response.is_success() => return Some(response.body),
            Ok(response) if response.status == 429 => {
                warn!(
                    "Rate limit hit for {}, retrying ({}/{})",
                    url, attempt, options.max_retries
                );
                if attempt < options.max_retries {
                    tokio::time::sleep(options.backoff_base * attempt).await;
                }
            }
            Ok(response) => {
                error!(
                    "HTTP {} from {} (attempt {}/{})",
                    response.status, url, attempt, options.max_retries
                );
            }
            Err(e) => {
                error!(
                    "Failed to fetch {} (attempt {}/{}): {}",
                    url, attempt, options.max_retries, e
                );
            }
        }
    }
    None
}
