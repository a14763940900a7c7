use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;

pub mod coingecko;
pub mod sentiment;

/// One HTTP round trip. Clients and the request queue reach upstreams
/// through this seam so tests can script responses instead of opening
/// sockets.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn get(&self, url: &str) -> Result<TransportResponse>;
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// reqwest-backed transport used outside of tests.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<TransportResponse> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(TransportResponse { status, body })
    }
}
