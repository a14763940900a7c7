use super::XrplBalanceSource;
use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use log::debug;
use serde_json::{json, Value};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

const REQUEST_ID: u64 = 1;

/// XRPL websocket client: one `account_info` round trip per lookup against
/// the validated ledger.
#[derive(Debug, Clone)]
pub struct XrplSocket {
    ws_url: String,
}

impl XrplSocket {
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
        }
    }
}

#[async_trait]
impl XrplBalanceSource for XrplSocket {
    async fn account_balance(&self, address: &str) -> Result<u64> {
        let (mut stream, _) = connect_async(self.ws_url.as_str())
            .await
            .map_err(|e| Error::WalletRpc(format!("XRPL connect failed: {}", e)))?;
        let request = json!({
            "id": REQUEST_ID,
            "command": "account_info",
            "account": address,
            "ledger_index": "validated",
        });
        debug!("XRPL account_info for {}", address);
        stream
            .send(Message::Text(request.to_string()))
            .await
            .map_err(|e| Error::WalletRpc(format!("XRPL send failed: {}", e)))?;

        while let Some(message) = stream.next().await {
            let message =
                message.map_err(|e| Error::WalletRpc(format!("XRPL read failed: {}", e)))?;
            let Message::Text(text) = message else {
                continue;
            };
            let payload: Value = serde_json::from_str(&text)?;
            if payload.get("id").and_then(Value::as_u64) != Some(REQUEST_ID) {
                continue;
            }
            let _ = stream.close(None).await;
            return payload["result"]["account_data"]["Balance"]
                .as_str()
                .and_then(|drops| drops.parse::<u64>().ok())
                .ok_or_else(|| {
                    Error::WalletRpc(format!("No balance in account_info reply for {}", address))
                });
        }
        Err(Error::WalletRpc(
            "XRPL socket closed before replying".to_string(),
        ))
    }
}
