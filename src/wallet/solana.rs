use super::{SolanaBalanceSource, TokenAccountBalance};
use crate::error::{Error, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};

const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

/// Read-only JSON-RPC balance lookups against a Solana RPC endpoint. No
/// keys are held; addresses come from the user.
#[derive(Debug, Clone)]
pub struct SolanaRpc {
    client: Client,
    rpc_url: String,
}

impl SolanaRpc {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            rpc_url: rpc_url.into(),
        }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        debug!("Solana RPC call: {}", method);
        let response = self.client.post(&self.rpc_url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(Error::WalletRpc(format!(
                "{} returned HTTP {}",
                method,
                response.status()
            )));
        }
        let payload: Value = response.json().await?;
        if let Some(error) = payload.get("error") {
            return Err(Error::WalletRpc(format!("{} failed: {}", method, error)));
        }
        payload
            .get("result")
            .cloned()
            .ok_or_else(|| Error::WalletRpc(format!("{} returned no result", method)))
    }
}

#[async_trait]
impl SolanaBalanceSource for SolanaRpc {
    async fn native_balance(&self, address: &str) -> Result<u64> {
        let result = self.call("getBalance", json!([address])).await?;
        result
            .get("value")
            .and_then(Value::as_u64)
            .ok_or_else(|| Error::WalletRpc("getBalance returned no value".to_string()))
    }

    async fn token_accounts(&self, address: &str) -> Result<Vec<TokenAccountBalance>> {
        let params = json!([
            address,
            { "programId": TOKEN_PROGRAM_ID },
            { "encoding": "jsonParsed" },
        ]);
        let result = self.call("getTokenAccountsByOwner", params).await?;
        let accounts = result
            .get("value")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let mut balances = Vec::new();
        for account in accounts {
            let info = &account["account"]["data"]["parsed"]["info"];
            let Some(mint) = info["mint"].as_str() else {
                continue;
            };
            let Some(ui_amount) = info["tokenAmount"]["uiAmount"].as_f64() else {
                continue;
            };
            if ui_amount > 0.0 {
                balances.push(TokenAccountBalance {
                    mint: mint.to_string(),
                    ui_amount,
                });
            }
        }
        Ok(balances)
    }
}
