//! JSON-RPC connector for the settlement chain. Signing and gas policy
//! belong to the node behind the endpoint; this client only submits calls
//! and reads receipts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("RPC request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("invalid RPC response: {0}")]
    InvalidResponse(String),
}

/// A prepared contract call, ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractCall {
    pub from: String,
    pub to: String,
    pub data: String,
}

/// Confirmation state of a submitted call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Pending,
    Confirmed,
    Reverted,
}

/// Seam between the settlement adapter and the chain transport.
#[async_trait]
pub trait ChainConnector: Send + Sync {
    /// Submits the call; returns the transaction hash once the network
    /// accepts it.
    async fn submit(&self, call: &ContractCall) -> Result<String, RpcError>;

    /// Looks up the receipt for a submitted call.
    async fn confirmation(&self, tx_hash: &str) -> Result<Confirmation, RpcError>;
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// reqwest-backed JSON-RPC 2.0 client.
pub struct EvmRpcClient {
    client: Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl EvmRpcClient {
    pub fn new(endpoint: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            endpoint,
            next_id: AtomicU64::new(1),
        }
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        let parsed: RpcResponse = response.json().await?;

        if let Some(err) = parsed.error {
            return Err(RpcError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        // a null result is meaningful (e.g. no receipt yet)
        Ok(parsed.result.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl ChainConnector for EvmRpcClient {
    async fn submit(&self, call: &ContractCall) -> Result<String, RpcError> {
        let result = self.rpc("eth_sendTransaction", json!([call])).await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                RpcError::InvalidResponse("eth_sendTransaction returned no hash".to_string())
            })
    }

    async fn confirmation(&self, tx_hash: &str) -> Result<Confirmation, RpcError> {
        let result = self.rpc("eth_getTransactionReceipt", json!([tx_hash])).await?;
        if result.is_null() {
            return Ok(Confirmation::Pending);
        }
        match result.get("status").and_then(Value::as_str) {
            Some("0x1") => Ok(Confirmation::Confirmed),
            Some("0x0") => Ok(Confirmation::Reverted),
            other => Err(RpcError::InvalidResponse(format!(
                "unexpected receipt status: {other:?}"
            ))),
        }
    }
}
