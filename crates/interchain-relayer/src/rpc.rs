//! Tendermint-style JSON-RPC client.
//!
//! Queries go through `abci_query` with path `/custom/<store>/<endpoint>`
//! and hex-encoded CBOR parameters. Transactions go through
//! `broadcast_tx_commit` as base64.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use interchain_channel::{QueryRequest, SignedTx};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::client::ChainClient;
use crate::error::{RelayerError, Result};

/// Rewrite a node address into an HTTP URL.
///
/// Accepts `tcp://host:port`, `http(s)://...` and bare `host:port`.
pub fn normalize_node_url(node: &str) -> String {
    let node = node.trim().trim_end_matches('/');
    if let Some(rest) = node.strip_prefix("tcp://") {
        format!("http://{rest}")
    } else if node.starts_with("http://") || node.starts_with("https://") {
        node.to_string()
    } else {
        format!("http://{node}")
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AbciQueryResult {
    response: AbciQueryResponse,
}

#[derive(Debug, Default, Deserialize)]
struct AbciQueryResponse {
    #[serde(default)]
    code: u32,
    #[serde(default)]
    log: String,
    /// Base64; absent on error.
    #[serde(default)]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BroadcastCommitResult {
    check_tx: TxResult,
    deliver_tx: TxResult,
    #[serde(default)]
    hash: String,
}

#[derive(Debug, Default, Deserialize)]
struct TxResult {
    #[serde(default)]
    code: u32,
    #[serde(default)]
    log: String,
}

/// JSON-RPC client for one chain node.
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    chain_id: String,
    store_name: String,
    next_id: Arc<AtomicU64>,
}

impl RpcClient {
    pub fn new(
        node: &str,
        chain_id: impl Into<String>,
        store_name: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: normalize_node_url(node),
            chain_id: chain_id.into(),
            store_name: store_name.into(),
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// ABCI query path for a channel endpoint.
    pub fn query_path(&self, endpoint: &str) -> String {
        format!("/custom/{}/{}", self.store_name, endpoint)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: serde_json::Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self.http.post(&self.url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RelayerError::Transport(format!(
                "{method} on {}: HTTP {status}",
                self.url
            )));
        }

        let response: RpcResponse<T> = response.json().await?;
        if let Some(err) = response.error {
            return Err(RelayerError::Transport(format!(
                "{method} on {}: rpc error {}: {} {}",
                self.url,
                err.code,
                err.message,
                err.data.unwrap_or_default()
            )));
        }
        response
            .result
            .ok_or_else(|| RelayerError::Decode(format!("{method}: empty result")))
    }
}

#[async_trait]
impl ChainClient for RpcClient {
    fn chain_id(&self) -> &str {
        &self.chain_id
    }

    async fn query(&self, request: &QueryRequest) -> Result<Vec<u8>> {
        let path = self.query_path(request.path());
        let data = hex::encode(request.encode_params()?);
        let result: AbciQueryResult = self
            .call(
                "abci_query",
                json!({ "path": path, "data": data, "prove": false }),
            )
            .await?;

        let response = result.response;
        if response.code != 0 {
            return Err(RelayerError::Query {
                chain: self.chain_id.clone(),
                path,
                code: response.code,
                log: response.log,
            });
        }
        let value = response.value.unwrap_or_default();
        BASE64
            .decode(value.as_bytes())
            .map_err(|e| RelayerError::Decode(format!("query value: {e}")))
    }

    async fn submit(&self, tx: &SignedTx) -> Result<()> {
        let encoded = BASE64.encode(tx.to_bytes()?);
        let result: BroadcastCommitResult = self
            .call("broadcast_tx_commit", json!({ "tx": encoded }))
            .await?;

        for outcome in [&result.check_tx, &result.deliver_tx] {
            if outcome.code != 0 {
                return Err(RelayerError::Submission {
                    chain: self.chain_id.clone(),
                    code: outcome.code,
                    log: outcome.log.clone(),
                });
            }
        }
        tracing::debug!(chain = %self.chain_id, hash = %result.hash, "transaction committed");
        Ok(())
    }
}
