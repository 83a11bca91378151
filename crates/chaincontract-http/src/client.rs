//! HTTP JSON-RPC transport backed by `reqwest`.
//!
//! Connection failures, non-2xx statuses and timeouts are retried with
//! exponential backoff. Transaction submissions are only retried when the
//! request never reached the node. JSON-RPC error objects are returned
//! unchanged as [`TransportError::Rpc`] so revert data reaches the
//! dispatcher.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U256};
use chaincontract_core::{
    BlockTag, ChainTransport, JsonRpcRequest, JsonRpcResponse, LogFilter, RawLog, Receipt,
    TransportError, TxRequest,
};
use serde_json::{json, Value};

use crate::retry::{RetryConfig, RetryPolicy};
use crate::wire;

/// Methods that must not be resent once the node may have seen them.
const SUBMIT_METHODS: &[&str] = &["eth_sendTransaction", "eth_sendRawTransaction"];

/// A failed attempt, and whether the request could have reached the node.
struct Failure {
    error: TransportError,
    delivered: bool,
}

impl Failure {
    fn delivered(error: TransportError) -> Self {
        Self { error, delivered: true }
    }
}

/// Configuration for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    pub retry: RetryConfig,
    /// Per-request timeout, covering connect and body.
    pub request_timeout: Duration,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self { retry: RetryConfig::default(), request_timeout: Duration::from_secs(30) }
    }
}

/// [`ChainTransport`] over a single HTTP JSON-RPC endpoint.
///
/// Writes go through `eth_sendTransaction`, so the node must manage the
/// sending account (anvil, hardhat, geth with unlocked accounts, or a
/// signing proxy).
pub struct HttpTransport {
    url: String,
    http: reqwest::Client,
    retry: RetryPolicy,
    request_timeout: Duration,
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, config: HttpTransportConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransportError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            url: url.into(),
            http,
            retry: RetryPolicy::new(config.retry),
            request_timeout: config.request_timeout,
            next_id: AtomicU64::new(1),
        })
    }

    /// Create with default configuration.
    pub fn default_for(url: impl Into<String>) -> Result<Self, TransportError> {
        Self::new(url, HttpTransportConfig::default())
    }

    async fn send_once(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, Failure> {
        let resp = self.http.post(&self.url).json(req).send().await.map_err(|e| {
            let error = if e.is_timeout() {
                TransportError::Timeout { ms: self.request_timeout.as_millis() as u64 }
            } else {
                TransportError::Http(e.to_string())
            };
            Failure { error, delivered: !e.is_connect() }
        })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(Failure::delivered(TransportError::Http(format!("HTTP {status}: {body}"))));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| Failure::delivered(TransportError::Http(e.to_string())))?;
        serde_json::from_slice(&body).map_err(|e| Failure::delivered(e.into()))
    }

    /// Send one JSON-RPC request, retrying transient failures, and return
    /// its `result`.
    pub async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value, TransportError> {
        let req = JsonRpcRequest::new(self.next_id.fetch_add(1, Ordering::Relaxed), method, params);
        tracing::trace!(method, id = %req.id, url = %self.url, "rpc request");

        let submits = SUBMIT_METHODS.contains(&method);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.send_once(&req).await {
                Ok(resp) => return resp.into_result().map_err(TransportError::Rpc),
                Err(Failure { error, delivered: true }) if submits => {
                    tracing::error!(method, attempt, error = %error, url = %self.url, "submission outcome unknown, not resending");
                    return Err(error);
                }
                Err(Failure { error: e, .. }) if e.is_retryable() => match self.retry.next_delay(attempt) {
                    Some(delay) => {
                        tracing::warn!(
                            method,
                            attempt,
                            delay_ms = delay.as_millis(),
                            error = %e,
                            url = %self.url,
                            "retrying request"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        tracing::error!(method, attempt, error = %e, url = %self.url, "max retries exceeded");
                        return Err(e);
                    }
                },
                Err(Failure { error, .. }) => return Err(error),
            }
        }
    }
}

#[async_trait]
impl ChainTransport for HttpTransport {
    async fn call(&self, tx: &TxRequest, block: BlockTag) -> Result<Bytes, TransportError> {
        let result = self.request("eth_call", vec![wire::tx_object(tx), json!(block.to_rpc_param())]).await?;
        wire::parse_bytes(&result)
    }

    async fn send_transaction(&self, tx: &TxRequest) -> Result<B256, TransportError> {
        let result = self.request("eth_sendTransaction", vec![wire::tx_object(tx)]).await?;
        wire::parse_b256(&result)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, TransportError> {
        let result = self
            .request("eth_sendRawTransaction", vec![json!(format!("0x{}", hex::encode(raw)))])
            .await?;
        wire::parse_b256(&result)
    }

    async fn get_transaction_receipt(&self, hash: B256) -> Result<Option<Receipt>, TransportError> {
        let result = self.request("eth_getTransactionReceipt", vec![json!(hash)]).await?;
        wire::parse_receipt(result)
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, TransportError> {
        let result = self.request("eth_getLogs", vec![wire::filter_object(filter)]).await?;
        wire::parse_logs(result)
    }

    async fn get_code(&self, address: Address, block: BlockTag) -> Result<Bytes, TransportError> {
        let result = self.request("eth_getCode", vec![json!(address), json!(block.to_rpc_param())]).await?;
        wire::parse_bytes(&result)
    }

    async fn get_balance(&self, address: Address, block: BlockTag) -> Result<U256, TransportError> {
        let result = self
            .request("eth_getBalance", vec![json!(address), json!(block.to_rpc_param())])
            .await?;
        wire::parse_u256(&result)
    }

    async fn get_transaction_count(&self, address: Address, block: BlockTag) -> Result<u64, TransportError> {
        let result = self
            .request("eth_getTransactionCount", vec![json!(address), json!(block.to_rpc_param())])
            .await?;
        wire::parse_u64(&result)
    }

    async fn chain_id(&self) -> Result<u64, TransportError> {
        let result = self.request("eth_chainId", vec![]).await?;
        wire::parse_u64(&result)
    }

    async fn estimate_gas(&self, tx: &TxRequest) -> Result<u64, TransportError> {
        let result = self.request("eth_estimateGas", vec![wire::tx_object(tx)]).await?;
        wire::parse_u64(&result)
    }

    async fn gas_price(&self) -> Result<u128, TransportError> {
        let result = self.request("eth_gasPrice", vec![]).await?;
        wire::parse_u128(&result)
    }

    async fn accounts(&self) -> Result<Vec<Address>, TransportError> {
        let result = self.request("eth_accounts", vec![]).await?;
        wire::parse_addresses(&result)
    }

    fn url(&self) -> &str {
        &self.url
    }
}
