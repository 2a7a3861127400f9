//! JSON-RPC over HTTP: chain reads against the public node and EIP-1193
//! wallet requests against a wallet endpoint.

use alloy_primitives::{hex, Address, Bytes, B256, U256};
use alloy_sol_types::{Revert, SolError};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use dex_core::{ChainReader, NetworkConfig, ProviderError, TxReceipt, TxRequest, WalletProvider};
use prometheus::{HistogramVec, IntCounterVec, Registry};
use reqwest::{Client, ClientBuilder};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];
const EXECUTION_REVERTED: i64 = 3;

#[derive(Clone)]
pub struct JsonRpcClient {
    client: Client,
    url: Url,
    next_id: Arc<AtomicU64>,
    receipt_poll: Duration,
    metrics: Arc<RpcMetrics>,
}

impl JsonRpcClient {
    pub fn new(rpc_url: &str, timeout_ms: u64, registry: &Registry) -> Result<Self> {
        let client = ClientBuilder::new()
            .tcp_keepalive(Some(Duration::from_secs(30)))
            .connect_timeout(Duration::from_millis(timeout_ms))
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .context("build reqwest client")?;
        let url = Url::parse(&http_url(rpc_url)).context("parse rpc url")?;
        Ok(Self {
            client,
            url,
            next_id: Arc::new(AtomicU64::new(1)),
            receipt_poll: Duration::from_millis(1_000),
            metrics: Arc::new(RpcMetrics::new(registry)),
        })
    }

    pub fn with_receipt_poll(mut self, every: Duration) -> Self {
        self.receipt_poll = every;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        let start = Instant::now();
        self.metrics.req_total.with_label_values(&[method]).inc();
        let result = self.send(&body).await;
        let dur = start.elapsed().as_secs_f64();
        self.metrics.latency.with_label_values(&[method]).observe(dur);
        let latency_ms = (dur * 1000.0) as u64;
        match &result {
            Ok(_) => {
                tracing::debug!(target: "rpc", method=%method, latency_ms=%latency_ms, "rpc request completed")
            }
            Err(err) => {
                self.metrics.fail_total.with_label_values(&[method]).inc();
                tracing::debug!(target: "rpc", method=%method, code=err.code, error=%err.message, latency_ms=%latency_ms, "rpc request failed");
            }
        }
        result
    }

    async fn send(&self, body: &Value) -> Result<Value, ProviderError> {
        let resp = self
            .client
            .post(self.url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::transport(e.to_string()))?;
        let js: Value = resp
            .json()
            .await
            .map_err(|e| ProviderError::transport(format!("decode rpc response: {}", e)))?;
        if let Some(err) = js.get("error") {
            return Err(parse_error(err));
        }
        Ok(js.get("result").cloned().unwrap_or(Value::Null))
    }
}

#[async_trait]
impl ChainReader for JsonRpcClient {
    async fn native_balance(&self, owner: Address) -> Result<U256> {
        let v = self
            .request("eth_getBalance", json!([owner, "latest"]))
            .await?;
        parse_quantity(&v)
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let v = self
            .request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await?;
        parse_bytes(&v)
    }
}

#[async_trait]
impl WalletProvider for JsonRpcClient {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let v = self.request("eth_requestAccounts", json!([])).await?;
        parse_accounts(v)
    }

    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let v = self.request("eth_accounts", json!([])).await?;
        parse_accounts(v)
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        let v = self.request("eth_chainId", json!([])).await?;
        parse_quantity(&v)
            .and_then(|q| u64::try_from(q).map_err(|_| anyhow!("chain id out of range")))
            .map_err(malformed)
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
        self.request(
            "wallet_switchEthereumChain",
            json!([{ "chainId": format!("0x{:x}", chain_id) }]),
        )
        .await
        .map(|_| ())
    }

    async fn add_chain(&self, network: &NetworkConfig) -> Result<(), ProviderError> {
        self.request("wallet_addEthereumChain", json!([add_chain_params(network)]))
            .await
            .map(|_| ())
    }

    async fn send_transaction(&self, tx: TxRequest) -> Result<B256, ProviderError> {
        let v = self
            .request(
                "eth_sendTransaction",
                json!([{
                    "from": tx.from,
                    "to": tx.to,
                    "data": tx.data,
                    "value": format!("0x{:x}", tx.value),
                }]),
            )
            .await?;
        let s = v
            .as_str()
            .ok_or_else(|| ProviderError::new(ProviderError::INTERNAL, "missing tx hash"))?;
        s.parse::<B256>()
            .map_err(|e| ProviderError::new(ProviderError::INTERNAL, format!("bad tx hash: {}", e)))
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxReceipt, ProviderError> {
        loop {
            let v = self
                .request("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;
            if let Some(receipt) = parse_receipt(&v).map_err(malformed)? {
                return Ok(receipt);
            }
            tokio::time::sleep(self.receipt_poll).await;
        }
    }
}

/// Wallet endpoints and the public node are HTTP; websocket urls are mapped
/// onto their HTTP equivalents.
pub fn http_url(rpc_url: &str) -> String {
    if rpc_url.starts_with("wss://") {
        rpc_url.replacen("wss://", "https://", 1)
    } else if rpc_url.starts_with("ws://") {
        rpc_url.replacen("ws://", "http://", 1)
    } else {
        rpc_url.to_string()
    }
}

pub fn add_chain_params(network: &NetworkConfig) -> Value {
    json!({
        "chainId": network.chain_id_hex(),
        "chainName": network.name,
        "nativeCurrency": {
            "name": network.native_currency.name,
            "symbol": network.native_currency.symbol,
            "decimals": network.native_currency.decimals,
        },
        "rpcUrls": [network.rpc_url],
        "blockExplorerUrls": [network.explorer_url],
    })
}

fn malformed(err: anyhow::Error) -> ProviderError {
    ProviderError::new(ProviderError::INTERNAL, format!("malformed response: {}", err))
}

fn parse_error(err: &Value) -> ProviderError {
    ProviderError {
        code: err
            .get("code")
            .and_then(Value::as_i64)
            .unwrap_or(ProviderError::INTERNAL),
        message: err
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string(),
        data: err.get("data").cloned(),
    }
}

fn parse_accounts(v: Value) -> Result<Vec<Address>, ProviderError> {
    serde_json::from_value(v).map_err(|e| malformed(e.into()))
}

pub fn parse_quantity(v: &Value) -> Result<U256> {
    let s = v.as_str().ok_or_else(|| anyhow!("expected hex quantity"))?;
    let digits = s.trim_start_matches("0x");
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16).with_context(|| format!("parse quantity {}", s))
}

pub fn parse_bytes(v: &Value) -> Result<Bytes> {
    let s = v.as_str().ok_or_else(|| anyhow!("expected hex data"))?;
    let raw = hex::decode(s.trim_start_matches("0x")).context("decode hex data")?;
    Ok(Bytes::from(raw))
}

/// `None` while the transaction is still pending.
pub fn parse_receipt(v: &Value) -> Result<Option<TxReceipt>> {
    if v.is_null() {
        return Ok(None);
    }
    let transaction_hash = v
        .get("transactionHash")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("receipt without transactionHash"))?
        .parse::<B256>()
        .context("parse transactionHash")?;
    let block_number = match v.get("blockNumber") {
        Some(b) if !b.is_null() => {
            Some(u64::try_from(parse_quantity(b)?).map_err(|_| anyhow!("block number"))?)
        }
        _ => None,
    };
    if block_number.is_none() {
        return Ok(None);
    }
    let status = match v.get("status") {
        Some(s) if !s.is_null() => parse_quantity(s)? == U256::from(1u8),
        _ => true,
    };
    let gas_used = match v.get("gasUsed") {
        Some(g) if !g.is_null() => Some(parse_quantity(g)?),
        _ => None,
    };
    Ok(Some(TxReceipt {
        transaction_hash,
        block_number,
        status,
        gas_used,
    }))
}

pub fn is_revert(err: &ProviderError) -> bool {
    err.code == EXECUTION_REVERTED
        || err.message.to_ascii_lowercase().contains("revert")
        || revert_data(err).is_some()
}

/// Extracts the `Error(string)` reason from a provider error, either from the
/// ABI-encoded revert data or from an `execution reverted: ...` message.
pub fn revert_reason(err: &ProviderError) -> Option<String> {
    if let Some(data) = revert_data(err) {
        if let Ok(revert) = Revert::abi_decode(&data, true) {
            return Some(revert.reason);
        }
    }
    let lower = err.message.to_ascii_lowercase();
    let idx = lower.find("reverted:")?;
    let reason = err.message[idx + "reverted:".len()..].trim();
    if reason.is_empty() {
        None
    } else {
        Some(reason.to_string())
    }
}

fn revert_data(err: &ProviderError) -> Option<Vec<u8>> {
    let data = err.data.as_ref()?;
    let s = match data {
        Value::String(s) => s.as_str(),
        Value::Object(obj) => obj.get("data").and_then(Value::as_str)?,
        _ => return None,
    };
    let raw = hex::decode(s.trim_start_matches("0x")).ok()?;
    if raw.len() >= 4 && raw[..4] == ERROR_STRING_SELECTOR {
        Some(raw)
    } else {
        None
    }
}

struct RpcMetrics {
    req_total: IntCounterVec,
    fail_total: IntCounterVec,
    latency: HistogramVec,
}

impl RpcMetrics {
    fn new(registry: &Registry) -> Self {
        let req_total = IntCounterVec::new(
            prometheus::Opts::new("rpc_requests_total", "JSON-RPC requests total"),
            &["method"],
        )
        .unwrap();
        let fail_total = IntCounterVec::new(
            prometheus::Opts::new("rpc_failures_total", "JSON-RPC failures total"),
            &["method"],
        )
        .unwrap();
        let latency = HistogramVec::new(
            prometheus::HistogramOpts::new("rpc_latency_seconds", "JSON-RPC latency seconds")
                .buckets(vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["method"],
        )
        .unwrap();
        registry.register(Box::new(req_total.clone())).ok();
        registry.register(Box::new(fail_total.clone())).ok();
        registry.register(Box::new(latency.clone())).ok();
        Self {
            req_total,
            fail_total,
            latency,
        }
    }
}
