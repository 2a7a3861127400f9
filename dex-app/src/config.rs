use std::{env, path::Path, path::PathBuf};

use alloy_primitives::Address;
use anyhow::{anyhow, Context, Result};
use dex_core::Token;
use dex_engine::config::EngineConfig;
use serde_json::{Map, Value};
use tokio::fs;
use tracing::info;

fn json_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(|v| v.as_str())
}

fn json_u64(obj: &Map<String, Value>, key: &str) -> Option<u64> {
    obj.get(key).and_then(|v| v.as_u64())
}

fn json_address(obj: &Map<String, Value>, key: &str) -> Result<Option<Address>> {
    json_str(obj, key)
        .map(|s| {
            s.to_ascii_lowercase()
                .parse::<Address>()
                .with_context(|| format!("invalid address for {}", key))
        })
        .transpose()
}

/// Defaults, then the JSON file at `config_path` (if present), then env.
pub async fn load_config(config_path: &Path) -> Result<EngineConfig> {
    let mut cfg = EngineConfig::default();
    match fs::read(config_path).await {
        Ok(raw) => {
            let disk: Value = serde_json::from_slice(&raw).context("parse config json")?;
            apply_overrides(&mut cfg, &disk)?;
            info!("loaded config: {}", config_path.display());
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!("no config at {}, using Rise Testnet defaults", config_path.display());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("read config file: {}", config_path.display()))
        }
    }
    apply_env(&mut cfg, |key| env::var(key).ok());
    Ok(cfg)
}

pub fn apply_overrides(cfg: &mut EngineConfig, disk: &Value) -> Result<()> {
    let root = disk
        .as_object()
        .ok_or_else(|| anyhow!("config root must be a JSON object"))?;

    if let Some(net) = root.get("network").and_then(|v| v.as_object()) {
        if let Some(id) = json_u64(net, "chain_id") {
            cfg.network.chain_id = id;
        }
        if let Some(name) = json_str(net, "name") {
            cfg.network.name = name.to_string();
        }
        if let Some(url) = json_str(net, "rpc_url") {
            cfg.network.rpc_url = url.to_string();
        }
        if let Some(url) = json_str(net, "explorer_url") {
            cfg.network.explorer_url = url.to_string();
        }
    }
    if let Some(w) = root.get("wallet").and_then(|v| v.as_object()) {
        if let Some(url) = json_str(w, "url") {
            cfg.wallet.url = Some(url.to_string());
        }
        if let Some(ms) = json_u64(w, "timeout_ms") {
            cfg.wallet.timeout_ms = ms;
        }
        if let Some(ms) = json_u64(w, "poll_interval_ms") {
            cfg.wallet.poll_interval_ms = ms;
        }
        if let Some(ms) = json_u64(w, "receipt_poll_ms") {
            cfg.wallet.receipt_poll_ms = ms;
        }
    }
    if let Some(c) = root.get("contracts").and_then(|v| v.as_object()) {
        if let Some(a) = json_address(c, "fee_pool")? {
            cfg.contracts.fee_pool = a;
        }
        if let Some(a) = json_address(c, "amm")? {
            cfg.contracts.amm = a;
        }
        if let Some(a) = json_address(c, "prediction_market")? {
            cfg.contracts.prediction_market = a;
        }
    }
    if let Some(tokens) = root.get("tokens") {
        cfg.tokens = serde_json::from_value::<Vec<Token>>(tokens.clone()).context("parse tokens")?;
    }
    if let Some(f) = root.get("feeds").and_then(|v| v.as_object()) {
        if let Some(url) = json_str(f, "prices_url") {
            cfg.feeds.prices_url = url.to_string();
        }
        if let Some(ms) = json_u64(f, "price_interval_ms") {
            cfg.feeds.price_interval_ms = ms;
        }
        if let Some(ms) = json_u64(f, "news_interval_ms") {
            cfg.feeds.news_interval_ms = ms;
        }
    }
    if let Some(bps) = json_u64(root, "fee_bps") {
        cfg.fee_bps = u32::try_from(bps).context("fee_bps out of range")?;
    }
    if let Some(bps) = json_u64(root, "slippage_bps") {
        cfg.slippage_bps = u32::try_from(bps).context("slippage_bps out of range")?;
    }
    if let Some(ms) = json_u64(root, "rpc_timeout_ms") {
        cfg.rpc_timeout_ms = ms;
    }
    if let Some(dir) = json_str(root, "storage_dir") {
        cfg.storage_dir = PathBuf::from(dir);
    }
    Ok(())
}

pub fn apply_env(cfg: &mut EngineConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("RISE_RPC_URL") {
        cfg.network.rpc_url = url;
    }
    if let Some(url) = lookup("WALLET_RPC_URL") {
        cfg.wallet.url = Some(url);
    }
    if let Some(dir) = lookup("DEX_STORAGE_DIR") {
        cfg.storage_dir = PathBuf::from(dir);
    }
}
