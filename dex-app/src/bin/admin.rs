use std::{env, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Result};
use dex_app::{
    admin::{self, AdminStep},
    config::load_config,
};
use dex_engine::{rpc::JsonRpcClient, ContractReader, Metrics, WalletManager};
use prometheus::Registry;
use tracing::info;
use tracing_subscriber::EnvFilter;

const ADMIN_USAGE: &str = "\
usage: dex-admin [--config <path>] <step>

  tokens                  allow every registered token on the prediction market
  prices [SYM=USD ...]    push oracle prices (defaults when none given)
  pairs                   create every token pair on the AMM
  fee-pool                point the fee pool at the AMM and prediction market
  seed <token> <amount>   approve and deposit into the fee pool
  all                     tokens, prices, pairs and fee-pool in order
";

fn parse_price(arg: &str) -> Result<(String, String)> {
    let (sym, usd) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected SYM=USD, got '{}'", arg))?;
    Ok((sym.trim().to_string(), usd.trim().to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut config_path = PathBuf::from("config.json");
    let mut rest: Vec<String> = Vec::new();
    let mut args = env::args().skip(1);
    while let Some(a) = args.next() {
        if a == "--config" || a == "-c" {
            config_path = PathBuf::from(args.next().ok_or_else(|| anyhow!("--config needs a path"))?);
        } else {
            rest.push(a);
        }
    }
    let Some(step) = rest.first().cloned() else {
        eprintln!("{}", ADMIN_USAGE);
        std::process::exit(2);
    };

    let cfg = load_config(&config_path).await?;
    let tokens = cfg.registry();
    let steps: Vec<AdminStep> = match step.as_str() {
        "tokens" => admin::register_tokens(&tokens),
        "prices" => {
            let prices = if rest.len() > 1 {
                rest[1..].iter().map(|a| parse_price(a)).collect::<Result<Vec<_>>>()?
            } else {
                admin::default_prices()
            };
            admin::push_prices(&tokens, &prices)?
        }
        "pairs" => admin::create_pairs(&tokens),
        "fee-pool" => admin::wire_fee_pool(&cfg.contracts, &tokens),
        "seed" => {
            let symbol = rest.get(1).ok_or_else(|| anyhow!("missing <token>"))?;
            let amount = rest.get(2).ok_or_else(|| anyhow!("missing <amount>"))?;
            admin::seed_fee_pool(&cfg.contracts, &tokens, symbol, amount)?
        }
        "all" => {
            let mut steps = admin::register_tokens(&tokens);
            steps.extend(admin::push_prices(&tokens, &admin::default_prices())?);
            steps.extend(admin::create_pairs(&tokens));
            steps.extend(admin::wire_fee_pool(&cfg.contracts, &tokens));
            steps
        }
        other => bail!("unknown step '{}'\n\n{}", other, ADMIN_USAGE),
    };

    let registry = Registry::new();
    let metrics = Metrics::new(&registry);
    let chain = Arc::new(JsonRpcClient::new(&cfg.network.rpc_url, cfg.rpc_timeout_ms, &registry)?);
    let wallet_url = cfg
        .wallet
        .url
        .as_deref()
        .ok_or_else(|| anyhow!("wallet.url must be set to sign admin transactions"))?;
    let provider = Arc::new(
        JsonRpcClient::new(wallet_url, cfg.wallet.timeout_ms, &registry)?
            .with_receipt_poll(Duration::from_millis(cfg.wallet.receipt_poll_ms)),
    );
    let wallet = WalletManager::new(
        Some(provider),
        ContractReader::new(chain, cfg.contracts),
        cfg.network.clone(),
        Arc::new(tokens),
        metrics,
    );
    let session = wallet.connect().await?;
    info!(target: "admin", account=?session.address, steps=steps.len(), "running");

    let summary = admin::execute(&wallet, steps).await?;
    for label in &summary.applied {
        println!("applied  {}", label);
    }
    for label in &summary.skipped {
        println!("skipped  {} (already done)", label);
    }
    Ok(())
}
