//! Operator procedures: token allow-lists, oracle prices, pair creation
//! and fee pool wiring.

use alloy_primitives::U256;
use anyhow::{anyhow, Result};
use dex_core::*;
use dex_engine::{prediction::PRICE_DECIMALS, Operation, WalletManager};
use tracing::{info, warn};

/// Oracle prices pushed when none are given, in USD.
pub const DEFAULT_PRICES: [(&str, &str); 3] = [("RISE", "2.45"), ("USDC", "1.00"), ("USDT", "1.00")];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminStep {
    pub label: String,
    pub op: Operation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminSummary {
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
}

pub fn register_tokens(registry: &TokenRegistry) -> Vec<AdminStep> {
    registry
        .tokens()
        .iter()
        .map(|t| AdminStep {
            label: format!("allow {} on prediction market", t.symbol),
            op: Operation::AllowPredictionToken { token: t.address },
        })
        .collect()
}

pub fn push_prices(registry: &TokenRegistry, prices: &[(String, String)]) -> Result<Vec<AdminStep>> {
    prices
        .iter()
        .map(|(symbol, usd)| {
            let token = registry
                .lookup(symbol)
                .ok_or_else(|| anyhow!("unknown token '{}'", symbol))?;
            let price = parse_units(usd, PRICE_DECIMALS)?;
            Ok(AdminStep {
                label: format!("price {} = {}", token.symbol, usd),
                op: Operation::UpdatePrice {
                    token: token.address,
                    price,
                },
            })
        })
        .collect()
}

pub fn default_prices() -> Vec<(String, String)> {
    DEFAULT_PRICES
        .iter()
        .map(|(s, p)| (s.to_string(), p.to_string()))
        .collect()
}

/// One pair per unordered combination of registered tokens.
pub fn create_pairs(registry: &TokenRegistry) -> Vec<AdminStep> {
    let tokens = registry.tokens();
    let mut steps = Vec::new();
    for (i, a) in tokens.iter().enumerate() {
        for b in &tokens[i + 1..] {
            steps.push(AdminStep {
                label: format!("create pair {}/{}", a.symbol, b.symbol),
                op: Operation::CreatePair {
                    token_a: a.address,
                    token_b: b.address,
                },
            });
        }
    }
    steps
}

pub fn wire_fee_pool(contracts: &ContractAddresses, registry: &TokenRegistry) -> Vec<AdminStep> {
    let mut steps = vec![
        AdminStep {
            label: "fee pool: set AMM".to_string(),
            op: Operation::SetAmmContract { amm: contracts.amm },
        },
        AdminStep {
            label: "fee pool: set prediction market".to_string(),
            op: Operation::SetPredictionContract {
                prediction: contracts.prediction_market,
            },
        },
    ];
    steps.extend(registry.tokens().iter().map(|t| AdminStep {
        label: format!("allow {} in fee pool", t.symbol),
        op: Operation::AllowFeePoolToken { token: t.address },
    }));
    steps
}

pub fn seed_fee_pool(
    contracts: &ContractAddresses,
    registry: &TokenRegistry,
    symbol: &str,
    amount: &str,
) -> Result<Vec<AdminStep>> {
    let token = registry
        .lookup(symbol)
        .ok_or_else(|| anyhow!("unknown token '{}'", symbol))?;
    let amount: U256 = parse_units(amount, token.decimals)?;
    Ok(vec![
        AdminStep {
            label: format!("approve {} for fee pool", token.symbol),
            op: Operation::Approve {
                token: token.address,
                spender: contracts.fee_pool,
                amount,
            },
        },
        AdminStep {
            label: format!("deposit {} into fee pool", token.symbol),
            op: Operation::FeePoolDeposit {
                token: token.address,
                amount,
            },
        },
    ])
}

/// Submits each step in order. Expected reverts ("Pair exists", "Token
/// already added") are recorded as skipped; anything else stops the run.
pub async fn execute<P: WalletProvider, C: ChainReader>(
    wallet: &WalletManager<P, C>,
    steps: Vec<AdminStep>,
) -> Result<AdminSummary> {
    let mut summary = AdminSummary::default();
    for step in steps {
        match wallet.submit(step.op.clone()).await {
            Ok(receipt) => {
                info!(target: "admin", step=%step.label, tx=%receipt.transaction_hash, "applied");
                summary.applied.push(step.label);
            }
            Err(err) if err.is_benign() => {
                info!(target: "admin", step=%step.label, reason=%err, "already done");
                summary.skipped.push(step.label);
            }
            Err(err) => {
                warn!(target: "admin", step=%step.label, error=%err, "step failed");
                return Err(anyhow!("{}: {}", step.label, err));
            }
        }
    }
    Ok(summary)
}
