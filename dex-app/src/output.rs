//! Plain-text rendering of engine data for the CLI.

use alloy_primitives::U256;
use dex_core::*;
use dex_engine::prediction::{format_timestamp, remaining_time, PRICE_DECIMALS};
use dex_engine::ViewSnapshot;

pub const PLACEHOLDER: &str = "—";

pub fn amount(value: U256, decimals: u8) -> String {
    format_display(value, decimals, 4)
}

pub fn maybe_amount(value: Option<U256>, decimals: u8) -> String {
    value
        .map(|v| amount(v, decimals))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn session_lines(session: &WalletSession, network: &NetworkConfig, registry: &TokenRegistry) -> Vec<String> {
    let Some(short) = session.short_address() else {
        return vec!["wallet: not connected".to_string()];
    };
    let mut lines = vec![format!(
        "wallet: {} on chain {}",
        short,
        session
            .chain_id
            .map(|c| c.to_string())
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    )];
    if let Some(chain) = session.chain_id.filter(|c| *c != network.chain_id) {
        lines.push(format!(
            "warning: wallet is on chain {}, switch to {} ({})",
            chain, network.name, network.chain_id
        ));
    }
    lines.push(format!(
        "  {} {}",
        amount(session.balances.native, network.native_currency.decimals),
        network.native_currency.symbol
    ));
    for token in registry.tokens() {
        lines.push(format!(
            "  {} {} {}",
            token.glyph,
            amount(session.balances.token(&token.address), token.decimals),
            token.symbol
        ));
    }
    lines
}

pub fn pair_line(pair: &Pair) -> String {
    format!(
        "{} {}  reserves {} / {}  liquidity {}",
        pair.label(),
        pair.id,
        amount(pair.reserve_a, pair.token_a.decimals),
        amount(pair.reserve_b, pair.token_b.decimals),
        pair.total_liquidity
    )
}

pub fn position_line(position: &LiquidityPosition, pairs: &[Pair]) -> String {
    match pairs.iter().find(|p| p.id == position.pair_id) {
        Some(pair) => {
            let share_bps = if pair.total_liquidity.is_zero() {
                0
            } else {
                u64::try_from(position.liquidity.saturating_mul(U256::from(10_000u32)) / pair.total_liquidity)
                    .unwrap_or(u64::MAX)
            };
            format!(
                "{}  liquidity {}  deposited {} {} + {} {}  share {}.{:02}%",
                pair.label(),
                position.liquidity,
                amount(position.deposited_a, pair.token_a.decimals),
                pair.token_a.symbol,
                amount(position.deposited_b, pair.token_b.decimals),
                pair.token_b.symbol,
                share_bps / 100,
                share_bps % 100
            )
        }
        None => format!("{}  liquidity {}", position.pair_id, position.liquidity),
    }
}

pub fn bet_line(bet: &Bet, now: UnixSeconds) -> String {
    let direction = if bet.predict_up { "UP" } else { "DOWN" };
    let timing = if bet.is_active() {
        remaining_time(bet, now).to_string()
    } else {
        format!("closed {}", format_timestamp(bet.end_time))
    };
    format!(
        "#{} {} {} {} at {}  [{}]  {}",
        bet.id,
        direction,
        amount(bet.amount, bet.token.decimals),
        bet.token.symbol,
        amount(bet.initial_price, PRICE_DECIMALS),
        bet.status,
        timing
    )
}

pub fn stats_lines(stats: &ProtocolStats, pools: Option<&[PoolBalance]>) -> Vec<String> {
    let mut lines = vec![
        format!("swap volume     {}", maybe_amount(stats.total_swap_volume, 18)),
        format!("fees collected  {}", maybe_amount(stats.total_fees_collected, 18)),
        format!(
            "total bets      {}",
            stats
                .total_bets
                .map(|v| v.to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string())
        ),
        format!("bet volume      {}", maybe_amount(stats.total_bet_volume, 18)),
        format!(
            "active bets     {}",
            stats
                .active_bets
                .map(|v| v.to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string())
        ),
    ];
    match pools {
        Some(pools) => {
            for p in pools {
                lines.push(format!(
                    "fee pool {} {}",
                    amount(p.balance, p.token.decimals),
                    p.token.symbol
                ));
            }
        }
        None => lines.push(format!("fee pool {}", PLACEHOLDER)),
    }
    lines
}

/// One-line market ticker: `SYM price (+x.xx%)` per entry.
pub fn ticker_line(prices: &[CryptoPrice]) -> String {
    if prices.is_empty() {
        return format!("prices {}", PLACEHOLDER);
    }
    prices
        .iter()
        .map(|p| {
            let change = p
                .price_change_percentage_24h
                .map(|c| format!("{:+.2}%", c))
                .unwrap_or_else(|| PLACEHOLDER.to_string());
            format!("{} {:.2} ({})", p.symbol.to_uppercase(), p.current_price, change)
        })
        .collect::<Vec<_>>()
        .join("  |  ")
}

pub fn view_summary(view: &ViewSnapshot) -> String {
    let count = |n: Option<usize>| n.map(|n| n.to_string()).unwrap_or_else(|| PLACEHOLDER.to_string());
    format!(
        "pairs {}  positions {}  active bets {}",
        count(view.pairs.as_ref().map(Vec::len)),
        count(view.positions.as_ref().map(Vec::len)),
        count(view.bets.as_ref().map(|b| b.active.len()))
    )
}
