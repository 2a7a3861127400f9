//! Constant-product quote math and amount formatting.
//!
//! Everything here works on base units (`U256`) and floors like the
//! contract's integer division. The on-chain result is authoritative; these
//! functions only preview it.

use alloy_primitives::U256;

use crate::error::{DexError, QuoteError};

pub const BPS_DENOMINATOR: u32 = 10_000;
pub const DEFAULT_FEE_BPS: u32 = 30;
pub const DEFAULT_SLIPPAGE_BPS: u32 = 50;
pub const SLIPPAGE_PRESETS_BPS: [u32; 3] = [10, 50, 100];
pub const REMOVE_PERCENT_PRESETS: [u8; 4] = [25, 50, 75, 100];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapQuote {
    pub amount_in_after_fee: U256,
    pub fee: U256,
    pub amount_out: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovalQuote {
    pub liquidity: U256,
    pub amount_a: U256,
    pub amount_b: U256,
}

fn mul_div(a: U256, b: U256, denom: U256) -> Result<U256, QuoteError> {
    let product = a.checked_mul(b).ok_or(QuoteError::Overflow)?;
    Ok(product / denom)
}

pub fn quote_swap_output(
    reserve_in: U256,
    reserve_out: U256,
    amount_in: U256,
    fee_bps: u32,
) -> Result<SwapQuote, QuoteError> {
    if fee_bps > BPS_DENOMINATOR {
        return Err(QuoteError::InvalidFee(fee_bps));
    }
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return Err(QuoteError::NoLiquidity);
    }
    let denom = U256::from(BPS_DENOMINATOR);
    let after_fee = mul_div(amount_in, U256::from(BPS_DENOMINATOR - fee_bps), denom)?;
    let pool_in = reserve_in
        .checked_add(after_fee)
        .ok_or(QuoteError::Overflow)?;
    let amount_out = mul_div(reserve_out, after_fee, pool_in)?;
    Ok(SwapQuote {
        amount_in_after_fee: after_fee,
        fee: amount_in - after_fee,
        amount_out,
    })
}

pub fn quote_matching_deposit(
    reserve_a: U256,
    reserve_b: U256,
    amount_a: U256,
) -> Result<U256, QuoteError> {
    if reserve_a.is_zero() {
        return Err(QuoteError::NoPriceRatio);
    }
    mul_div(amount_a, reserve_b, reserve_a)
}

/// `Ok(None)` means there is nothing to remove and no transaction should be sent.
pub fn quote_removal(
    position_liquidity: U256,
    total_liquidity: U256,
    reserve_a: U256,
    reserve_b: U256,
    percent: u8,
) -> Result<Option<RemovalQuote>, QuoteError> {
    if percent > 100 {
        return Err(QuoteError::InvalidPercent(percent));
    }
    if percent == 0 {
        return Ok(None);
    }
    if total_liquidity.is_zero() {
        return Err(QuoteError::NoLiquidity);
    }
    let liquidity = mul_div(position_liquidity, U256::from(percent), U256::from(100u8))?;
    if liquidity.is_zero() {
        return Ok(None);
    }
    Ok(Some(RemovalQuote {
        liquidity,
        amount_a: mul_div(liquidity, reserve_a, total_liquidity)?,
        amount_b: mul_div(liquidity, reserve_b, total_liquidity)?,
    }))
}

pub fn min_amount_out(amount_out: U256, slippage_bps: u32) -> Result<U256, QuoteError> {
    if slippage_bps > BPS_DENOMINATOR {
        return Err(QuoteError::InvalidSlippage(slippage_bps));
    }
    mul_div(
        amount_out,
        U256::from(BPS_DENOMINATOR - slippage_bps),
        U256::from(BPS_DENOMINATOR),
    )
}

/// Shortfall of `amount_out` against the spot-price output, in bps.
pub fn price_impact_bps(reserve_in: U256, reserve_out: U256, amount_in: U256, amount_out: U256) -> u32 {
    if reserve_in.is_zero() {
        return 0;
    }
    let ideal = match mul_div(amount_in, reserve_out, reserve_in) {
        Ok(v) if !v.is_zero() => v,
        _ => return 0,
    };
    if amount_out >= ideal {
        return 0;
    }
    match mul_div(ideal - amount_out, U256::from(BPS_DENOMINATOR), ideal) {
        Ok(v) => u32::try_from(v).unwrap_or(u32::MAX),
        Err(_) => 0,
    }
}

fn pow10(decimals: u8) -> Option<U256> {
    let ten = U256::from(10u8);
    let mut v = U256::from(1u8);
    for _ in 0..decimals {
        v = v.checked_mul(ten)?;
    }
    Some(v)
}

/// Decimal rendering of a base-unit amount, e.g. `1500000` at 6 decimals is `"1.5"`.
pub fn format_units(amount: U256, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let Some(scale) = pow10(decimals) else {
        return amount.to_string();
    };
    let int = amount / scale;
    let frac = amount % scale;
    let frac = format!("{:0>width$}", frac.to_string(), width = decimals as usize);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        format!("{}.0", int)
    } else {
        format!("{}.{}", int, frac)
    }
}

pub fn parse_units(input: &str, decimals: u8) -> Result<U256, DexError> {
    let s = input.trim();
    let invalid = |why: &str| DexError::InvalidAmount(format!("'{}': {}", input, why));
    if s.is_empty() {
        return Err(invalid("empty"));
    }
    let (int, frac) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };
    if int.is_empty() && frac.is_empty() {
        return Err(invalid("no digits"));
    }
    if !int.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("not a decimal number"));
    }
    if frac.len() > decimals as usize {
        return Err(invalid("too many decimal places"));
    }
    let mut digits = String::with_capacity(int.len() + decimals as usize);
    digits.push_str(if int.is_empty() { "0" } else { int });
    digits.push_str(frac);
    for _ in frac.len()..decimals as usize {
        digits.push('0');
    }
    U256::from_str_radix(&digits, 10).map_err(|_| invalid("out of range"))
}

/// Grouped, truncated rendering for display: at least two and at most
/// `max_frac` fraction digits.
pub fn format_display(amount: U256, decimals: u8, max_frac: usize) -> String {
    let full = format_units(amount, decimals);
    let (int, frac) = full.split_once('.').unwrap_or((full.as_str(), ""));

    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let min_frac = max_frac.min(2);
    let mut frac: String = frac.chars().take(max_frac).collect();
    while frac.len() > min_frac && frac.ends_with('0') {
        frac.pop();
    }
    while frac.len() < min_frac {
        frac.push('0');
    }
    if frac.is_empty() {
        grouped
    } else {
        format!("{}.{}", grouped, frac)
    }
}
