use alloy_primitives::U256;
use dashmap::DashMap;
use dex_core::{quote_swap_output, QuoteError, SwapQuote};

type QuoteKey = (U256, U256, U256, u32);

/// Swap quotes memoized by the exact `(reserve_in, reserve_out, amount_in,
/// fee_bps)` tuple. New reserves are a new key, so entries never go stale.
pub struct QuoteCache {
    entries: DashMap<QuoteKey, SwapQuote>,
    capacity: usize,
}

impl Default for QuoteCache {
    fn default() -> Self {
        Self::new(1_024)
    }
}

impl QuoteCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn quote(
        &self,
        reserve_in: U256,
        reserve_out: U256,
        amount_in: U256,
        fee_bps: u32,
    ) -> Result<SwapQuote, QuoteError> {
        let key = (reserve_in, reserve_out, amount_in, fee_bps);
        if let Some(hit) = self.entries.get(&key) {
            return Ok(*hit);
        }
        let quote = quote_swap_output(reserve_in, reserve_out, amount_in, fee_bps)?;
        if self.entries.len() >= self.capacity {
            self.entries.clear();
        }
        self.entries.insert(key, quote);
        Ok(quote)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
