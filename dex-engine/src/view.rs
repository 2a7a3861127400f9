use crate::prediction::BetBook;
use dex_core::{LiquidityPosition, Pair, PoolBalance, ProtocolStats};
use parking_lot::RwLock;

/// Derived data shown to the user. `None` means not loaded yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewSnapshot {
    pub generation: u64,
    pub pairs: Option<Vec<Pair>>,
    pub positions: Option<Vec<LiquidityPosition>>,
    pub bets: Option<BetBook>,
    pub stats: Option<ProtocolStats>,
    pub pool_balances: Option<Vec<PoolBalance>>,
}

/// Results are tagged with the generation they were fetched under; anything
/// from before the last invalidation is dropped.
#[derive(Default)]
pub struct ViewState {
    inner: RwLock<ViewSnapshot>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.inner.read().clone()
    }

    pub fn generation(&self) -> u64 {
        self.inner.read().generation
    }

    pub fn invalidate(&self) -> u64 {
        let mut v = self.inner.write();
        let generation = v.generation + 1;
        *v = ViewSnapshot {
            generation,
            ..ViewSnapshot::default()
        };
        generation
    }

    /// Clears what belongs to a specific account.
    pub fn clear_user(&self) {
        let mut v = self.inner.write();
        v.positions = None;
        v.bets = None;
    }

    fn apply(&self, generation: u64, f: impl FnOnce(&mut ViewSnapshot)) -> bool {
        let mut v = self.inner.write();
        if v.generation != generation {
            return false;
        }
        f(&mut v);
        true
    }

    pub fn set_pairs(&self, generation: u64, pairs: Vec<Pair>) -> bool {
        self.apply(generation, |v| v.pairs = Some(pairs))
    }

    pub fn set_positions(&self, generation: u64, positions: Vec<LiquidityPosition>) -> bool {
        self.apply(generation, |v| v.positions = Some(positions))
    }

    pub fn set_bets(&self, generation: u64, bets: BetBook) -> bool {
        self.apply(generation, |v| v.bets = Some(bets))
    }

    pub fn set_stats(&self, generation: u64, stats: ProtocolStats) -> bool {
        self.apply(generation, |v| v.stats = Some(stats))
    }

    pub fn set_pool_balances(&self, generation: u64, balances: Vec<PoolBalance>) -> bool {
        self.apply(generation, |v| v.pool_balances = Some(balances))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_results_are_dropped() {
        let view = ViewState::new();
        let g0 = view.generation();
        assert!(view.set_pairs(g0, Vec::new()));
        let g1 = view.invalidate();
        assert_eq!(view.snapshot().pairs, None);
        assert!(!view.set_pairs(g0, Vec::new()));
        assert_eq!(view.snapshot().pairs, None);
        assert!(view.set_stats(g1, ProtocolStats::default()));
        assert!(view.snapshot().stats.is_some());
    }
}
