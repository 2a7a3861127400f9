use crate::contracts::ContractReader;
use crate::metrics::Metrics;
use crate::quote_cache::QuoteCache;
use alloy_primitives::{Address, B256, U256};
use dex_core::*;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapPreview {
    pub reserve_in: U256,
    pub reserve_out: U256,
    pub quote: SwapQuote,
    pub min_amount_out: U256,
    pub price_impact_bps: u32,
}

pub struct LiquidityTracker<C: ChainReader> {
    contracts: ContractReader<C>,
    registry: Arc<TokenRegistry>,
    fee_bps: u32,
    quotes: QuoteCache,
    metrics: Arc<Metrics>,
}

impl<C: ChainReader> LiquidityTracker<C> {
    pub fn new(
        contracts: ContractReader<C>,
        registry: Arc<TokenRegistry>,
        fee_bps: u32,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            contracts,
            registry,
            fee_bps,
            quotes: QuoteCache::default(),
            metrics,
        }
    }

    pub fn fee_bps(&self) -> u32 {
        self.fee_bps
    }

    /// Every pair the AMM knows about. Pairs whose info read fails are
    /// skipped; only a failing id list is an error.
    pub async fn list_pairs(&self) -> DexResult<Vec<Pair>> {
        let ids = self
            .contracts
            .all_pairs()
            .await
            .map_err(|e| DexError::read_failed("getAllPairs", e))?;
        let infos = join_all(ids.iter().map(|id| self.contracts.pair_info(*id))).await;
        let mut pairs = Vec::with_capacity(ids.len());
        for (id, info) in ids.into_iter().zip(infos) {
            match info {
                Ok(info) => pairs.push(Pair {
                    id,
                    token_a: self.registry.resolve(info.tokenA),
                    token_b: self.registry.resolve(info.tokenB),
                    reserve_a: info.reserveA,
                    reserve_b: info.reserveB,
                    total_liquidity: info.totalLiquidity,
                }),
                Err(err) => {
                    self.metrics.read_failures.inc();
                    warn!(target: "liquidity", pair=%id, error=%err, "pair info read failed");
                }
            }
        }
        debug!(target: "liquidity", count=pairs.len(), "pairs loaded");
        Ok(pairs)
    }

    /// The user's positions with strictly positive liquidity.
    pub async fn list_user_positions(&self, user: Address, pairs: &[Pair]) -> Vec<LiquidityPosition> {
        let reads = join_all(pairs.iter().map(|p| self.contracts.user_liquidity(p.id, user))).await;
        let mut positions = Vec::new();
        for (pair, res) in pairs.iter().zip(reads) {
            match res {
                Ok(pos) if !pos.liquidity.is_zero() => positions.push(LiquidityPosition {
                    pair_id: pair.id,
                    liquidity: pos.liquidity,
                    deposited_a: pos.depositedA,
                    deposited_b: pos.depositedB,
                }),
                Ok(_) => {}
                Err(err) => {
                    self.metrics.read_failures.inc();
                    warn!(target: "liquidity", pair=%pair.label(), error=%err, "position read failed");
                }
            }
        }
        positions
    }

    /// `None` when the pair does not exist (the read reverts).
    pub async fn reserves(&self, token_a: &Token, token_b: &Token) -> Option<(U256, U256)> {
        match self.contracts.reserves(token_a.address, token_b.address).await {
            Ok(r) => Some(r),
            Err(err) => {
                debug!(target: "liquidity", a=%token_a.symbol, b=%token_b.symbol, error=%err, "no reserves for pair");
                None
            }
        }
    }

    pub async fn pair_id(&self, token_a: &Token, token_b: &Token) -> DexResult<B256> {
        self.contracts
            .pair_id(token_a.address, token_b.address)
            .await
            .map_err(|e| DexError::read_failed("getPairId", e))
    }

    /// Amount of token B that keeps the pool ratio for a deposit of `amount_a`.
    pub fn matching_deposit(&self, reserves: (U256, U256), amount_a: U256) -> DexResult<U256> {
        Ok(quote_matching_deposit(reserves.0, reserves.1, amount_a)?)
    }

    pub fn preview_removal(
        &self,
        pair: &Pair,
        position: &LiquidityPosition,
        percent: u8,
    ) -> DexResult<Option<RemovalQuote>> {
        Ok(quote_removal(
            position.liquidity,
            pair.total_liquidity,
            pair.reserve_a,
            pair.reserve_b,
            percent,
        )?)
    }

    pub async fn preview_swap(
        &self,
        token_in: &Token,
        token_out: &Token,
        amount_in: U256,
        slippage_bps: u32,
    ) -> DexResult<SwapPreview> {
        let (reserve_in, reserve_out) = self
            .reserves(token_in, token_out)
            .await
            .ok_or(DexError::Quote(QuoteError::NoLiquidity))?;
        let quote = self
            .quotes
            .quote(reserve_in, reserve_out, amount_in, self.fee_bps)?;
        Ok(SwapPreview {
            reserve_in,
            reserve_out,
            quote,
            min_amount_out: min_amount_out(quote.amount_out, slippage_bps)?,
            price_impact_bps: price_impact_bps(reserve_in, reserve_out, amount_in, quote.amount_out),
        })
    }

    /// The AMM's own `(amount_out, fee)` for comparison with the local quote.
    pub async fn onchain_amount_out(
        &self,
        token_in: &Token,
        token_out: &Token,
        amount_in: U256,
    ) -> DexResult<(U256, U256)> {
        self.contracts
            .amount_out(token_in.address, token_out.address, amount_in)
            .await
            .map_err(|e| DexError::read_failed("getAmountOut", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use crate::wallet::WalletManager;

    fn tracker(chain: &Arc<MockChain>) -> LiquidityTracker<MockChain> {
        LiquidityTracker::new(
            ContractReader::new(chain.clone(), ContractAddresses::rise_testnet()),
            Arc::new(TokenRegistry::rise_testnet()),
            DEFAULT_FEE_BPS,
            metrics(),
        )
    }

    #[tokio::test]
    async fn empty_pair_set_yields_empty_lists() {
        let chain = MockChain::new();
        let t = tracker(&chain);
        let pairs = t.list_pairs().await.unwrap();
        assert!(pairs.is_empty());
        assert!(t.list_user_positions(user(), &pairs).await.is_empty());
    }

    #[tokio::test]
    async fn no_liquidity_anywhere_yields_no_positions() {
        let chain = MockChain::new();
        let id = chain.add_pair(&rise(), &usdc(), 1_000, 2_000);
        chain.add_pair(&usdc(), &usdt(), 500, 500);
        chain.state.lock().liquidity.insert(
            (id, user()),
            (U256::ZERO, U256::from(3u64), U256::from(6u64)),
        );
        let t = tracker(&chain);
        let pairs = t.list_pairs().await.unwrap();
        assert_eq!(pairs.len(), 2);
        assert!(t.list_user_positions(user(), &pairs).await.is_empty());
    }

    #[tokio::test]
    async fn failing_position_read_is_skipped() {
        let chain = MockChain::new();
        let bad = chain.add_pair(&rise(), &usdc(), 1_000, 2_000);
        let good = chain.add_pair(&usdc(), &usdt(), 500, 500);
        {
            let mut st = chain.state.lock();
            st.liquidity.insert(
                (bad, user()),
                (U256::from(10u64), U256::from(10u64), U256::from(20u64)),
            );
            st.liquidity.insert(
                (good, user()),
                (U256::from(7u64), U256::from(7u64), U256::from(7u64)),
            );
            st.failing_positions.insert(bad);
        }
        let t = tracker(&chain);
        let pairs = t.list_pairs().await.unwrap();
        let positions = t.list_user_positions(user(), &pairs).await;
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].pair_id, good);
        assert_eq!(positions[0].liquidity, U256::from(7u64));
    }

    #[tokio::test]
    async fn failing_pair_is_skipped() {
        let chain = MockChain::new();
        chain.add_pair(&rise(), &usdc(), 1_000, 2_000);
        let bad = chain.add_pair(&usdc(), &usdt(), 5, 5);
        chain.state.lock().failing_pairs.insert(bad);
        let pairs = tracker(&chain).list_pairs().await.unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].label(), "RISE/USDC");
    }

    #[tokio::test]
    async fn unknown_tokens_render_as_placeholders() {
        let chain = MockChain::new();
        let stranger = Token::unknown(Address::repeat_byte(0x77));
        chain.add_pair(&stranger, &usdc(), 10, 10);
        let pairs = tracker(&chain).list_pairs().await.unwrap();
        assert_eq!(pairs[0].token_a.glyph, "🪙");
        assert_eq!(pairs[0].token_b.symbol, "USDC");
    }

    #[tokio::test]
    async fn missing_pair_has_no_reserves() {
        let chain = MockChain::new();
        let t = tracker(&chain);
        assert!(t.reserves(&rise(), &usdt()).await.is_none());
        let err = t
            .preview_swap(&rise(), &usdt(), U256::from(1u8), DEFAULT_SLIPPAGE_BPS)
            .await
            .unwrap_err();
        assert_eq!(err, DexError::Quote(QuoteError::NoLiquidity));
    }

    #[tokio::test]
    async fn swap_preview_scenario() {
        let chain = MockChain::new();
        chain.add_pair(&rise(), &usdc(), 1_000_000, 2_000_000);
        let p = tracker(&chain)
            .preview_swap(&rise(), &usdc(), U256::from(10_000u64), DEFAULT_SLIPPAGE_BPS)
            .await
            .unwrap();
        assert_eq!(p.quote.amount_in_after_fee, U256::from(9_970u64));
        assert_eq!(p.quote.amount_out, U256::from(19_742u64));
        assert_eq!(p.min_amount_out, U256::from(19_643u64));
        assert!(p.price_impact_bps > 0);
    }

    #[tokio::test]
    async fn removal_preview_zero_percent_is_noop() {
        let chain = MockChain::new();
        chain.add_pair(&rise(), &usdc(), 1_000, 4_000);
        let t = tracker(&chain);
        let pair = t.list_pairs().await.unwrap().remove(0);
        let pos = LiquidityPosition {
            pair_id: pair.id,
            liquidity: U256::from(500u64),
            deposited_a: U256::ZERO,
            deposited_b: U256::ZERO,
        };
        assert_eq!(t.preview_removal(&pair, &pos, 0).unwrap(), None);
        let q = t.preview_removal(&pair, &pos, 50).unwrap().unwrap();
        assert_eq!(q.liquidity, U256::from(250u64));
        assert_eq!(q.amount_a, U256::from(250u64));
        assert_eq!(q.amount_b, U256::from(1_000u64));
    }

    #[tokio::test]
    async fn add_liquidity_round_trip() {
        let chain = MockChain::new();
        chain.add_pair(&rise(), &usdc(), 1_000, 2_000);
        let wallet = MockWallet::new(chain.clone(), vec![user()], 11_155_931);
        let registry = Arc::new(TokenRegistry::rise_testnet());
        let mgr = WalletManager::new(
            Some(wallet),
            ContractReader::new(chain.clone(), ContractAddresses::rise_testnet()),
            NetworkConfig::rise_testnet(),
            registry,
            metrics(),
        );
        mgr.connect().await.unwrap();
        let t = tracker(&chain);

        let reserves = t.reserves(&rise(), &usdc()).await.unwrap();
        let amount_a = U256::from(500u64);
        let amount_b = t.matching_deposit(reserves, amount_a).unwrap();
        assert_eq!(amount_b, U256::from(1_000u64));

        mgr.add_liquidity(rise().address, usdc().address, amount_a, amount_b)
            .await
            .unwrap();

        let pair = t.list_pairs().await.unwrap().remove(0);
        assert_eq!(pair.reserve_a, U256::from(1_500u64));
        assert_eq!(pair.reserve_b, U256::from(3_000u64));
        let positions = t.list_user_positions(user(), &[pair.clone()]).await;
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].deposited_a, amount_a);
        assert_eq!(positions[0].deposited_b, amount_b);
    }
}
