use crate::abi::{IFeePool, IMiniAMM, IPredictionMarket, IERC20};
use crate::metrics::Metrics;
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use dex_core::*;
use parking_lot::Mutex;
use prometheus::Registry;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;

pub fn metrics() -> Arc<Metrics> {
    Metrics::new(&Registry::new())
}

pub fn user() -> Address {
    Address::repeat_byte(0xaa)
}

pub fn rise() -> Token {
    TokenRegistry::rise_testnet().tokens()[0].clone()
}

pub fn usdc() -> Token {
    TokenRegistry::rise_testnet().tokens()[1].clone()
}

pub fn usdt() -> Token {
    TokenRegistry::rise_testnet().tokens()[2].clone()
}

#[derive(Debug, Clone)]
pub struct MockPair {
    pub id: B256,
    pub token_a: Address,
    pub token_b: Address,
    pub reserve_a: U256,
    pub reserve_b: U256,
    pub total: U256,
}

#[derive(Debug, Clone)]
pub struct MockBet {
    pub user: Address,
    pub token: Address,
    pub amount: U256,
    pub initial_price: U256,
    pub final_price: U256,
    pub start_time: u64,
    pub end_time: u64,
    pub predict_up: bool,
    pub status: u8,
}

#[derive(Default)]
pub struct ChainState {
    pub native: HashMap<Address, U256>,
    pub balances: HashMap<(Address, Address), U256>,
    pub failing_tokens: HashSet<Address>,
    pub fail_native: bool,
    pub pairs: Vec<MockPair>,
    pub fail_pair_list: bool,
    pub failing_pairs: HashSet<B256>,
    pub failing_positions: HashSet<B256>,
    pub liquidity: HashMap<(B256, Address), (U256, U256, U256)>,
    pub bets: BTreeMap<U256, MockBet>,
    pub user_bets: HashMap<Address, Vec<U256>>,
    pub failing_bets: HashSet<U256>,
    pub prices: HashMap<Address, U256>,
    pub pool_balances: Vec<(Address, U256)>,
    pub swap_volume: U256,
    pub fees: U256,
    pub total_bets: U256,
    pub fail_stats: bool,
    pub calls: usize,
}

/// In-memory contract state answering ABI-encoded view calls.
#[derive(Default)]
pub struct MockChain {
    pub state: Mutex<ChainState>,
}

impl MockChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_balance(&self, token: Address, owner: Address, amount: u64) {
        self.state
            .lock()
            .balances
            .insert((token, owner), U256::from(amount));
    }

    pub fn add_pair(&self, a: &Token, b: &Token, reserve_a: u64, reserve_b: u64) -> B256 {
        let mut st = self.state.lock();
        let id = B256::repeat_byte(st.pairs.len() as u8 + 1);
        st.pairs.push(MockPair {
            id,
            token_a: a.address,
            token_b: b.address,
            reserve_a: U256::from(reserve_a),
            reserve_b: U256::from(reserve_b),
            total: U256::from(reserve_a.min(reserve_b)),
        });
        id
    }

    pub fn add_bet(&self, id: u64, bet: MockBet) {
        let mut st = self.state.lock();
        st.user_bets.entry(bet.user).or_default().push(U256::from(id));
        st.bets.insert(U256::from(id), bet);
    }

    pub fn calls(&self) -> usize {
        self.state.lock().calls
    }

    /// Mirrors the AMM's `addLiquidity` effect on reserves and shares.
    pub fn apply_add_liquidity(&self, user: Address, call: IMiniAMM::addLiquidityCall) {
        let mut st = self.state.lock();
        let Some(pair) = st.pairs.iter_mut().find(|p| {
            (p.token_a == call.tokenA && p.token_b == call.tokenB)
                || (p.token_a == call.tokenB && p.token_b == call.tokenA)
        }) else {
            return;
        };
        let (amount_a, amount_b) = if pair.token_a == call.tokenA {
            (call.amountA, call.amountB)
        } else {
            (call.amountB, call.amountA)
        };
        let minted = if pair.total.is_zero() {
            amount_a.min(amount_b)
        } else {
            amount_a * pair.total / pair.reserve_a
        };
        pair.reserve_a += amount_a;
        pair.reserve_b += amount_b;
        pair.total += minted;
        let id = pair.id;
        let entry = st
            .liquidity
            .entry((id, user))
            .or_insert((U256::ZERO, U256::ZERO, U256::ZERO));
        entry.0 += minted;
        entry.1 += amount_a;
        entry.2 += amount_b;
    }

    fn dispatch(&self, to: Address, data: &[u8]) -> Result<Vec<u8>> {
        let mut st = self.state.lock();
        st.calls += 1;
        if data.len() < 4 {
            bail!("short calldata");
        }
        let sel: [u8; 4] = data[..4].try_into()?;
        if sel == IERC20::balanceOfCall::SELECTOR {
            let c = IERC20::balanceOfCall::abi_decode(data, true)?;
            if st.failing_tokens.contains(&to) {
                bail!("balanceOf reverted");
            }
            let bal = st.balances.get(&(to, c.owner)).copied().unwrap_or_default();
            return Ok(IERC20::balanceOfCall::abi_encode_returns(&(bal,)));
        }
        if sel == IERC20::allowanceCall::SELECTOR {
            return Ok(IERC20::allowanceCall::abi_encode_returns(&(U256::ZERO,)));
        }
        if sel == IMiniAMM::getAllPairsCall::SELECTOR {
            if st.fail_pair_list {
                bail!("getAllPairs reverted");
            }
            let ids: Vec<B256> = st.pairs.iter().map(|p| p.id).collect();
            return Ok(IMiniAMM::getAllPairsCall::abi_encode_returns(&(ids,)));
        }
        if sel == IMiniAMM::getPairInfoCall::SELECTOR {
            let c = IMiniAMM::getPairInfoCall::abi_decode(data, true)?;
            if st.failing_pairs.contains(&c.pairId) {
                bail!("getPairInfo reverted");
            }
            let p = st
                .pairs
                .iter()
                .find(|p| p.id == c.pairId)
                .ok_or_else(|| anyhow!("Pair not found"))?;
            return Ok(IMiniAMM::getPairInfoCall::abi_encode_returns(&(
                p.token_a, p.token_b, p.reserve_a, p.reserve_b, p.total,
            )));
        }
        if sel == IMiniAMM::getUserLiquidityCall::SELECTOR {
            let c = IMiniAMM::getUserLiquidityCall::abi_decode(data, true)?;
            if st.failing_positions.contains(&c.pairId) {
                bail!("getUserLiquidity reverted");
            }
            let (l, a, b) = st
                .liquidity
                .get(&(c.pairId, c.user))
                .copied()
                .unwrap_or_default();
            return Ok(IMiniAMM::getUserLiquidityCall::abi_encode_returns(&(l, a, b)));
        }
        if sel == IMiniAMM::getReservesCall::SELECTOR {
            let c = IMiniAMM::getReservesCall::abi_decode(data, true)?;
            let p = st
                .pairs
                .iter()
                .find(|p| {
                    (p.token_a == c.tokenA && p.token_b == c.tokenB)
                        || (p.token_a == c.tokenB && p.token_b == c.tokenA)
                })
                .ok_or_else(|| anyhow!("execution reverted: Pair not found"))?;
            let r = if p.token_a == c.tokenA {
                (p.reserve_a, p.reserve_b)
            } else {
                (p.reserve_b, p.reserve_a)
            };
            return Ok(IMiniAMM::getReservesCall::abi_encode_returns(&r));
        }
        if sel == IMiniAMM::totalSwapVolumeCall::SELECTOR {
            if st.fail_stats {
                bail!("totalSwapVolume reverted");
            }
            return Ok(IMiniAMM::totalSwapVolumeCall::abi_encode_returns(&(st.swap_volume,)));
        }
        if sel == IMiniAMM::totalFeesCollectedCall::SELECTOR {
            return Ok(IMiniAMM::totalFeesCollectedCall::abi_encode_returns(&(st.fees,)));
        }
        if sel == IFeePool::getAllPoolBalancesCall::SELECTOR {
            let tokens: Vec<Address> = st.pool_balances.iter().map(|(t, _)| *t).collect();
            let bals: Vec<U256> = st.pool_balances.iter().map(|(_, b)| *b).collect();
            return Ok(IFeePool::getAllPoolBalancesCall::abi_encode_returns(&(tokens, bals)));
        }
        if sel == IFeePool::getPoolBalanceCall::SELECTOR {
            let c = IFeePool::getPoolBalanceCall::abi_decode(data, true)?;
            let bal = st
                .pool_balances
                .iter()
                .find(|(t, _)| *t == c.token)
                .map(|(_, b)| *b)
                .unwrap_or_default();
            return Ok(IFeePool::getPoolBalanceCall::abi_encode_returns(&(bal,)));
        }
        if sel == IPredictionMarket::getUserBetsCall::SELECTOR {
            let c = IPredictionMarket::getUserBetsCall::abi_decode(data, true)?;
            let ids = st.user_bets.get(&c.user).cloned().unwrap_or_default();
            return Ok(IPredictionMarket::getUserBetsCall::abi_encode_returns(&(ids,)));
        }
        if sel == IPredictionMarket::getBetCall::SELECTOR {
            let c = IPredictionMarket::getBetCall::abi_decode(data, true)?;
            if st.failing_bets.contains(&c.betId) {
                bail!("getBet reverted");
            }
            let b = st
                .bets
                .get(&c.betId)
                .ok_or_else(|| anyhow!("Bet not found"))?;
            return Ok(IPredictionMarket::getBetCall::abi_encode_returns(&(
                b.user,
                b.token,
                b.amount,
                b.initial_price,
                b.final_price,
                U256::from(b.start_time),
                U256::from(b.end_time),
                b.predict_up,
                b.status,
            )));
        }
        if sel == IPredictionMarket::getPriceCall::SELECTOR {
            let c = IPredictionMarket::getPriceCall::abi_decode(data, true)?;
            let price = st
                .prices
                .get(&c.token)
                .copied()
                .ok_or_else(|| anyhow!("Price not set"))?;
            return Ok(IPredictionMarket::getPriceCall::abi_encode_returns(&(
                price,
                U256::from(1u64),
            )));
        }
        if sel == IPredictionMarket::totalBetsCall::SELECTOR {
            return Ok(IPredictionMarket::totalBetsCall::abi_encode_returns(&(st.total_bets,)));
        }
        if sel == IPredictionMarket::totalVolumeCall::SELECTOR {
            return Ok(IPredictionMarket::totalVolumeCall::abi_encode_returns(&(U256::ZERO,)));
        }
        if sel == IPredictionMarket::activeBetsCall::SELECTOR {
            let active = st.bets.values().filter(|b| b.status == 0).count();
            return Ok(IPredictionMarket::activeBetsCall::abi_encode_returns(&(U256::from(
                active,
            ),)));
        }
        bail!("unhandled selector {:?}", sel)
    }
}

#[async_trait]
impl ChainReader for MockChain {
    async fn native_balance(&self, owner: Address) -> Result<U256> {
        let st = self.state.lock();
        if st.fail_native {
            bail!("eth_getBalance failed");
        }
        Ok(st.native.get(&owner).copied().unwrap_or_default())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.dispatch(to, &data).map(Bytes::from)
    }
}

#[derive(Default)]
pub struct WalletState {
    pub accounts: Vec<Address>,
    pub authorized: bool,
    pub chain_id: u64,
    pub known_chains: HashSet<u64>,
    pub reject_accounts: bool,
    pub fail_accounts: bool,
    pub reject_switch: bool,
    pub fail_switch: bool,
    pub reject_tx: bool,
    pub revert_reason: Option<String>,
    pub fail_receipt: bool,
    pub added_chains: Vec<u64>,
    pub sent: Vec<TxRequest>,
}

/// EIP-1193 wallet backed by a [`MockChain`].
pub struct MockWallet {
    pub chain: Arc<MockChain>,
    pub state: Mutex<WalletState>,
}

impl MockWallet {
    pub fn new(chain: Arc<MockChain>, accounts: Vec<Address>, chain_id: u64) -> Arc<Self> {
        let mut known_chains = HashSet::new();
        known_chains.insert(chain_id);
        Arc::new(Self {
            chain,
            state: Mutex::new(WalletState {
                accounts,
                chain_id,
                known_chains,
                ..Default::default()
            }),
        })
    }

    pub fn sent(&self) -> Vec<TxRequest> {
        self.state.lock().sent.clone()
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let mut st = self.state.lock();
        if st.reject_accounts {
            return Err(ProviderError::new(
                ProviderError::USER_REJECTED,
                "User rejected the request.",
            ));
        }
        if st.fail_accounts {
            return Err(ProviderError::new(ProviderError::INTERNAL, "wallet locked"));
        }
        st.authorized = true;
        Ok(st.accounts.clone())
    }

    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let st = self.state.lock();
        Ok(if st.authorized {
            st.accounts.clone()
        } else {
            Vec::new()
        })
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        Ok(self.state.lock().chain_id)
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
        let mut st = self.state.lock();
        if st.reject_switch {
            return Err(ProviderError::new(
                ProviderError::USER_REJECTED,
                "User rejected the request.",
            ));
        }
        if st.fail_switch {
            return Err(ProviderError::new(ProviderError::INTERNAL, "switch failed"));
        }
        if !st.known_chains.contains(&chain_id) {
            return Err(ProviderError::new(
                ProviderError::UNRECOGNIZED_CHAIN,
                "Unrecognized chain ID",
            ));
        }
        st.chain_id = chain_id;
        Ok(())
    }

    async fn add_chain(&self, network: &NetworkConfig) -> Result<(), ProviderError> {
        let mut st = self.state.lock();
        st.known_chains.insert(network.chain_id);
        st.added_chains.push(network.chain_id);
        Ok(())
    }

    async fn send_transaction(&self, tx: TxRequest) -> Result<B256, ProviderError> {
        let n = {
            let mut st = self.state.lock();
            if st.reject_tx {
                return Err(ProviderError::new(
                    ProviderError::USER_REJECTED,
                    "User denied transaction signature.",
                ));
            }
            if let Some(reason) = &st.revert_reason {
                return Err(ProviderError::new(
                    3,
                    format!("execution reverted: {}", reason),
                ));
            }
            st.sent.push(tx.clone());
            st.sent.len()
        };
        if tx.data.len() >= 4 && tx.data[..4] == IMiniAMM::addLiquidityCall::SELECTOR {
            if let Ok(call) = IMiniAMM::addLiquidityCall::abi_decode(&tx.data, true) {
                self.chain.apply_add_liquidity(tx.from, call);
            }
        }
        Ok(B256::repeat_byte(n as u8))
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxReceipt, ProviderError> {
        let status = !self.state.lock().fail_receipt;
        Ok(TxReceipt {
            transaction_hash: tx_hash,
            block_number: Some(1),
            status,
            gas_used: Some(U256::from(21_000u64)),
        })
    }
}

#[derive(Default)]
pub struct MockEvents {
    pub queue: Mutex<VecDeque<ProviderEvent>>,
}

#[async_trait]
impl ProviderEvents for MockEvents {
    async fn next(&self) -> Result<Option<ProviderEvent>> {
        Ok(self.queue.lock().pop_front())
    }
}
