use crate::contracts::ContractReader;
use crate::metrics::Metrics;
use crate::operations::Operation;
use crate::rpc;
use alloy_primitives::{Address, U256};
use dex_core::*;
use futures::future::join_all;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of one balance refresh pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub updated: Vec<String>,
    pub failed: Vec<String>,
    /// The session's address changed while reads were in flight.
    pub discarded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountChange {
    Disconnected,
    Switched(Address),
    Unchanged,
    Ignored,
}

/// Sole owner and writer of the [`WalletSession`].
pub struct WalletManager<P: WalletProvider, C: ChainReader> {
    provider: Option<Arc<P>>,
    contracts: ContractReader<C>,
    network: NetworkConfig,
    registry: Arc<TokenRegistry>,
    session: RwLock<WalletSession>,
    state: RwLock<ConnectionState>,
    metrics: Arc<Metrics>,
}

impl<P: WalletProvider, C: ChainReader> WalletManager<P, C> {
    pub fn new(
        provider: Option<Arc<P>>,
        contracts: ContractReader<C>,
        network: NetworkConfig,
        registry: Arc<TokenRegistry>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            provider,
            contracts,
            network,
            registry,
            session: RwLock::new(WalletSession::default()),
            state: RwLock::new(ConnectionState::Disconnected),
            metrics,
        }
    }

    pub fn session(&self) -> WalletSession {
        self.session.read().clone()
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn contracts(&self) -> &ContractReader<C> {
        &self.contracts
    }

    /// `Some(actual)` when connected to a chain other than the configured one.
    pub fn chain_mismatch(&self) -> Option<u64> {
        let s = self.session.read();
        match s.chain_id {
            Some(id) if s.is_connected && id != self.network.chain_id => Some(id),
            _ => None,
        }
    }

    pub async fn connect(&self) -> DexResult<WalletSession> {
        let provider = self
            .provider
            .clone()
            .ok_or(DexError::WalletUnavailable)?;
        let previous = self.state();
        *self.state.write() = ConnectionState::Connecting;
        info!(target: "wallet", "requesting wallet access");
        match self.authorize(&provider).await {
            Ok(address) => {
                *self.session.write() = WalletSession::connected(address, self.network.chain_id);
                *self.state.write() = ConnectionState::Connected;
                info!(target: "wallet", address=%address, chain_id=self.network.chain_id, "wallet connected");
                self.refresh_balances().await;
                Ok(self.session())
            }
            Err(err) => {
                let restored = match previous {
                    ConnectionState::Connecting => ConnectionState::Disconnected,
                    other => other,
                };
                *self.state.write() = restored;
                warn!(target: "wallet", error=%err, "wallet connection failed");
                Err(err)
            }
        }
    }

    async fn authorize(&self, provider: &P) -> DexResult<Address> {
        let accounts = provider.request_accounts().await.map_err(access_error)?;
        let address = *accounts.first().ok_or(DexError::UserRejected)?;
        let chain_id = provider
            .chain_id()
            .await
            .map_err(|e| DexError::NetworkSwitchFailed(e.message))?;
        if chain_id != self.network.chain_id {
            info!(target: "wallet", current=chain_id, wanted=self.network.chain_id, "switching wallet network");
            self.ensure_network(provider).await?;
        }
        Ok(address)
    }

    async fn ensure_network(&self, provider: &P) -> DexResult<()> {
        let wanted = self.network.chain_id;
        match provider.switch_chain(wanted).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_unrecognized_chain() => {
                info!(target: "wallet", chain=%self.network.name, "adding network to wallet");
                provider
                    .add_chain(&self.network)
                    .await
                    .map_err(switch_error)?;
                provider.switch_chain(wanted).await.map_err(switch_error)
            }
            Err(e) => Err(switch_error(e)),
        }
    }

    /// Re-attaches to an account the wallet has already authorized, without
    /// prompting.
    pub async fn restore(&self) -> DexResult<Option<WalletSession>> {
        let Some(provider) = self.provider.clone() else {
            return Ok(None);
        };
        let accounts = provider
            .accounts()
            .await
            .map_err(|e| DexError::Provider(e.to_string()))?;
        let Some(address) = accounts.first().copied() else {
            debug!(target: "wallet", "no authorized account to restore");
            return Ok(None);
        };
        let chain_id = provider
            .chain_id()
            .await
            .map_err(|e| DexError::Provider(e.to_string()))?;
        *self.session.write() = WalletSession::connected(address, chain_id);
        *self.state.write() = ConnectionState::Connected;
        info!(target: "wallet", address=%address, chain_id=chain_id, "wallet session restored");
        self.refresh_balances().await;
        Ok(Some(self.session()))
    }

    pub fn disconnect(&self) {
        *self.session.write() = WalletSession::default();
        *self.state.write() = ConnectionState::Disconnected;
        info!(target: "wallet", "wallet disconnected");
    }

    /// Reads the native balance and every registered token balance
    /// concurrently. A failed read keeps that entry's previous value.
    pub async fn refresh_balances(&self) -> RefreshReport {
        let Some(owner) = self.session.read().address else {
            return RefreshReport::default();
        };
        self.metrics.balance_refreshes.inc();
        let native = self.contracts.native_balance(owner);
        let tokens = join_all(self.registry.tokens().iter().map(|t| async move {
            (t, self.contracts.token_balance(t.address, owner).await)
        }));
        let (native, tokens) = tokio::join!(native, tokens);

        let mut report = RefreshReport::default();
        let mut session = self.session.write();
        if session.address != Some(owner) {
            debug!(target: "wallet", owner=%owner, "discarding balances for a previous account");
            report.discarded = true;
            return report;
        }
        let mut next = session.balances.clone();
        match native {
            Ok(v) => {
                next.native = v;
                report.updated.push(self.network.native_currency.symbol.clone());
            }
            Err(err) => {
                self.metrics.read_failures.inc();
                warn!(target: "wallet", error=%err, "native balance read failed");
                report.failed.push(self.network.native_currency.symbol.clone());
            }
        }
        for (token, res) in tokens {
            match res {
                Ok(v) => {
                    next.tokens.insert(token.address, v);
                    report.updated.push(token.symbol.clone());
                }
                Err(err) => {
                    self.metrics.read_failures.inc();
                    warn!(target: "wallet", token=%token.symbol, error=%err, "token balance read failed");
                    report.failed.push(token.symbol.clone());
                }
            }
        }
        session.balances = next;
        report
    }

    pub async fn submit(&self, op: Operation) -> DexResult<TxReceipt> {
        let provider = self
            .provider
            .clone()
            .ok_or(DexError::WalletUnavailable)?;
        let from = {
            let s = self.session.read();
            match s.address {
                Some(a) if s.is_connected => a,
                _ => return Err(DexError::NotConnected),
            }
        };
        if let Some(actual) = self.chain_mismatch() {
            return Err(DexError::NetworkMismatch {
                expected: self.network.chain_id,
                actual,
            });
        }
        let tx = TxRequest {
            from,
            to: op.target(self.contracts.addresses()),
            data: op.calldata(),
            value: U256::ZERO,
        };
        self.metrics.tx_submitted.inc();
        self.metrics.inflight_tx.inc();
        let result = send_and_confirm(provider.as_ref(), tx).await;
        self.metrics.inflight_tx.dec();
        match result {
            Ok(receipt) => {
                self.metrics.tx_confirmed.inc();
                info!(target: "wallet", op=op.name(), tx=%receipt.transaction_hash, block=?receipt.block_number, "transaction confirmed");
                self.refresh_balances().await;
                Ok(receipt)
            }
            Err(err) => {
                self.metrics.tx_failed.inc();
                if err.is_benign() {
                    info!(target: "wallet", op=op.name(), error=%err, "transaction skipped");
                } else {
                    warn!(target: "wallet", op=op.name(), error=%err, "transaction failed");
                }
                Err(err)
            }
        }
    }

    pub async fn approve(&self, token: Address, spender: Address, amount: U256) -> DexResult<TxReceipt> {
        self.submit(Operation::Approve {
            token,
            spender,
            amount,
        })
        .await
    }

    /// Exact-amount approval for the AMM, then the swap.
    pub async fn swap(&self, token_in: Address, token_out: Address, amount_in: U256) -> DexResult<TxReceipt> {
        if amount_in.is_zero() {
            return Err(DexError::InvalidAmount("swap amount must be positive".into()));
        }
        let amm = self.contracts.addresses().amm;
        self.approve(token_in, amm, amount_in).await?;
        self.submit(Operation::Swap {
            token_in,
            token_out,
            amount_in,
        })
        .await
    }

    pub async fn add_liquidity(
        &self,
        token_a: Address,
        token_b: Address,
        amount_a: U256,
        amount_b: U256,
    ) -> DexResult<TxReceipt> {
        if amount_a.is_zero() || amount_b.is_zero() {
            return Err(DexError::InvalidAmount("both deposit amounts must be positive".into()));
        }
        let amm = self.contracts.addresses().amm;
        self.approve(token_a, amm, amount_a).await?;
        self.approve(token_b, amm, amount_b).await?;
        self.submit(Operation::AddLiquidity {
            token_a,
            token_b,
            amount_a,
            amount_b,
        })
        .await
    }

    pub async fn remove_liquidity(&self, token_a: Address, token_b: Address, liquidity: U256) -> DexResult<TxReceipt> {
        if liquidity.is_zero() {
            return Err(DexError::InvalidAmount("nothing to remove".into()));
        }
        self.submit(Operation::RemoveLiquidity {
            token_a,
            token_b,
            liquidity,
        })
        .await
    }

    pub async fn place_bet(
        &self,
        token: Address,
        amount: U256,
        predict_up: bool,
        duration_secs: u64,
    ) -> DexResult<TxReceipt> {
        if amount.is_zero() {
            return Err(DexError::InvalidAmount("bet amount must be positive".into()));
        }
        let market = self.contracts.addresses().prediction_market;
        self.approve(token, market, amount).await?;
        self.submit(Operation::PlaceBet {
            token,
            amount,
            predict_up,
            duration_secs,
        })
        .await
    }

    pub async fn resolve_bet(&self, bet_id: U256) -> DexResult<TxReceipt> {
        self.submit(Operation::ResolveBet { bet_id }).await
    }

    pub async fn cancel_bet(&self, bet_id: U256) -> DexResult<TxReceipt> {
        self.submit(Operation::CancelBet { bet_id }).await
    }

    pub async fn on_accounts_changed(&self, accounts: &[Address]) -> AccountChange {
        let Some(&next) = accounts.first() else {
            self.disconnect();
            return AccountChange::Disconnected;
        };
        {
            let mut s = self.session.write();
            if !s.is_connected {
                return AccountChange::Ignored;
            }
            if s.address == Some(next) {
                return AccountChange::Unchanged;
            }
            s.address = Some(next);
            s.balances = Balances::default();
        }
        info!(target: "wallet", address=%next, "wallet account changed");
        self.refresh_balances().await;
        AccountChange::Switched(next)
    }

    /// Records the new chain and drops balances read on the old one. Callers
    /// must treat every derived view as stale afterwards.
    pub async fn on_chain_changed(&self, chain_id: u64) {
        {
            let mut s = self.session.write();
            if !s.is_connected {
                return;
            }
            s.chain_id = Some(chain_id);
            s.balances = Balances::default();
        }
        info!(target: "wallet", chain_id=chain_id, "wallet network changed");
        self.refresh_balances().await;
    }
}

async fn send_and_confirm<P: WalletProvider + ?Sized>(provider: &P, tx: TxRequest) -> DexResult<TxReceipt> {
    let hash = provider.send_transaction(tx).await.map_err(tx_error)?;
    debug!(target: "wallet", tx=%hash, "transaction sent");
    let receipt = provider.wait_for_receipt(hash).await.map_err(tx_error)?;
    if !receipt.status {
        return Err(DexError::TransactionReverted { reason: None });
    }
    Ok(receipt)
}

fn access_error(e: ProviderError) -> DexError {
    if e.is_user_rejected() {
        DexError::UserRejected
    } else {
        DexError::NetworkSwitchFailed(e.message)
    }
}

fn switch_error(e: ProviderError) -> DexError {
    if e.is_user_rejected() {
        DexError::UserRejected
    } else {
        DexError::NetworkSwitchFailed(e.message)
    }
}

fn tx_error(e: ProviderError) -> DexError {
    if e.is_user_rejected() {
        DexError::TransactionRejected
    } else if rpc::is_revert(&e) {
        DexError::TransactionReverted {
            reason: rpc::revert_reason(&e),
        }
    } else {
        DexError::Provider(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::{IMiniAMM, IERC20};
    use crate::test_utils::*;
    use alloy_sol_types::SolCall;

    const RISE_CHAIN: u64 = 11_155_931;

    fn manager(
        chain: &Arc<MockChain>,
        wallet: Option<Arc<MockWallet>>,
    ) -> WalletManager<MockWallet, MockChain> {
        WalletManager::new(
            wallet,
            ContractReader::new(chain.clone(), ContractAddresses::rise_testnet()),
            NetworkConfig::rise_testnet(),
            Arc::new(TokenRegistry::rise_testnet()),
            metrics(),
        )
    }

    #[tokio::test]
    async fn connect_without_provider_fails_cleanly() {
        let chain = MockChain::new();
        let mgr = manager(&chain, None);
        assert_eq!(mgr.connect().await, Err(DexError::WalletUnavailable));
        assert_eq!(mgr.session(), WalletSession::default());
        assert_eq!(mgr.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn connect_populates_session_and_balances() {
        let chain = MockChain::new();
        chain.set_balance(usdc().address, user(), 5_000_000);
        chain.state.lock().native.insert(user(), U256::from(7u64));
        let wallet = MockWallet::new(chain.clone(), vec![user()], RISE_CHAIN);
        let mgr = manager(&chain, Some(wallet));

        let s = mgr.connect().await.unwrap();
        assert!(s.is_connected);
        assert_eq!(s.address, Some(user()));
        assert_eq!(s.chain_id, Some(RISE_CHAIN));
        assert_eq!(s.balances.native, U256::from(7u64));
        assert_eq!(s.balances.token(&usdc().address), U256::from(5_000_000u64));
        assert_eq!(mgr.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn connect_adds_unknown_network_then_switches() {
        let chain = MockChain::new();
        let wallet = MockWallet::new(chain.clone(), vec![user()], 1);
        let mgr = manager(&chain, Some(wallet.clone()));

        mgr.connect().await.unwrap();
        let st = wallet.state.lock();
        assert_eq!(st.added_chains, vec![RISE_CHAIN]);
        assert_eq!(st.chain_id, RISE_CHAIN);
    }

    #[tokio::test]
    async fn connect_rejections_leave_session_untouched() {
        let chain = MockChain::new();
        let wallet = MockWallet::new(chain.clone(), vec![user()], 1);
        wallet.state.lock().reject_switch = true;
        let mgr = manager(&chain, Some(wallet.clone()));
        assert_eq!(mgr.connect().await, Err(DexError::UserRejected));
        assert_eq!(mgr.session(), WalletSession::default());
        assert_eq!(mgr.state(), ConnectionState::Disconnected);

        {
            let mut st = wallet.state.lock();
            st.reject_switch = false;
            st.fail_switch = true;
        }
        assert!(matches!(
            mgr.connect().await,
            Err(DexError::NetworkSwitchFailed(_))
        ));

        wallet.state.lock().reject_accounts = true;
        assert_eq!(mgr.connect().await, Err(DexError::UserRejected));
        assert!(!mgr.session().is_connected);
    }

    #[tokio::test]
    async fn failed_account_request_is_a_connect_failure() {
        let chain = MockChain::new();
        let wallet = MockWallet::new(chain.clone(), vec![user()], RISE_CHAIN);
        wallet.state.lock().fail_accounts = true;
        let mgr = manager(&chain, Some(wallet));
        assert_eq!(
            mgr.connect().await,
            Err(DexError::NetworkSwitchFailed("wallet locked".into()))
        );
        assert_eq!(mgr.session(), WalletSession::default());
        assert_eq!(mgr.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn partial_refresh_keeps_previous_value() {
        let chain = MockChain::new();
        chain.set_balance(rise().address, user(), 100);
        chain.set_balance(usdc().address, user(), 200);
        chain.set_balance(usdt().address, user(), 300);
        let wallet = MockWallet::new(chain.clone(), vec![user()], RISE_CHAIN);
        let mgr = manager(&chain, Some(wallet));
        mgr.connect().await.unwrap();

        chain.set_balance(rise().address, user(), 111);
        chain.set_balance(usdc().address, user(), 222);
        chain.set_balance(usdt().address, user(), 333);
        chain.state.lock().failing_tokens.insert(usdc().address);

        let report = mgr.refresh_balances().await;
        assert_eq!(report.failed, vec!["USDC".to_string()]);
        let b = mgr.session().balances;
        assert_eq!(b.token(&rise().address), U256::from(111u64));
        assert_eq!(b.token(&usdc().address), U256::from(200u64));
        assert_eq!(b.token(&usdt().address), U256::from(333u64));
    }

    #[tokio::test]
    async fn failed_native_read_keeps_native_balance() {
        let chain = MockChain::new();
        chain.state.lock().native.insert(user(), U256::from(5u64));
        chain.set_balance(rise().address, user(), 10);
        let wallet = MockWallet::new(chain.clone(), vec![user()], RISE_CHAIN);
        let mgr = manager(&chain, Some(wallet));
        mgr.connect().await.unwrap();

        {
            let mut st = chain.state.lock();
            st.fail_native = true;
            st.native.insert(user(), U256::from(9u64));
        }
        chain.set_balance(rise().address, user(), 20);

        let report = mgr.refresh_balances().await;
        assert_eq!(report.failed, vec!["ETH".to_string()]);
        assert!(report.updated.contains(&"RISE".to_string()));
        let b = mgr.session().balances;
        assert_eq!(b.native, U256::from(5u64));
        assert_eq!(b.token(&rise().address), U256::from(20u64));
    }

    #[tokio::test]
    async fn swap_approves_exact_amount_first() {
        let chain = MockChain::new();
        let wallet = MockWallet::new(chain.clone(), vec![user()], RISE_CHAIN);
        let mgr = manager(&chain, Some(wallet.clone()));
        mgr.connect().await.unwrap();

        let amount = U256::from(10_000u64);
        mgr.swap(rise().address, usdc().address, amount).await.unwrap();

        let sent = wallet.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, rise().address);
        let approve = IERC20::approveCall::abi_decode(&sent[0].data, true).unwrap();
        assert_eq!(approve.amount, amount);
        assert_eq!(approve.spender, ContractAddresses::rise_testnet().amm);
        let swap = IMiniAMM::swapCall::abi_decode(&sent[1].data, true).unwrap();
        assert_eq!(swap.amountIn, amount);
    }

    #[tokio::test]
    async fn rejected_approval_stops_the_flow() {
        let chain = MockChain::new();
        let wallet = MockWallet::new(chain.clone(), vec![user()], RISE_CHAIN);
        let mgr = manager(&chain, Some(wallet.clone()));
        mgr.connect().await.unwrap();
        let before = mgr.session();

        wallet.state.lock().reject_tx = true;
        let res = mgr.swap(rise().address, usdc().address, U256::from(5u64)).await;
        assert_eq!(res, Err(DexError::TransactionRejected));
        assert!(wallet.sent().is_empty());
        assert_eq!(mgr.session(), before);
    }

    #[tokio::test]
    async fn reverts_carry_reason() {
        let chain = MockChain::new();
        let wallet = MockWallet::new(chain.clone(), vec![user()], RISE_CHAIN);
        let mgr = manager(&chain, Some(wallet.clone()));
        mgr.connect().await.unwrap();

        wallet.state.lock().revert_reason = Some("Pair exists".into());
        let err = mgr
            .submit(Operation::CreatePair {
                token_a: rise().address,
                token_b: usdc().address,
            })
            .await
            .unwrap_err();
        assert!(err.is_benign());

        {
            let mut st = wallet.state.lock();
            st.revert_reason = None;
            st.fail_receipt = true;
        }
        let err = mgr.resolve_bet(U256::from(1u64)).await.unwrap_err();
        assert_eq!(err, DexError::TransactionReverted { reason: None });
    }

    #[tokio::test]
    async fn submit_requires_connection() {
        let chain = MockChain::new();
        let wallet = MockWallet::new(chain.clone(), vec![user()], RISE_CHAIN);
        let mgr = manager(&chain, Some(wallet));
        let res = mgr.cancel_bet(U256::from(1u64)).await;
        assert_eq!(res, Err(DexError::NotConnected));
    }

    #[tokio::test]
    async fn account_change_reconciles_session() {
        let chain = MockChain::new();
        let other = Address::repeat_byte(0xbb);
        chain.set_balance(usdt().address, other, 42);
        let wallet = MockWallet::new(chain.clone(), vec![user()], RISE_CHAIN);
        let mgr = manager(&chain, Some(wallet));
        mgr.connect().await.unwrap();

        assert_eq!(mgr.on_accounts_changed(&[user()]).await, AccountChange::Unchanged);
        assert_eq!(
            mgr.on_accounts_changed(&[other]).await,
            AccountChange::Switched(other)
        );
        assert_eq!(mgr.session().balances.token(&usdt().address), U256::from(42u64));

        assert_eq!(mgr.on_accounts_changed(&[]).await, AccountChange::Disconnected);
        assert_eq!(mgr.session(), WalletSession::default());
        assert_eq!(mgr.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn chain_change_flags_mismatch_and_blocks_writes() {
        let chain = MockChain::new();
        let wallet = MockWallet::new(chain.clone(), vec![user()], RISE_CHAIN);
        let mgr = manager(&chain, Some(wallet));
        mgr.connect().await.unwrap();

        mgr.on_chain_changed(1).await;
        assert_eq!(mgr.chain_mismatch(), Some(1));
        assert_eq!(
            mgr.resolve_bet(U256::from(1u64)).await,
            Err(DexError::NetworkMismatch {
                expected: RISE_CHAIN,
                actual: 1
            })
        );
    }

    #[tokio::test]
    async fn restore_uses_authorized_account() {
        let chain = MockChain::new();
        let wallet = MockWallet::new(chain.clone(), vec![user()], RISE_CHAIN);
        let mgr = manager(&chain, Some(wallet.clone()));
        assert_eq!(mgr.restore().await, Ok(None));

        wallet.state.lock().authorized = true;
        let s = mgr.restore().await.unwrap().unwrap();
        assert_eq!(s.address, Some(user()));
        assert_eq!(mgr.state(), ConnectionState::Connected);
    }
}
