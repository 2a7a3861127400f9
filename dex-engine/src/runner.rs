use crate::{
    config::EngineConfig,
    contracts::ContractReader,
    liquidity::LiquidityTracker,
    metrics::Metrics,
    prediction::PredictionTracker,
    stats,
    view::ViewState,
    wallet::{AccountChange, WalletManager},
};
use anyhow::Result;
use dex_core::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

/// Owns the session, both trackers and the derived view, and keeps them
/// consistent with wallet-side account and network changes.
pub struct SessionRunner<P, C, E>
where
    P: WalletProvider + 'static,
    C: ChainReader + 'static,
    E: ProviderEvents + 'static,
{
    wallet: Arc<WalletManager<P, C>>,
    liquidity: Arc<LiquidityTracker<C>>,
    prediction: Arc<PredictionTracker<C>>,
    contracts: ContractReader<C>,
    registry: Arc<TokenRegistry>,
    view: Arc<ViewState>,
    events: Arc<E>,
    metrics: Arc<Metrics>,
}

impl<P, C, E> SessionRunner<P, C, E>
where
    P: WalletProvider + 'static,
    C: ChainReader + 'static,
    E: ProviderEvents + 'static,
{
    pub fn new(
        cfg: &EngineConfig,
        provider: Option<Arc<P>>,
        chain: Arc<C>,
        events: Arc<E>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let registry = Arc::new(cfg.registry());
        let contracts = ContractReader::new(chain, cfg.contracts);
        let wallet = Arc::new(WalletManager::new(
            provider,
            contracts.clone(),
            cfg.network.clone(),
            registry.clone(),
            metrics.clone(),
        ));
        let liquidity = Arc::new(LiquidityTracker::new(
            contracts.clone(),
            registry.clone(),
            cfg.fee_bps,
            metrics.clone(),
        ));
        let prediction = Arc::new(PredictionTracker::new(
            contracts.clone(),
            registry.clone(),
            metrics.clone(),
        ));
        Self {
            wallet,
            liquidity,
            prediction,
            contracts,
            registry,
            view: Arc::new(ViewState::new()),
            events,
            metrics,
        }
    }

    pub fn wallet(&self) -> &Arc<WalletManager<P, C>> {
        &self.wallet
    }

    pub fn liquidity(&self) -> &Arc<LiquidityTracker<C>> {
        &self.liquidity
    }

    pub fn prediction(&self) -> &Arc<PredictionTracker<C>> {
        &self.prediction
    }

    pub fn contracts(&self) -> &ContractReader<C> {
        &self.contracts
    }

    pub fn registry(&self) -> &Arc<TokenRegistry> {
        &self.registry
    }

    pub fn view(&self) -> &Arc<ViewState> {
        &self.view
    }

    /// Re-fetches everything the view shows.
    pub async fn reload(&self) {
        self.metrics.view_reloads.inc();
        let generation = self.view.generation();
        let (pairs, protocol, pools) = tokio::join!(
            self.liquidity.list_pairs(),
            stats::protocol_stats(&self.contracts),
            stats::pool_balances(&self.contracts, &self.registry),
        );
        self.view.set_stats(generation, protocol);
        match pools {
            Ok(p) => {
                self.view.set_pool_balances(generation, p);
            }
            Err(err) => warn!(target: "runner", error=%err, "pool balances unavailable"),
        }
        match pairs {
            Ok(p) => {
                self.view.set_pairs(generation, p);
            }
            Err(err) => warn!(target: "runner", error=%err, "pair list unavailable"),
        }
        self.reload_user(generation).await;
        debug!(target: "runner", generation=generation, "view reloaded");
    }

    /// Re-fetches the connected account's positions and bets.
    pub async fn reload_user(&self, generation: u64) {
        let session = self.wallet.session();
        let Some(user) = session.address.filter(|_| session.is_connected) else {
            return;
        };
        let pairs = self.view.snapshot().pairs;
        let positions = async {
            match &pairs {
                Some(pairs) => Some(self.liquidity.list_user_positions(user, pairs).await),
                None => None,
            }
        };
        let (positions, bets) = tokio::join!(positions, self.prediction.list_user_bets(user));
        match positions {
            Some(p) => {
                self.view.set_positions(generation, p);
            }
            None => debug!(target: "runner", "pair list unknown, positions left unset"),
        }
        match bets {
            Ok(b) => {
                self.view.set_bets(generation, b);
            }
            Err(err) => warn!(target: "runner", error=%err, "bets unavailable"),
        }
    }

    pub async fn handle_event(&self, ev: ProviderEvent) {
        self.metrics.provider_events.inc();
        match ev {
            ProviderEvent::AccountsChanged(accounts) => {
                match self.wallet.on_accounts_changed(&accounts).await {
                    AccountChange::Switched(_) => {
                        self.view.clear_user();
                        self.reload_user(self.view.generation()).await;
                    }
                    AccountChange::Disconnected => self.view.clear_user(),
                    AccountChange::Unchanged | AccountChange::Ignored => {}
                }
            }
            ProviderEvent::ChainChanged(chain_id) => {
                self.wallet.on_chain_changed(chain_id).await;
                let generation = self.view.invalidate();
                info!(target: "runner", chain_id=chain_id, generation=generation, "network changed, reloading view");
                self.reload().await;
            }
        }
    }

    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(target: "runner", "session runner starting");
        self.reload().await;
        let (ev_tx, mut ev_rx) = mpsc::channel::<ProviderEvent>(64);

        let events = self.events.clone();
        let h_events: JoinHandle<()> = tokio::spawn(async move {
            debug!(target: "runner", "provider event loop started");
            loop {
                match events.next().await {
                    Ok(Some(ev)) => {
                        if ev_tx.send(ev).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => tokio::time::sleep(Duration::from_millis(50)).await,
                    Err(err) => {
                        warn!(target: "runner", error=%err, "provider event poll failed");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        let mut stats_iv = tokio::time::interval(Duration::from_secs(60));
        stats_iv.tick().await;
        loop {
            tokio::select! {
                Some(ev) = ev_rx.recv() => {
                    self.handle_event(ev).await;
                }
                _ = stats_iv.tick() => {
                    let v = self.view.snapshot();
                    let s = self.wallet.session();
                    info!(
                        target: "runner",
                        connected = s.is_connected,
                        pairs = v.pairs.as_ref().map(|p| p.len()).unwrap_or(0),
                        positions = v.positions.as_ref().map(|p| p.len()).unwrap_or(0),
                        active_bets = v.bets.as_ref().map(|b| b.active.len()).unwrap_or(0),
                        "session stats"
                    );
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        h_events.abort();
        info!(target: "runner", "session runner stopped");
        Ok(())
    }
}
