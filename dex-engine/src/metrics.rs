use prometheus::{IntCounter, IntGauge, Opts, Registry};
use std::sync::Arc;

#[derive(Clone)]
pub struct Metrics {
    pub tx_submitted: IntCounter,
    pub tx_confirmed: IntCounter,
    pub tx_failed: IntCounter,
    pub inflight_tx: IntGauge,
    pub balance_refreshes: IntCounter,
    pub read_failures: IntCounter,
    pub provider_events: IntCounter,
    pub view_reloads: IntCounter,
}

impl Metrics {
    pub fn new(registry: &Registry) -> Arc<Self> {
        let tx_submitted =
            IntCounter::with_opts(Opts::new("tx_submitted", "Transactions submitted")).unwrap();
        let tx_confirmed =
            IntCounter::with_opts(Opts::new("tx_confirmed", "Transactions confirmed")).unwrap();
        let tx_failed = IntCounter::with_opts(Opts::new(
            "tx_failed",
            "Transactions rejected, reverted or lost",
        ))
        .unwrap();
        let inflight_tx =
            IntGauge::with_opts(Opts::new("inflight_tx", "Transactions awaiting receipt")).unwrap();
        let balance_refreshes =
            IntCounter::with_opts(Opts::new("balance_refreshes", "Balance refresh passes"))
                .unwrap();
        let read_failures =
            IntCounter::with_opts(Opts::new("read_failures", "Failed contract reads")).unwrap();
        let provider_events =
            IntCounter::with_opts(Opts::new("provider_events", "Wallet provider events"))
                .unwrap();
        let view_reloads =
            IntCounter::with_opts(Opts::new("view_reloads", "Full view reloads")).unwrap();
        registry.register(Box::new(tx_submitted.clone())).ok();
        registry.register(Box::new(tx_confirmed.clone())).ok();
        registry.register(Box::new(tx_failed.clone())).ok();
        registry.register(Box::new(inflight_tx.clone())).ok();
        registry.register(Box::new(balance_refreshes.clone())).ok();
        registry.register(Box::new(read_failures.clone())).ok();
        registry.register(Box::new(provider_events.clone())).ok();
        registry.register(Box::new(view_reloads.clone())).ok();
        Arc::new(Self {
            tx_submitted,
            tx_confirmed,
            tx_failed,
            inflight_tx,
            balance_refreshes,
            read_failures,
            provider_events,
            view_reloads,
        })
    }
}
