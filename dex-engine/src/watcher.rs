use alloy_primitives::Address;
use anyhow::Result;
use async_trait::async_trait;
use dex_core::{ProviderEvent, ProviderEvents, WalletProvider};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct Seen {
    accounts: Option<Vec<Address>>,
    chain_id: Option<u64>,
    pending: VecDeque<ProviderEvent>,
}

/// Turns periodic `eth_accounts` / `eth_chainId` reads into change events.
/// The first poll only records a baseline.
pub struct PollingWatcher<P: WalletProvider> {
    provider: Arc<P>,
    interval: Duration,
    seen: Mutex<Seen>,
}

impl<P: WalletProvider> PollingWatcher<P> {
    pub fn new(provider: Arc<P>, interval: Duration) -> Self {
        Self {
            provider,
            interval,
            seen: Mutex::new(Seen::default()),
        }
    }

    pub async fn poll(&self) -> Result<()> {
        let accounts = self.provider.accounts().await?;
        let chain_id = self.provider.chain_id().await?;
        let mut guard = self.seen.lock();
        let seen = &mut *guard;
        if let Some(prev) = seen.chain_id {
            if prev != chain_id {
                seen.pending.push_back(ProviderEvent::ChainChanged(chain_id));
            }
        }
        if let Some(prev) = &seen.accounts {
            if prev != &accounts {
                seen.pending
                    .push_back(ProviderEvent::AccountsChanged(accounts.clone()));
            }
        }
        seen.chain_id = Some(chain_id);
        seen.accounts = Some(accounts);
        Ok(())
    }
}

#[async_trait]
impl<P: WalletProvider> ProviderEvents for PollingWatcher<P> {
    async fn next(&self) -> Result<Option<ProviderEvent>> {
        let queued = self.seen.lock().pending.pop_front();
        if queued.is_some() {
            return Ok(queued);
        }
        tokio::time::sleep(self.interval).await;
        self.poll().await?;
        let next = self.seen.lock().pending.pop_front();
        Ok(next)
    }
}
