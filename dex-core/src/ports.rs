use crate::{error::ProviderError, model::*, registry::NetworkConfig};
use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;

/// EIP-1193 style wallet: account access, network management and signing.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Prompts for account access (`eth_requestAccounts`).
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;
    /// Already-authorized accounts, no prompt (`eth_accounts`).
    async fn accounts(&self) -> Result<Vec<Address>, ProviderError>;
    async fn chain_id(&self) -> Result<u64, ProviderError>;
    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError>;
    async fn add_chain(&self, network: &NetworkConfig) -> Result<(), ProviderError>;
    async fn send_transaction(&self, tx: TxRequest) -> Result<B256, ProviderError>;
    /// Resolves once the transaction is mined.
    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxReceipt, ProviderError>;
}

/// Read access to chain state.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn native_balance(&self, owner: Address) -> anyhow::Result<U256>;
    async fn call(&self, to: Address, data: Bytes) -> anyhow::Result<Bytes>;
}

#[async_trait]
pub trait ProviderEvents: Send + Sync {
    async fn next(&self) -> anyhow::Result<Option<ProviderEvent>>;
}
