use dex_core::{
    ContractAddresses, NetworkConfig, Token, TokenRegistry, DEFAULT_FEE_BPS, DEFAULT_SLIPPAGE_BPS,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// JSON-RPC endpoint of an EIP-1193 wallet; `None` means no wallet is installed.
    #[serde(default)]
    pub url: Option<String>,
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub receipt_poll_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub prices_url: String,
    pub price_interval_ms: u64,
    pub news_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub network: NetworkConfig,
    pub contracts: ContractAddresses,
    pub tokens: Vec<Token>,
    pub fee_bps: u32,
    pub slippage_bps: u32,
    pub rpc_timeout_ms: u64,
    pub wallet: WalletConfig,
    pub feeds: FeedConfig,
    pub storage_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::rise_testnet(),
            contracts: ContractAddresses::rise_testnet(),
            tokens: TokenRegistry::rise_testnet().tokens().to_vec(),
            fee_bps: DEFAULT_FEE_BPS,
            slippage_bps: DEFAULT_SLIPPAGE_BPS,
            rpc_timeout_ms: 10_000,
            wallet: WalletConfig {
                url: None,
                timeout_ms: 120_000,
                poll_interval_ms: 2_000,
                receipt_poll_ms: 1_000,
            },
            feeds: FeedConfig {
                prices_url: "https://api.coingecko.com/api/v3/coins/markets?vs_currency=usd&order=market_cap_desc&per_page=20&page=1".to_string(),
                price_interval_ms: 30_000,
                news_interval_ms: 60_000,
            },
            storage_dir: PathBuf::from("."),
        }
    }
}

impl EngineConfig {
    pub fn registry(&self) -> TokenRegistry {
        TokenRegistry::new(self.tokens.clone())
    }
}
