use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub type UnixSeconds = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub address: Address,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub glyph: String,
}

impl Token {
    pub fn new(address: Address, symbol: &str, name: &str, decimals: u8, glyph: &str) -> Self {
        Self {
            address,
            symbol: symbol.to_string(),
            name: name.to_string(),
            decimals,
            glyph: glyph.to_string(),
        }
    }

    /// Placeholder for an address that is not in the registry.
    pub fn unknown(address: Address) -> Self {
        let hex = address.to_string();
        Self {
            address,
            symbol: format!("{}...", &hex[..6]),
            name: "Unknown token".to_string(),
            decimals: 18,
            glyph: "🪙".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub id: B256,
    pub token_a: Token,
    pub token_b: Token,
    pub reserve_a: U256,
    pub reserve_b: U256,
    pub total_liquidity: U256,
}

impl Pair {
    pub fn label(&self) -> String {
        format!("{}/{}", self.token_a.symbol, self.token_b.symbol)
    }

    pub fn has_liquidity(&self) -> bool {
        !self.reserve_a.is_zero() && !self.reserve_b.is_zero()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityPosition {
    pub pair_id: B256,
    pub liquidity: U256,
    pub deposited_a: U256,
    pub deposited_b: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BetStatus {
    Active,
    Won,
    Lost,
    Cancelled,
}

impl TryFrom<u8> for BetStatus {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(BetStatus::Active),
            1 => Ok(BetStatus::Won),
            2 => Ok(BetStatus::Lost),
            3 => Ok(BetStatus::Cancelled),
            other => Err(other),
        }
    }
}

impl fmt::Display for BetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BetStatus::Active => "Active",
            BetStatus::Won => "Won",
            BetStatus::Lost => "Lost",
            BetStatus::Cancelled => "Cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    pub id: U256,
    pub user: Address,
    pub token: Token,
    pub amount: U256,
    pub initial_price: U256,
    pub final_price: U256,
    pub start_time: UnixSeconds,
    pub end_time: UnixSeconds,
    pub predict_up: bool,
    pub status: BetStatus,
}

impl Bet {
    pub fn is_active(&self) -> bool {
        self.status == BetStatus::Active
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balances {
    pub native: U256,
    pub tokens: BTreeMap<Address, U256>,
}

impl Balances {
    pub fn token(&self, address: &Address) -> U256 {
        self.tokens.get(address).copied().unwrap_or(U256::ZERO)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSession {
    pub address: Option<Address>,
    pub chain_id: Option<u64>,
    pub is_connected: bool,
    pub balances: Balances,
}

impl WalletSession {
    pub fn connected(address: Address, chain_id: u64) -> Self {
        Self {
            address: Some(address),
            chain_id: Some(chain_id),
            is_connected: true,
            balances: Balances::default(),
        }
    }

    pub fn short_address(&self) -> Option<String> {
        self.address.map(|a| {
            let hex = a.to_string();
            format!("{}...{}", &hex[..6], &hex[hex.len() - 4..])
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
    Neon,
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            "neon" => Ok(Theme::Neon),
            other => Err(format!("unknown theme '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    Dashboard,
    #[default]
    Swap,
    Liquidity,
    Prediction,
    Wallet,
    News,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiPreferences {
    pub active_tab: Tab,
    pub theme: Theme,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolBalance {
    pub token: Token,
    pub balance: U256,
}

/// Aggregate counters read from the AMM and prediction contracts. `None`
/// means the read failed and the value should render as a placeholder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolStats {
    pub total_swap_volume: Option<U256>,
    pub total_fees_collected: Option<U256>,
    pub total_bets: Option<U256>,
    pub total_bet_volume: Option<U256>,
    pub active_bets: Option<U256>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoPrice {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub current_price: f64,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub source: String,
    pub url: String,
    pub published_at: i64,
    #[serde(default)]
    pub currencies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRequest {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    pub status: bool,
    pub gas_used: Option<U256>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
}
