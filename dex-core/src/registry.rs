use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};

use crate::model::Token;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub name: String,
    pub rpc_url: String,
    pub explorer_url: String,
    pub native_currency: NativeCurrency,
}

impl NetworkConfig {
    pub fn rise_testnet() -> Self {
        Self {
            chain_id: 11_155_931,
            name: "Rise Testnet".to_string(),
            rpc_url: "https://testnet.riselabs.xyz".to_string(),
            explorer_url: "https://explorer.testnet.riselabs.xyz".to_string(),
            native_currency: NativeCurrency {
                name: "Ethereum".to_string(),
                symbol: "ETH".to_string(),
                decimals: 18,
            },
        }
    }

    /// Chain id in the `0x`-prefixed form wallet RPC methods expect.
    pub fn chain_id_hex(&self) -> String {
        format!("0x{:X}", self.chain_id)
    }

    pub fn tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), tx_hash)
    }

    pub fn address_url(&self, address: &Address) -> String {
        format!("{}/address/{}", self.explorer_url.trim_end_matches('/'), address)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAddresses {
    pub fee_pool: Address,
    pub amm: Address,
    pub prediction_market: Address,
}

impl ContractAddresses {
    pub fn rise_testnet() -> Self {
        Self {
            fee_pool: address!("aAb628B06E2D9Ed64bed2A4D471BcCF66B32A114"),
            amm: address!("Cc2CD136685219b19D927e3459A455e644c5495f"),
            prediction_market: address!("48eCef05a0439468576A2db561A07173677ab55c"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRegistry {
    tokens: Vec<Token>,
}

impl TokenRegistry {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    pub fn rise_testnet() -> Self {
        Self::new(vec![
            Token::new(
                address!("d6e1afe5cA8D00A2EFC01B89997abE2De47fdfAf"),
                "RISE",
                "Rise Token",
                18,
                "🚀",
            ),
            Token::new(
                address!("8A93d247134d91e0de6f96547cB0204e5BE8e5D8"),
                "USDC",
                "USD Coin",
                6,
                "💵",
            ),
            Token::new(
                address!("40918Ba7f132E0aCba2CE4de4c4baF9BD2D7D849"),
                "USDT",
                "Tether USD",
                6,
                "💲",
            ),
        ])
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn by_address(&self, address: &Address) -> Option<&Token> {
        self.tokens.iter().find(|t| &t.address == address)
    }

    /// Textual lookup; any hex casing of the same address matches.
    pub fn by_address_str(&self, address: &str) -> Option<&Token> {
        let trimmed = address.trim();
        let lower = trimmed.to_ascii_lowercase();
        let parsed: Address = lower.parse().ok()?;
        self.by_address(&parsed)
    }

    pub fn by_symbol(&self, symbol: &str) -> Option<&Token> {
        self.tokens
            .iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(symbol.trim()))
    }

    /// Symbol or address.
    pub fn lookup(&self, key: &str) -> Option<&Token> {
        self.by_symbol(key).or_else(|| self.by_address_str(key))
    }

    pub fn resolve(&self, address: Address) -> Token {
        self.by_address(&address)
            .cloned()
            .unwrap_or_else(|| Token::unknown(address))
    }
}
