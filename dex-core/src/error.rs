use thiserror::Error;

/// Reverts the operator scripts and the UI treat as informational.
pub const BENIGN_REVERTS: &[&str] = &["Pair exists", "Token already added"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    #[error("pair has no liquidity")]
    NoLiquidity,

    #[error("no price ratio yet; first deposit must supply both amounts")]
    NoPriceRatio,

    #[error("fee {0} bps out of range")]
    InvalidFee(u32),

    #[error("slippage {0} bps out of range")]
    InvalidSlippage(u32),

    #[error("percent {0} out of range")]
    InvalidPercent(u8),

    #[error("arithmetic overflow")]
    Overflow,
}

/// Error object returned by an EIP-1193 style wallet provider.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("provider error {code}: {message}")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

impl ProviderError {
    pub const USER_REJECTED: i64 = 4001;
    pub const UNAUTHORIZED: i64 = 4100;
    pub const DISCONNECTED: i64 = 4900;
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;
    pub const INTERNAL: i64 = -32603;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(Self::DISCONNECTED, message)
    }

    pub fn is_user_rejected(&self) -> bool {
        self.code == Self::USER_REJECTED
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == Self::UNRECOGNIZED_CHAIN
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DexError {
    #[error("no wallet provider available")]
    WalletUnavailable,

    #[error("request rejected by user")]
    UserRejected,

    #[error("wrong network: expected chain {expected}, connected to {actual}")]
    NetworkMismatch { expected: u64, actual: u64 },

    #[error("network switch failed: {0}")]
    NetworkSwitchFailed(String),

    #[error("transaction rejected by user")]
    TransactionRejected,

    #[error("transaction reverted: {}", .reason.as_deref().unwrap_or("unknown reason"))]
    TransactionReverted { reason: Option<String> },

    #[error("read failed ({what}): {reason}")]
    ReadFailed { what: String, reason: String },

    #[error("wallet not connected")]
    NotConnected,

    #[error("provider: {0}")]
    Provider(String),

    #[error("quote: {0}")]
    Quote(#[from] QuoteError),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

impl DexError {
    pub fn read_failed(what: impl Into<String>, err: impl std::fmt::Display) -> Self {
        DexError::ReadFailed {
            what: what.into(),
            reason: err.to_string(),
        }
    }

    /// Expected reverts that should be reported, not treated as failures.
    pub fn is_benign(&self) -> bool {
        match self {
            DexError::TransactionReverted {
                reason: Some(reason),
            } => BENIGN_REVERTS.iter().any(|b| reason.contains(b)),
            _ => false,
        }
    }
}

pub type DexResult<T> = std::result::Result<T, DexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn benign_reverts_are_recognised() {
        let e = DexError::TransactionReverted {
            reason: Some("Pair exists".into()),
        };
        assert!(e.is_benign());
        let e = DexError::TransactionReverted {
            reason: Some("Insufficient liquidity".into()),
        };
        assert!(!e.is_benign());
        assert!(!DexError::TransactionRejected.is_benign());
    }

    #[test]
    fn reverted_message_without_reason() {
        let e = DexError::TransactionReverted { reason: None };
        assert_eq!(e.to_string(), "transaction reverted: unknown reason");
    }

    #[test]
    fn provider_codes() {
        assert!(ProviderError::new(4001, "denied").is_user_rejected());
        assert!(ProviderError::new(4902, "unknown chain").is_unrecognized_chain());
        assert!(!ProviderError::transport("down").is_user_rejected());
    }
}
