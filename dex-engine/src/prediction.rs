use crate::contracts::ContractReader;
use crate::metrics::Metrics;
use alloy_primitives::{Address, U256};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use dex_core::*;
use futures::future::join_all;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Selectable bet windows as `(label, seconds)`.
pub const BET_DURATIONS: [(&str, u64); 5] = [
    ("5 min", 300),
    ("15 min", 900),
    ("1 hour", 3_600),
    ("4 hours", 14_400),
    ("24 hours", 86_400),
];

pub const PRICE_DECIMALS: u8 = 18;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BetBook {
    pub active: Vec<Bet>,
    pub settled: Vec<Bet>,
}

impl BetBook {
    pub fn from_bets(bets: Vec<Bet>) -> Self {
        let (active, settled) = bets.into_iter().partition(Bet::is_active);
        Self { active, settled }
    }

    pub fn len(&self) -> usize {
        self.active.len() + self.settled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    Ended,
    Left(u64),
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Remaining::Ended => f.write_str("Ended"),
            Remaining::Left(secs) => write!(f, "{}m {}s", secs / 60, secs % 60),
        }
    }
}

pub fn remaining_time(bet: &Bet, now: UnixSeconds) -> Remaining {
    if bet.end_time <= now {
        Remaining::Ended
    } else {
        Remaining::Left(bet.end_time - now)
    }
}

pub fn format_timestamp(secs: UnixSeconds) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "—".to_string())
}

pub fn now_secs() -> UnixSeconds {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

pub struct PredictionTracker<C: ChainReader> {
    contracts: ContractReader<C>,
    registry: Arc<TokenRegistry>,
    metrics: Arc<Metrics>,
}

impl<C: ChainReader> PredictionTracker<C> {
    pub fn new(contracts: ContractReader<C>, registry: Arc<TokenRegistry>, metrics: Arc<Metrics>) -> Self {
        Self {
            contracts,
            registry,
            metrics,
        }
    }

    /// All of the user's bets, split into active and settled. Bets that
    /// fail to read or decode are left out.
    pub async fn list_user_bets(&self, user: Address) -> DexResult<BetBook> {
        let ids = self
            .contracts
            .user_bets(user)
            .await
            .map_err(|e| DexError::read_failed("getUserBets", e))?;
        let reads = join_all(ids.iter().map(|id| self.bet(*id))).await;
        let mut bets = Vec::with_capacity(ids.len());
        for (id, res) in ids.iter().zip(reads) {
            match res {
                Ok(bet) => bets.push(bet),
                Err(err) => {
                    self.metrics.read_failures.inc();
                    warn!(target: "prediction", bet=%id, error=%err, "bet read failed");
                }
            }
        }
        let book = BetBook::from_bets(bets);
        debug!(target: "prediction", active=book.active.len(), settled=book.settled.len(), "bets loaded");
        Ok(book)
    }

    pub async fn bet(&self, id: U256) -> Result<Bet> {
        let raw = self.contracts.bet(id).await?;
        let status =
            BetStatus::try_from(raw.status).map_err(|code| anyhow!("unknown bet status {}", code))?;
        Ok(Bet {
            id,
            user: raw.user,
            token: self.registry.resolve(raw.token),
            amount: raw.amount,
            initial_price: raw.initialPrice,
            final_price: raw.finalPrice,
            start_time: seconds(raw.startTime)?,
            end_time: seconds(raw.endTime)?,
            predict_up: raw.predictUp,
            status,
        })
    }

    /// Oracle price of `token`, 18 decimals.
    pub async fn current_price(&self, token: &Token) -> DexResult<U256> {
        self.contracts
            .price(token.address)
            .await
            .map(|(price, _)| price)
            .map_err(|e| DexError::read_failed("getPrice", e))
    }
}

fn seconds(v: U256) -> Result<UnixSeconds> {
    u64::try_from(v).map_err(|_| anyhow!("timestamp out of range"))
}
