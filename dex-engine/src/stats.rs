use crate::contracts::ContractReader;
use alloy_primitives::U256;
use anyhow::Result;
use dex_core::*;
use std::future::Future;
use tracing::warn;

async fn field<F>(what: &str, read: F) -> Option<U256>
where
    F: Future<Output = Result<U256>>,
{
    match read.await {
        Ok(v) => Some(v),
        Err(err) => {
            warn!(target: "stats", stat=what, error=%err, "protocol stat read failed");
            None
        }
    }
}

/// Protocol-wide counters; each is read independently.
pub async fn protocol_stats<C: ChainReader>(contracts: &ContractReader<C>) -> ProtocolStats {
    let (total_swap_volume, total_fees_collected, total_bets, total_bet_volume, active_bets) = tokio::join!(
        field("totalSwapVolume", contracts.total_swap_volume()),
        field("totalFeesCollected", contracts.total_fees_collected()),
        field("totalBets", contracts.total_bets()),
        field("totalVolume", contracts.total_bet_volume()),
        field("activeBets", contracts.active_bets()),
    );
    ProtocolStats {
        total_swap_volume,
        total_fees_collected,
        total_bets,
        total_bet_volume,
        active_bets,
    }
}

pub async fn pool_balances<C: ChainReader>(
    contracts: &ContractReader<C>,
    registry: &TokenRegistry,
) -> DexResult<Vec<PoolBalance>> {
    let raw = contracts
        .all_pool_balances()
        .await
        .map_err(|e| DexError::read_failed("getAllPoolBalances", e))?;
    Ok(raw
        .into_iter()
        .map(|(token, balance)| PoolBalance {
            token: registry.resolve(token),
            balance,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn failing_stat_is_a_placeholder() {
        let chain = MockChain::new();
        {
            let mut st = chain.state.lock();
            st.fees = U256::from(30u64);
            st.total_bets = U256::from(4u64);
            st.fail_stats = true;
        }
        let reader = ContractReader::new(chain.clone(), ContractAddresses::rise_testnet());
        let stats = protocol_stats(&reader).await;
        assert_eq!(stats.total_swap_volume, None);
        assert_eq!(stats.total_fees_collected, Some(U256::from(30u64)));
        assert_eq!(stats.total_bets, Some(U256::from(4u64)));
        assert_eq!(stats.active_bets, Some(U256::ZERO));
    }

    #[tokio::test]
    async fn pool_balances_resolve_tokens() {
        let chain = MockChain::new();
        chain.state.lock().pool_balances = vec![(usdc().address, U256::from(9u64))];
        let reader = ContractReader::new(chain.clone(), ContractAddresses::rise_testnet());
        let balances = pool_balances(&reader, &TokenRegistry::rise_testnet())
            .await
            .unwrap();
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].token.symbol, "USDC");
    }
}
