use crate::abi::{IFeePool, IMiniAMM, IPredictionMarket, IERC20};
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolCall;
use anyhow::{Context, Result};
use dex_core::{ChainReader, ContractAddresses};
use std::sync::Arc;

/// Typed view-function reads against the deployed contracts.
pub struct ContractReader<C: ChainReader> {
    chain: Arc<C>,
    addresses: ContractAddresses,
}

impl<C: ChainReader> Clone for ContractReader<C> {
    fn clone(&self) -> Self {
        Self {
            chain: Arc::clone(&self.chain),
            addresses: self.addresses,
        }
    }
}

impl<C: ChainReader> ContractReader<C> {
    pub fn new(chain: Arc<C>, addresses: ContractAddresses) -> Self {
        Self { chain, addresses }
    }

    pub fn addresses(&self) -> &ContractAddresses {
        &self.addresses
    }

    async fn read<T: SolCall>(&self, to: Address, call: T) -> Result<T::Return> {
        let data = Bytes::from(call.abi_encode());
        let out = self
            .chain
            .call(to, data)
            .await
            .with_context(|| format!("eth_call {}", T::SIGNATURE))?;
        T::abi_decode_returns(&out, true).with_context(|| format!("decode {}", T::SIGNATURE))
    }

    pub async fn native_balance(&self, owner: Address) -> Result<U256> {
        self.chain.native_balance(owner).await
    }

    pub async fn token_balance(&self, token: Address, owner: Address) -> Result<U256> {
        Ok(self
            .read(token, IERC20::balanceOfCall { owner })
            .await?
            .balance)
    }

    pub async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256> {
        Ok(self
            .read(token, IERC20::allowanceCall { owner, spender })
            .await?
            .remaining)
    }

    pub async fn pair_id(&self, token_a: Address, token_b: Address) -> Result<B256> {
        Ok(self
            .read(
                self.addresses.amm,
                IMiniAMM::getPairIdCall {
                    tokenA: token_a,
                    tokenB: token_b,
                },
            )
            .await?
            .pairId)
    }

    pub async fn all_pairs(&self) -> Result<Vec<B256>> {
        Ok(self
            .read(self.addresses.amm, IMiniAMM::getAllPairsCall {})
            .await?
            .pairIds)
    }

    pub async fn pair_info(&self, pair_id: B256) -> Result<IMiniAMM::getPairInfoReturn> {
        self.read(self.addresses.amm, IMiniAMM::getPairInfoCall { pairId: pair_id })
            .await
    }

    pub async fn user_liquidity(
        &self,
        pair_id: B256,
        user: Address,
    ) -> Result<IMiniAMM::getUserLiquidityReturn> {
        self.read(
            self.addresses.amm,
            IMiniAMM::getUserLiquidityCall {
                pairId: pair_id,
                user,
            },
        )
        .await
    }

    pub async fn reserves(&self, token_a: Address, token_b: Address) -> Result<(U256, U256)> {
        let r = self
            .read(
                self.addresses.amm,
                IMiniAMM::getReservesCall {
                    tokenA: token_a,
                    tokenB: token_b,
                },
            )
            .await?;
        Ok((r.reserveA, r.reserveB))
    }

    /// `(amount_out, fee)` as computed by the AMM itself.
    pub async fn amount_out(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> Result<(U256, U256)> {
        let r = self
            .read(
                self.addresses.amm,
                IMiniAMM::getAmountOutCall {
                    tokenIn: token_in,
                    tokenOut: token_out,
                    amountIn: amount_in,
                },
            )
            .await?;
        Ok((r.amountOut, r.fee))
    }

    pub async fn total_swap_volume(&self) -> Result<U256> {
        Ok(self
            .read(self.addresses.amm, IMiniAMM::totalSwapVolumeCall {})
            .await?
            .volume)
    }

    pub async fn total_fees_collected(&self) -> Result<U256> {
        Ok(self
            .read(self.addresses.amm, IMiniAMM::totalFeesCollectedCall {})
            .await?
            .fees)
    }

    pub async fn pool_balance(&self, token: Address) -> Result<U256> {
        Ok(self
            .read(self.addresses.fee_pool, IFeePool::getPoolBalanceCall { token })
            .await?
            .balance)
    }

    pub async fn all_pool_balances(&self) -> Result<Vec<(Address, U256)>> {
        let r = self
            .read(self.addresses.fee_pool, IFeePool::getAllPoolBalancesCall {})
            .await?;
        Ok(r.tokens.into_iter().zip(r.balances).collect())
    }

    pub async fn bet(&self, bet_id: U256) -> Result<IPredictionMarket::getBetReturn> {
        self.read(
            self.addresses.prediction_market,
            IPredictionMarket::getBetCall { betId: bet_id },
        )
        .await
    }

    pub async fn user_bets(&self, user: Address) -> Result<Vec<U256>> {
        Ok(self
            .read(
                self.addresses.prediction_market,
                IPredictionMarket::getUserBetsCall { user },
            )
            .await?
            .betIds)
    }

    /// `(price, updated_at)` from the prediction market's price table.
    pub async fn price(&self, token: Address) -> Result<(U256, U256)> {
        let r = self
            .read(
                self.addresses.prediction_market,
                IPredictionMarket::getPriceCall { token },
            )
            .await?;
        Ok((r.price, r.updatedAt))
    }

    pub async fn total_bets(&self) -> Result<U256> {
        Ok(self
            .read(
                self.addresses.prediction_market,
                IPredictionMarket::totalBetsCall {},
            )
            .await?
            .count)
    }

    pub async fn total_bet_volume(&self) -> Result<U256> {
        Ok(self
            .read(
                self.addresses.prediction_market,
                IPredictionMarket::totalVolumeCall {},
            )
            .await?
            .volume)
    }

    pub async fn active_bets(&self) -> Result<U256> {
        Ok(self
            .read(
                self.addresses.prediction_market,
                IPredictionMarket::activeBetsCall {},
            )
            .await?
            .count)
    }

    pub async fn active_bets_count(&self) -> Result<U256> {
        Ok(self
            .read(
                self.addresses.prediction_market,
                IPredictionMarket::getActiveBetsCountCall {},
            )
            .await?
            .count)
    }
}
