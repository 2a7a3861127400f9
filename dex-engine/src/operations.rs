use crate::abi::{IFeePool, IMiniAMM, IPredictionMarket, IERC20};
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use dex_core::ContractAddresses;

/// A state-changing contract call, ready to be wrapped in a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Approve {
        token: Address,
        spender: Address,
        amount: U256,
    },
    Swap {
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    },
    AddLiquidity {
        token_a: Address,
        token_b: Address,
        amount_a: U256,
        amount_b: U256,
    },
    RemoveLiquidity {
        token_a: Address,
        token_b: Address,
        liquidity: U256,
    },
    PlaceBet {
        token: Address,
        amount: U256,
        predict_up: bool,
        duration_secs: u64,
    },
    ResolveBet {
        bet_id: U256,
    },
    CancelBet {
        bet_id: U256,
    },
    CreatePair {
        token_a: Address,
        token_b: Address,
    },
    AllowPredictionToken {
        token: Address,
    },
    AllowFeePoolToken {
        token: Address,
    },
    UpdatePrice {
        token: Address,
        price: U256,
    },
    SetAmmContract {
        amm: Address,
    },
    SetPredictionContract {
        prediction: Address,
    },
    FeePoolDeposit {
        token: Address,
        amount: U256,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Approve { .. } => "approve",
            Operation::Swap { .. } => "swap",
            Operation::AddLiquidity { .. } => "add_liquidity",
            Operation::RemoveLiquidity { .. } => "remove_liquidity",
            Operation::PlaceBet { .. } => "place_bet",
            Operation::ResolveBet { .. } => "resolve_bet",
            Operation::CancelBet { .. } => "cancel_bet",
            Operation::CreatePair { .. } => "create_pair",
            Operation::AllowPredictionToken { .. } => "allow_prediction_token",
            Operation::AllowFeePoolToken { .. } => "allow_fee_pool_token",
            Operation::UpdatePrice { .. } => "update_price",
            Operation::SetAmmContract { .. } => "set_amm_contract",
            Operation::SetPredictionContract { .. } => "set_prediction_contract",
            Operation::FeePoolDeposit { .. } => "fee_pool_deposit",
        }
    }

    pub fn target(&self, contracts: &ContractAddresses) -> Address {
        match self {
            Operation::Approve { token, .. } => *token,
            Operation::Swap { .. }
            | Operation::AddLiquidity { .. }
            | Operation::RemoveLiquidity { .. }
            | Operation::CreatePair { .. } => contracts.amm,
            Operation::PlaceBet { .. }
            | Operation::ResolveBet { .. }
            | Operation::CancelBet { .. }
            | Operation::AllowPredictionToken { .. }
            | Operation::UpdatePrice { .. } => contracts.prediction_market,
            Operation::AllowFeePoolToken { .. }
            | Operation::SetAmmContract { .. }
            | Operation::SetPredictionContract { .. }
            | Operation::FeePoolDeposit { .. } => contracts.fee_pool,
        }
    }

    pub fn calldata(&self) -> Bytes {
        let raw = match self.clone() {
            Operation::Approve {
                spender, amount, ..
            } => IERC20::approveCall { spender, amount }.abi_encode(),
            Operation::Swap {
                token_in,
                token_out,
                amount_in,
            } => IMiniAMM::swapCall {
                tokenIn: token_in,
                tokenOut: token_out,
                amountIn: amount_in,
            }
            .abi_encode(),
            Operation::AddLiquidity {
                token_a,
                token_b,
                amount_a,
                amount_b,
            } => IMiniAMM::addLiquidityCall {
                tokenA: token_a,
                tokenB: token_b,
                amountA: amount_a,
                amountB: amount_b,
            }
            .abi_encode(),
            Operation::RemoveLiquidity {
                token_a,
                token_b,
                liquidity,
            } => IMiniAMM::removeLiquidityCall {
                tokenA: token_a,
                tokenB: token_b,
                liquidityAmount: liquidity,
            }
            .abi_encode(),
            Operation::PlaceBet {
                token,
                amount,
                predict_up,
                duration_secs,
            } => IPredictionMarket::placeBetCall {
                token,
                amount,
                predictUp: predict_up,
                duration: U256::from(duration_secs),
            }
            .abi_encode(),
            Operation::ResolveBet { bet_id } => {
                IPredictionMarket::resolveBetCall { betId: bet_id }.abi_encode()
            }
            Operation::CancelBet { bet_id } => {
                IPredictionMarket::cancelBetCall { betId: bet_id }.abi_encode()
            }
            Operation::CreatePair { token_a, token_b } => IMiniAMM::createPairCall {
                tokenA: token_a,
                tokenB: token_b,
            }
            .abi_encode(),
            Operation::AllowPredictionToken { token } => {
                IPredictionMarket::addAllowedTokenCall { token }.abi_encode()
            }
            Operation::AllowFeePoolToken { token } => {
                IFeePool::addAllowedTokenCall { token }.abi_encode()
            }
            Operation::UpdatePrice { token, price } => {
                IPredictionMarket::updatePriceCall { token, price }.abi_encode()
            }
            Operation::SetAmmContract { amm } => IFeePool::setAMMContractCall { amm }.abi_encode(),
            Operation::SetPredictionContract { prediction } => {
                IFeePool::setPredictionContractCall { prediction }.abi_encode()
            }
            Operation::FeePoolDeposit { token, amount } => {
                IFeePool::depositCall { token, amount }.abi_encode()
            }
        };
        Bytes::from(raw)
    }
}
