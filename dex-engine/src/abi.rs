//! Solidity bindings for the token, AMM, fee pool and prediction contracts.

use alloy_sol_types::sol;

sol! {
    interface IERC20 {
        event Transfer(address indexed from, address indexed to, uint256 value);
        event Approval(address indexed owner, address indexed spender, uint256 value);

        function balanceOf(address owner) external view returns (uint256 balance);
        function allowance(address owner, address spender) external view returns (uint256 remaining);
        function approve(address spender, uint256 amount) external returns (bool ok);
        function transfer(address to, uint256 amount) external returns (bool ok);
        function transferFrom(address from, address to, uint256 amount) external returns (bool ok);
    }

    interface IMiniAMM {
        function createPair(address tokenA, address tokenB) external returns (bytes32 pairId);
        function getPairId(address tokenA, address tokenB) external view returns (bytes32 pairId);
        function addLiquidity(address tokenA, address tokenB, uint256 amountA, uint256 amountB) external returns (uint256 liquidity);
        function removeLiquidity(address tokenA, address tokenB, uint256 liquidityAmount) external returns (uint256 amountA, uint256 amountB);
        function swap(address tokenIn, address tokenOut, uint256 amountIn) external returns (uint256 amountOut);
        function getReserves(address tokenA, address tokenB) external view returns (uint256 reserveA, uint256 reserveB);
        function getAmountOut(address tokenIn, address tokenOut, uint256 amountIn) external view returns (uint256 amountOut, uint256 fee);
        function getAllPairs() external view returns (bytes32[] pairIds);
        function getPairInfo(bytes32 pairId) external view returns (address tokenA, address tokenB, uint256 reserveA, uint256 reserveB, uint256 totalLiquidity);
        function getUserLiquidity(bytes32 pairId, address user) external view returns (uint256 liquidity, uint256 depositedA, uint256 depositedB);
        function totalSwapVolume() external view returns (uint256 volume);
        function totalFeesCollected() external view returns (uint256 fees);
    }

    interface IFeePool {
        function deposit(address token, uint256 amount) external;
        function distributeReward(address winner, address token) external returns (uint256 reward);
        function addAllowedToken(address token) external;
        function setAMMContract(address amm) external;
        function setPredictionContract(address prediction) external;
        function getPoolBalance(address token) external view returns (uint256 balance);
        function getAllPoolBalances() external view returns (address[] tokens, uint256[] balances);
    }

    interface IPredictionMarket {
        function placeBet(address token, uint256 amount, bool predictUp, uint256 duration) external returns (uint256 betId);
        function resolveBet(uint256 betId) external;
        function cancelBet(uint256 betId) external;
        function addAllowedToken(address token) external;
        function updatePrice(address token, uint256 price) external;
        function getBet(uint256 betId) external view returns (address user, address token, uint256 amount, uint256 initialPrice, uint256 finalPrice, uint256 startTime, uint256 endTime, bool predictUp, uint8 status);
        function getUserBets(address user) external view returns (uint256[] betIds);
        function getPrice(address token) external view returns (uint256 price, uint256 updatedAt);
        function getActiveBetsCount() external view returns (uint256 count);
        function totalBets() external view returns (uint256 count);
        function totalVolume() external view returns (uint256 volume);
        function activeBets() external view returns (uint256 count);
    }
}
