//! Solidity ABI surface of the account and the token interface it consumes.
//!
//! The account decodes self-calls, multicall elements and reentrant callbacks with
//! [`IDuoAccount::IDuoAccountCalls`], so every path into the account goes through the same
//! dispatcher regardless of whether it arrived as a Rust call or as calldata.

use alloy_sol_types::sol;

sol! {
    interface IERC20 {
        function transfer(address to, uint256 amount) external returns (bool);
        function balanceOf(address owner) external view returns (uint256);
    }

    interface IDuoAccount {
        function execute(address to, uint256 value, bytes data, uint256 nonce) external payable returns (bytes);
        function delegateExecute(address to, bytes data, uint256 nonce) external returns (bytes);
        function batchExecute(address[] tos, uint256[] values, bytes[] datas, uint256 nonce) external payable;
        function batchExecuteWithSig(
            address[] tos,
            uint256[] values,
            bytes[] datas,
            uint256 nonce,
            uint256 deadline,
            bytes signature
        ) external;
        function cancel(bytes32 fingerprint) external;
        function setAllowance(address spender, address token, uint256 amount) external;
        function spendAllowance(address token, uint256 amount) external;
        function setPermit(address spender, uint256 count, address to, uint256 value, bytes data) external;
        function spendPermit(address to, uint256 value, bytes data) external returns (bytes);
        function setAssistant(address assistant) external;
        function transferOwnership(address newOwner) external;
        function multicall(bytes[] data) external returns (bytes[]);
    }
}
