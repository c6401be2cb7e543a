//! Token Contract Bindings - ERC-20 and ERC-1155 ABIs
//!
//! Only the functions the allowance and balance flows call. Generated
//! with alloy's `sol!` so calldata encoding and return decoding are
//! type-checked instead of hand-assembled.

use alloy::sol;

sol! {
    /// USDC collateral token.
    #[sol(rpc)]
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
    }

    /// Conditional Token Framework position token.
    #[sol(rpc)]
    interface IERC1155 {
        function setApprovalForAll(address operator, bool approved) external;
        function isApprovedForAll(address account, address operator) external view returns (bool);
    }
}
