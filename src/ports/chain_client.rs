//! Chain Client Port - Polygon Reads and Approval Transactions
//!
//! Read calls are side-effect free and always safe to retry. The two
//! write calls sign with the given wallet and only return once the
//! transaction is mined (or the confirmation deadline passes).

use alloy::primitives::{Address, U256};
use async_trait::async_trait;

use crate::crypto::SigningWallet;
use crate::error::Result;

/// On-chain access needed by the allowance and balance flows.
#[async_trait]
pub trait ChainClient: Send + Sync + 'static {
  /// ERC-20 `allowance(owner, spender)`.
  async fn erc20_allowance(&self, token: Address, owner: Address, spender: Address)
    -> Result<U256>;

  /// ERC-20 `balanceOf(owner)` in base units.
  async fn erc20_balance(&self, token: Address, owner: Address) -> Result<U256>;

  /// ERC-1155 `isApprovedForAll(owner, operator)`.
  async fn is_approved_for_all(
    &self,
    token: Address,
    owner: Address,
    operator: Address,
  ) -> Result<bool>;

  /// Native POL balance in wei.
  async fn native_balance(&self, owner: Address) -> Result<U256>;

  /// Current gas price in wei.
  async fn gas_price(&self) -> Result<u128>;

  /// Whether contract code is deployed at the address.
  async fn has_code(&self, address: Address) -> Result<bool>;

  /// ERC-20 `approve(spender, amount)`; returns the mined tx hash.
  ///
  /// # Errors
  /// `InsufficientGas` when the node rejects for lack of funds,
  /// `Timeout` when the receipt does not arrive in time.
  async fn approve(
    &self,
    wallet: &SigningWallet,
    token: Address,
    spender: Address,
    amount: U256,
  ) -> Result<String>;

  /// ERC-1155 `setApprovalForAll(operator, approved)`; returns the mined tx hash.
  async fn set_approval_for_all(
    &self,
    wallet: &SigningWallet,
    token: Address,
    operator: Address,
    approved: bool,
  ) -> Result<String>;

  /// Check if the RPC connection is healthy.
  async fn is_healthy(&self) -> bool;
}
