//! Allowance Manager Use Case - Exchange Token Approvals
//!
//! Before the exchange can settle orders for a wallet, three contracts
//! (CTF Exchange, Neg-risk CTF Exchange, Neg-risk Adapter) each need an
//! unlimited USDC allowance and CTF operator approval. Approvals are
//! submitted one at a time and each waits for its receipt, so a single
//! signing key never has two transactions competing for a nonce.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use tracing::{info, instrument, warn};

use crate::crypto::SigningWallet;
use crate::domain::{AllowanceOutcome, AllowanceState, ContractAddresses};
use crate::error::{Result, VaultError};
use crate::ports::ChainClient;

/// Gas budgeted per approval transaction for the balance precheck.
pub const APPROVAL_GAS_LIMIT: u64 = 100_000;

/// One approval that still has to be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Approval {
  /// USDC `approve(spender, MAX)`.
  Usdc { spender: &'static str, address: Address },
  /// CTF `setApprovalForAll(operator, true)`.
  Ctf { operator: &'static str, address: Address },
}

/// Checks and grants the exchange approvals for custodial wallets.
pub struct AllowanceManager<C: ChainClient> {
  chain: Arc<C>,
  contracts: ContractAddresses,
}

impl<C: ChainClient> AllowanceManager<C> {
  pub const fn new(chain: Arc<C>, contracts: ContractAddresses) -> Self {
    Self { chain, contracts }
  }

  /// Read approval status against the primary CTF Exchange.
  ///
  /// Two read-only calls; always safe to retry.
  #[instrument(skip(self))]
  pub async fn check_allowances(&self, owner: Address) -> Result<AllowanceState> {
    let spender = self.contracts.ctf_exchange;
    let (allowance, ctf) = tokio::try_join!(
      self.chain.erc20_allowance(self.contracts.usdc, owner, spender),
      self.chain.is_approved_for_all(self.contracts.ctf, owner, spender),
    )?;
    Ok(AllowanceState {
      ctf,
      usdc: allowance > U256::ZERO,
    })
  }

  /// Grant every missing approval, in order, waiting for each receipt.
  ///
  /// With nothing missing this sends no transaction and succeeds with an
  /// empty hash list. A failure stops the run; hashes confirmed before it
  /// are kept in the outcome.
  #[instrument(skip_all, fields(owner = %wallet.address()))]
  pub async fn set_allowances(&self, wallet: &SigningWallet) -> AllowanceOutcome {
    let pending = match self.pending_approvals(wallet.address()).await {
      Ok(pending) => pending,
      Err(e) => return AllowanceOutcome::failed(Vec::new(), e),
    };

    if pending.is_empty() {
      info!("All exchange approvals already granted");
      return AllowanceOutcome::completed(Vec::new());
    }

    if let Err(e) = self.ensure_gas(wallet, pending.len()).await {
      warn!(error = %e, "Approval gas precheck failed");
      return AllowanceOutcome::failed(Vec::new(), e);
    }

    let mut tx_hashes = Vec::with_capacity(pending.len());
    for approval in pending {
      let submitted = match approval {
        Approval::Usdc { spender, address } => {
          info!(spender, "Approving USDC");
          self
            .chain
            .approve(wallet, self.contracts.usdc, address, U256::MAX)
            .await
        }
        Approval::Ctf { operator, address } => {
          info!(operator, "Approving CTF operator");
          self
            .chain
            .set_approval_for_all(wallet, self.contracts.ctf, address, true)
            .await
        }
      };

      match submitted {
        Ok(hash) => tx_hashes.push(hash),
        Err(e) => {
          warn!(error = %e, confirmed = tx_hashes.len(), "Approval failed");
          return AllowanceOutcome::failed(tx_hashes, e);
        }
      }
    }

    info!(count = tx_hashes.len(), "Exchange approvals granted");
    AllowanceOutcome::completed(tx_hashes)
  }

  /// Missing approvals across all exchange contracts, in submission order.
  async fn pending_approvals(&self, owner: Address) -> Result<Vec<Approval>> {
    let mut pending = Vec::new();
    for (name, address) in self.contracts.exchange_spenders() {
      let (allowance, approved) = tokio::try_join!(
        self.chain.erc20_allowance(self.contracts.usdc, owner, address),
        self.chain.is_approved_for_all(self.contracts.ctf, owner, address),
      )?;
      if allowance.is_zero() {
        pending.push(Approval::Usdc { spender: name, address });
      }
      if !approved {
        pending.push(Approval::Ctf { operator: name, address });
      }
    }
    Ok(pending)
  }

  /// Refuse to start when the wallet cannot pay for every pending approval.
  async fn ensure_gas(&self, wallet: &SigningWallet, approvals: usize) -> Result<()> {
    let (balance, gas_price) = tokio::try_join!(
      self.chain.native_balance(wallet.address()),
      self.chain.gas_price(),
    )?;

    let required = U256::from(gas_price)
      .saturating_mul(U256::from(APPROVAL_GAS_LIMIT))
      .saturating_mul(U256::from(approvals));

    if balance < required {
      return Err(VaultError::InsufficientGas {
        address: wallet.checksum_address(),
        detail: format!(
          "balance {balance} wei, about {required} wei needed for {approvals} approvals; add POL for gas"
        ),
      });
    }
    Ok(())
  }
}
