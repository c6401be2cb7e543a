//! Contract Validator - On-chain Verification at Startup
//!
//! Validates that configured contract addresses point to deployed
//! contracts on the connected chain. An address without code means a
//! typo or the wrong network, and every approval sent to it would burn
//! a user's gas for nothing.

use std::sync::Arc;

use alloy::primitives::Address;
use tracing::{info, instrument, warn};

use crate::domain::ContractAddresses;
use crate::error::{Result, VaultError};
use crate::ports::ChainClient;

/// Result of validating a single contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    /// Contract name for logging.
    pub name: &'static str,
    pub address: Address,
    /// Whether the contract has deployed code.
    pub has_code: bool,
}

/// Validates contract addresses against on-chain state.
pub struct ContractValidator<C: ChainClient> {
    chain: Arc<C>,
}

impl<C: ChainClient> ContractValidator<C> {
    pub const fn new(chain: Arc<C>) -> Self {
        Self { chain }
    }

    /// Check every configured contract for deployed code.
    ///
    /// # Errors
    /// `Configuration` naming every address without code, or the RPC
    /// error if a lookup fails.
    #[instrument(skip_all)]
    pub async fn validate_all(&self, contracts: &ContractAddresses) -> Result<Vec<ValidationResult>> {
        let mut results = Vec::with_capacity(5);

        for (name, address) in contracts.all() {
            let has_code = self.chain.has_code(address).await?;
            if has_code {
                info!(contract = name, address = %address, "Contract validated: code exists on-chain");
            } else {
                warn!(contract = name, address = %address, "Contract has no code, possible misconfiguration");
            }
            results.push(ValidationResult {
                name,
                address,
                has_code,
            });
        }

        let missing: Vec<String> = results
            .iter()
            .filter(|r| !r.has_code)
            .map(|r| format!("{} at {}", r.name, r.address))
            .collect();

        if !missing.is_empty() {
            return Err(VaultError::Configuration(format!(
                "no deployed code for {}",
                missing.join(", ")
            )));
        }

        info!(validated = results.len(), "All contract validations complete");
        Ok(results)
    }
}
