//! Allowance State - On-chain Approval Snapshot
//!
//! Read model of the two approval relationships the exchange needs
//! before it can settle orders for a wallet, and the outcome of an
//! attempt to grant them.

use serde::Serialize;

use crate::error::VaultError;

/// Approval status against the primary exchange contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AllowanceState {
    /// CTF `isApprovedForAll(owner, exchange)`.
    pub ctf: bool,
    /// USDC `allowance(owner, exchange) > 0`.
    pub usdc: bool,
}

impl AllowanceState {
    pub const fn is_complete(&self) -> bool {
        self.ctf && self.usdc
    }
}

/// Result of one `set_allowances` run.
///
/// `tx_hashes` holds every approval that confirmed, in submission order,
/// even when a later one failed.
#[derive(Debug)]
pub struct AllowanceOutcome {
    pub success: bool,
    pub tx_hashes: Vec<String>,
    pub failure: Option<VaultError>,
}

impl AllowanceOutcome {
    pub const fn completed(tx_hashes: Vec<String>) -> Self {
        Self {
            success: true,
            tx_hashes,
            failure: None,
        }
    }

    pub const fn failed(tx_hashes: Vec<String>, failure: VaultError) -> Self {
        Self {
            success: false,
            tx_hashes,
            failure: Some(failure),
        }
    }

    /// Collapse into a result. A failure after at least one confirmed
    /// approval becomes `PartialAllowance`.
    pub fn into_result(self) -> Result<Vec<String>, VaultError> {
        match self.failure {
            None => Ok(self.tx_hashes),
            Some(source) if self.tx_hashes.is_empty() => Err(source),
            Some(source) => Err(VaultError::PartialAllowance {
                tx_hashes: self.tx_hashes,
                source: Box::new(source),
            }),
        }
    }
}
