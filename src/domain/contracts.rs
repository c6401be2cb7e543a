//! Parsed contract addresses of the Polymarket deployment.

use alloy::primitives::Address;

/// Addresses the allowance flow talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractAddresses {
    /// Collateral token, ERC-20 with 6 decimals.
    pub usdc: Address,
    /// Conditional Token Framework, ERC-1155.
    pub ctf: Address,
    pub ctf_exchange: Address,
    pub neg_risk_ctf_exchange: Address,
    pub neg_risk_adapter: Address,
}

impl ContractAddresses {
    /// Contracts that must be approved to move USDC and CTF positions,
    /// in submission order. The first is the one `check_allowances` reads.
    pub const fn exchange_spenders(&self) -> [(&'static str, Address); 3] {
        [
            ("ctf_exchange", self.ctf_exchange),
            ("neg_risk_ctf_exchange", self.neg_risk_ctf_exchange),
            ("neg_risk_adapter", self.neg_risk_adapter),
        ]
    }

    /// Every configured contract, for on-chain code validation.
    pub const fn all(&self) -> [(&'static str, Address); 5] {
        [
            ("usdc", self.usdc),
            ("ctf", self.ctf),
            ("ctf_exchange", self.ctf_exchange),
            ("neg_risk_ctf_exchange", self.neg_risk_ctf_exchange),
            ("neg_risk_adapter", self.neg_risk_adapter),
        ]
    }
}
