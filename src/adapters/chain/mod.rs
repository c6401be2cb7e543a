//! Chain Adapters - Polygon Blockchain Interaction Layer
//!
//! Provides on-chain access via alloy-rs 0.9 for:
//! - ERC-20 / ERC-1155 reads (allowances, balances, operator approvals)
//! - Approval transactions signed by a per-request custodial wallet
//! - Startup verification of the chain id and contract deployments

pub mod contracts;
pub mod provider;
pub mod validator;

pub use provider::PolygonChain;
pub use validator::ContractValidator;
