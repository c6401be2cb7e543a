//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the vault's workflows. Each use case is a self-contained
//! business operation.
//!
//! Use cases:
//! - `CredentialVault`: Signup, balances and trade preparation per user
//! - `AllowanceManager`: Exchange approval checks and submission
//! - `exchange_credentials`: CLOB API key derivation and field encryption

pub mod allowance_manager;
pub mod credential_vault;
pub mod exchange_credentials;

pub use allowance_manager::AllowanceManager;
pub use credential_vault::{
  connect_wallet, create_encrypted_wallet, decrypt_wallet, ConnectedWallet, CredentialVault,
  TradingSession,
};
