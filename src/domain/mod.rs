//! Domain layer - Vault records and state.
//!
//! Pure data types for the custodial wallet pipeline: encrypted secrets,
//! the per-user document, the wallet lifecycle, allowance snapshots and
//! CLOB request signing. No I/O here (hexagonal architecture inner ring).

pub mod allowance;
pub mod clob_auth;
pub mod contracts;
pub mod credentials;
pub mod secret;
pub mod wallet;

// Re-export core types for convenience
pub use allowance::{AllowanceOutcome, AllowanceState};
pub use clob_auth::ClobAuth;
pub use contracts::ContractAddresses;
pub use credentials::{EncryptedCredentials, ExchangeCredentials};
pub use secret::EncryptedSecret;
pub use wallet::{
    EncryptedWalletRecord, UserRecord, UserUpdate, WalletBalances, WalletLifecycle,
};
