//! Polymarket CLOB API Adapter
//!
//! Obtains CLOB API credentials for custodial wallets.
//!
//! Sub-modules:
//! - `auth`: L1 EIP-712 wallet attestation headers
//! - `client`: HTTP client with rate limiting and retries
//! - `types`: API request/response type definitions

pub mod auth;
pub mod client;
pub mod types;

pub use client::{ClobClient, ClobClientConfig};
