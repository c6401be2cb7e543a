//! Exchange Auth Port - CLOB API Credential Issuance
//!
//! The vault only needs one thing from the exchange: API credentials for
//! a wallet, created on first use and re-derived deterministically after.

use async_trait::async_trait;

use crate::crypto::SigningWallet;
use crate::domain::ExchangeCredentials;
use crate::error::Result;

/// Credential issuance by the order-book exchange.
#[async_trait]
pub trait ExchangeAuth: Send + Sync + 'static {
  /// Create API credentials for the wallet, or derive the existing ones.
  ///
  /// # Errors
  /// - `ExchangeAuth` if the wallet signature is rejected (not retryable)
  /// - `ExchangeUnavailable` for network, rate limit or server errors
  async fn create_or_derive_api_key(&self, wallet: &SigningWallet) -> Result<ExchangeCredentials>;
}
