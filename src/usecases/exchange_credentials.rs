//! Exchange Credential Use Case - Derive and Wrap CLOB API Keys
//!
//! Credentials are obtained with the custodial wallet's signature and
//! stored as three independently encrypted strings, one per field, so
//! the user document never holds them in plaintext.

use tracing::{info, instrument};

use crate::crypto::{decrypt_from_string, encrypt_to_string, MasterKey, SigningWallet};
use crate::domain::{EncryptedCredentials, ExchangeCredentials};
use crate::error::{Result, VaultError};
use crate::ports::ExchangeAuth;

/// Obtain API credentials for the wallet from the exchange.
///
/// # Errors
/// `ExchangeAuth` / `ExchangeUnavailable` from the exchange, and
/// `ExchangeAuth` when the exchange answers with an incomplete triple.
#[instrument(skip_all, fields(address = %wallet.address()))]
pub async fn derive_api_credentials<E: ExchangeAuth + ?Sized>(
  exchange: &E,
  wallet: &SigningWallet,
) -> Result<ExchangeCredentials> {
  let credentials = exchange.create_or_derive_api_key(wallet).await?;
  if credentials.is_incomplete() {
    return Err(VaultError::ExchangeAuth(
      "exchange returned incomplete API credentials".to_string(),
    ));
  }
  info!("Exchange API credentials obtained");
  Ok(credentials)
}

/// Encrypt each field into its own `salt:iv:tag:ciphertext` string.
///
/// # Errors
/// `Crypto` on RNG failure, `Format` if a field is empty.
pub fn encrypt_credentials(
  credentials: &ExchangeCredentials,
  master_key: &MasterKey,
) -> Result<EncryptedCredentials> {
  Ok(EncryptedCredentials {
    encrypted_api_key: encrypt_to_string(&credentials.api_key, master_key)?,
    encrypted_secret: encrypt_to_string(&credentials.secret, master_key)?,
    encrypted_passphrase: encrypt_to_string(&credentials.passphrase, master_key)?,
  })
}

/// Reverse of [`encrypt_credentials`].
///
/// # Errors
/// `Format` for malformed strings, `Integrity` on tag mismatch.
pub fn decrypt_credentials(
  encrypted: &EncryptedCredentials,
  master_key: &MasterKey,
) -> Result<ExchangeCredentials> {
  let api_key = decrypt_from_string(&encrypted.encrypted_api_key, master_key)?;
  let secret = decrypt_from_string(&encrypted.encrypted_secret, master_key)?;
  let passphrase = decrypt_from_string(&encrypted.encrypted_passphrase, master_key)?;
  Ok(ExchangeCredentials::new(
    api_key.as_str(),
    secret.as_str(),
    passphrase.as_str(),
  ))
}
