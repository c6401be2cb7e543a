//! CLOB L2 Authentication - HMAC-SHA256 Request Signing
//!
//! Signs CLOB API requests with the credentials derived for a custodial
//! wallet. Signature format:
//! `base64url(HMAC-SHA256(base64url_decode(secret), timestamp + METHOD + path + body))`.
//! The secret is NEVER sent as a header, only the computed signature.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use chrono::Utc;

use super::credentials::ExchangeCredentials;
use crate::error::{Result, VaultError};

/// Current Unix timestamp in seconds, as sent in `POLY_TIMESTAMP`.
pub fn unix_timestamp() -> String {
    Utc::now().timestamp().to_string()
}

/// L2 request signer for one wallet's derived credentials.
#[derive(Clone)]
pub struct ClobAuth {
    /// Checksummed wallet address (`POLY_ADDRESS`).
    address: String,
    credentials: ExchangeCredentials,
}

impl ClobAuth {
    pub const fn new(address: String, credentials: ExchangeCredentials) -> Self {
        Self {
            address,
            credentials,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Get the API key for request headers.
    pub fn api_key(&self) -> &str {
        &self.credentials.api_key
    }

    /// Sign a request.
    ///
    /// # Errors
    /// `VaultError::Format` if the stored secret is not URL-safe base64.
    pub fn sign(&self, timestamp: &str, method: &str, path: &str, body: &str) -> Result<String> {
        let key = URL_SAFE
            .decode(self.credentials.secret.as_bytes())
            .map_err(|_| VaultError::Format("API secret is not url-safe base64".to_string()))?;
        let message = format!("{timestamp}{}{path}{body}", method.to_uppercase());
        let mac = hmac_sha256::HMAC::mac(message.as_bytes(), &key);
        Ok(URL_SAFE.encode(mac))
    }

    /// Build all authentication headers for a CLOB request.
    ///
    /// # Errors
    /// Same as [`ClobAuth::sign`].
    pub fn headers(&self, method: &str, path: &str, body: &str) -> Result<Vec<(&'static str, String)>> {
        let ts = unix_timestamp();
        let signature = self.sign(&ts, method, path, body)?;
        Ok(vec![
            ("POLY_ADDRESS", self.address.clone()),
            ("POLY_SIGNATURE", signature),
            ("POLY_TIMESTAMP", ts),
            ("POLY_API_KEY", self.credentials.api_key.clone()),
            ("POLY_PASSPHRASE", self.credentials.passphrase.clone()),
        ])
    }
}

impl fmt::Debug for ClobAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClobAuth")
            .field("address", &self.address)
            .field("credentials", &self.credentials)
            .finish()
    }
}
