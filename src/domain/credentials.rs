//! Exchange API credentials, plaintext and at-rest.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Plaintext CLOB API credentials. Request-scoped only; wiped on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ExchangeCredentials {
    pub api_key: String,
    /// URL-safe base64 HMAC secret.
    pub secret: String,
    pub passphrase: String,
}

impl ExchangeCredentials {
    pub fn new(
        api_key: impl Into<String>,
        secret: impl Into<String>,
        passphrase: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            secret: secret.into(),
            passphrase: passphrase.into(),
        }
    }

    /// Whether any of the three fields is empty.
    pub fn is_incomplete(&self) -> bool {
        self.api_key.is_empty() || self.secret.is_empty() || self.passphrase.is_empty()
    }
}

impl fmt::Debug for ExchangeCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeCredentials")
            .field("api_key", &"<redacted>")
            .field("secret", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

/// Credential triple as stored on the user document. Each field is an
/// independent `salt:iv:tag:ciphertext` string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedCredentials {
    pub encrypted_api_key: String,
    pub encrypted_secret: String,
    pub encrypted_passphrase: String,
}
