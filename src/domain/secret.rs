//! Encrypted secret representation and its single-field string codec.
//!
//! An `EncryptedSecret` is the output of one AES-256-GCM encryption:
//! hex ciphertext, 16-byte IV, 32-byte PBKDF2 salt and 16-byte tag.
//! For storage in one column it packs as `salt:iv:tag:ciphertext`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VaultError;

/// Field delimiter of the combined string form.
pub const DELIMITER: char = ':';

/// Hex-encoded output of a single encryption call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedSecret {
    /// AEAD ciphertext (hex), same length as the plaintext.
    pub ciphertext: String,
    /// 16 random bytes (hex), unique per call.
    pub iv: String,
    /// 32 random bytes (hex) fed to the KDF for this secret only.
    pub salt: String,
    /// 16-byte GCM authentication tag (hex).
    pub tag: String,
}

impl fmt::Display for EncryptedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{DELIMITER}{}{DELIMITER}{}{DELIMITER}{}",
            self.salt, self.iv, self.tag, self.ciphertext
        )
    }
}

impl FromStr for EncryptedSecret {
    type Err = VaultError;

    fn from_str(combined: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = combined.split(DELIMITER).collect();
        let [salt, iv, tag, ciphertext] = parts.as_slice() else {
            return Err(VaultError::Format(format!(
                "expected 4 colon-separated parts, found {}",
                parts.len()
            )));
        };

        if [salt, iv, tag, ciphertext].iter().any(|p| p.is_empty()) {
            return Err(VaultError::Format(
                "encrypted string has an empty part".to_string(),
            ));
        }

        Ok(Self {
            ciphertext: (*ciphertext).to_string(),
            iv: (*iv).to_string(),
            salt: (*salt).to_string(),
            tag: (*tag).to_string(),
        })
    }
}
