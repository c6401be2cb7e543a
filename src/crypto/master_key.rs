//! Master encryption key.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::VaultError;

/// Environment variable holding the master key.
pub const MASTER_KEY_ENV: &str = "ENCRYPTION_MASTER_KEY";

/// Passphrase every stored secret is derived from.
///
/// There is no default: construction fails on an empty value, and the
/// bytes are wiped when the key is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey(String);

impl MasterKey {
    /// # Errors
    /// `VaultError::Configuration` if the passphrase is empty.
    pub fn new(passphrase: impl Into<String>) -> Result<Self, VaultError> {
        let passphrase = passphrase.into();
        if passphrase.is_empty() {
            return Err(VaultError::Configuration(format!(
                "{MASTER_KEY_ENV} must not be empty"
            )));
        }
        Ok(Self(passphrase))
    }

    /// Read the key from `ENCRYPTION_MASTER_KEY`.
    ///
    /// # Errors
    /// `VaultError::Configuration` if the variable is unset or empty.
    pub fn from_env() -> Result<Self, VaultError> {
        let value = std::env::var(MASTER_KEY_ENV)
            .map_err(|_| VaultError::Configuration(format!("{MASTER_KEY_ENV} is not set")))?;
        Self::new(value)
    }

    pub(crate) fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey(<redacted>)")
    }
}
