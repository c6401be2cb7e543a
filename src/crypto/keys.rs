//! Wallet Generator - secp256k1 keys and EIP-55 addresses.

use std::fmt;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::VaultError;

/// Freshly generated keypair. The private key is `0x`-prefixed hex.
pub struct GeneratedWallet {
    /// EIP-55 checksummed.
    pub address: String,
    pub private_key: Zeroizing<String>,
}

impl fmt::Debug for GeneratedWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedWallet")
            .field("address", &self.address)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Out-of-range scalars are redrawn; the odds of needing this are ~2^-128.
const MAX_DRAWS: usize = 4;

/// Generate a random private key from the OS CSPRNG.
///
/// # Errors
/// `VaultError::Crypto` if the OS RNG fails.
pub fn generate() -> Result<GeneratedWallet, VaultError> {
    generate_with(&mut OsRng)
}

fn generate_with<R: RngCore>(rng: &mut R) -> Result<GeneratedWallet, VaultError> {
    let mut bytes = Zeroizing::new([0u8; 32]);
    for _ in 0..MAX_DRAWS {
        rng.try_fill_bytes(&mut bytes[..])
            .map_err(|e| VaultError::Crypto(format!("OS RNG failure: {e}")))?;
        if let Ok(signer) = PrivateKeySigner::from_slice(&bytes[..]) {
            return Ok(GeneratedWallet {
                address: signer.address().to_checksum(None),
                private_key: Zeroizing::new(format!("0x{}", hex::encode(signer.to_bytes()))),
            });
        }
    }
    Err(VaultError::Crypto("RNG produced no valid secp256k1 scalar".to_string()))
}

/// Rebuild a signer from `0x`-prefixed (or bare) hex.
///
/// # Errors
/// `VaultError::Format` if the input is not a valid secp256k1 scalar.
pub fn signer_from_private_key(private_key: &str) -> Result<PrivateKeySigner, VaultError> {
    let raw = private_key.strip_prefix("0x").unwrap_or(private_key);
    let bytes = Zeroizing::new(
        hex::decode(raw).map_err(|_| VaultError::Format("private key is not hex".to_string()))?,
    );
    PrivateKeySigner::from_slice(&bytes)
        .map_err(|_| VaultError::Format("private key is not a valid secp256k1 scalar".to_string()))
}

/// Checksummed address of a private key.
///
/// # Errors
/// Same as [`signer_from_private_key`].
pub fn address_from_private_key(private_key: &str) -> Result<String, VaultError> {
    signer_from_private_key(private_key).map(|s| s.address().to_checksum(None))
}

/// Private-key-backed signer reconstructed for one request.
#[derive(Clone)]
pub struct SigningWallet {
    signer: PrivateKeySigner,
}

impl SigningWallet {
    pub const fn new(signer: PrivateKeySigner) -> Self {
        Self { signer }
    }

    /// # Errors
    /// Same as [`signer_from_private_key`].
    pub fn from_private_key(private_key: &str) -> Result<Self, VaultError> {
        signer_from_private_key(private_key).map(Self::new)
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn checksum_address(&self) -> String {
        self.signer.address().to_checksum(None)
    }

    pub const fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }
}

impl fmt::Debug for SigningWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningWallet")
            .field("address", &self.signer.address())
            .finish_non_exhaustive()
    }
}
