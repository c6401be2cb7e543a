//! Symmetric Cipher - AES-256-GCM with per-secret salt
//!
//! Every call draws a fresh 32-byte salt and 16-byte IV from the OS
//! CSPRNG, derives a key from the master key and that salt, and seals the
//! UTF-8 plaintext with a detached 16-byte tag. All four outputs are hex.
//!
//! The 16-byte IV (rather than GCM's usual 12) and the field order of the
//! combined string are part of the stored format and must not change.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::AesGcm;
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::warn;
use zeroize::{Zeroize, Zeroizing};

use super::kdf::derive_key;
use super::master_key::MasterKey;
use crate::domain::EncryptedSecret;
use crate::error::{Result, VaultError};

/// IV length in bytes.
pub const IV_LEN: usize = 16;
/// Salt length in bytes.
pub const SALT_LEN: usize = 32;
/// GCM tag length in bytes.
pub const TAG_LEN: usize = 16;

type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Encrypt a secret string under the master key.
///
/// # Errors
/// `VaultError::Crypto` if the OS RNG or cipher setup fails.
pub fn encrypt(plaintext: &str, master_key: &MasterKey) -> Result<EncryptedSecret> {
    let salt: [u8; SALT_LEN] = random_bytes()?;
    let iv: [u8; IV_LEN] = random_bytes()?;

    let key = derive_key(master_key, &salt);
    let cipher = Aes256Gcm16::new_from_slice(&key[..])
        .map_err(|e| VaultError::Crypto(format!("cipher init: {e}")))?;

    let mut buffer = Zeroizing::new(plaintext.as_bytes().to_vec());
    let tag = cipher
        .encrypt_in_place_detached(GenericArray::from_slice(&iv), b"", buffer.as_mut_slice())
        .map_err(|_| VaultError::Crypto("AES-GCM encryption failed".to_string()))?;

    Ok(EncryptedSecret {
        ciphertext: hex::encode(&*buffer),
        iv: hex::encode(iv),
        salt: hex::encode(salt),
        tag: hex::encode(tag),
    })
}

/// Decrypt a secret produced by [`encrypt`].
///
/// No plaintext is released unless the tag verifies.
///
/// # Errors
/// - `VaultError::Format` for malformed hex or wrong field lengths
/// - `VaultError::Integrity` if the tag does not verify (tampering or wrong key)
pub fn decrypt(secret: &EncryptedSecret, master_key: &MasterKey) -> Result<Zeroizing<String>> {
    let salt = decode_fixed::<SALT_LEN>("salt", &secret.salt)?;
    let iv = decode_fixed::<IV_LEN>("iv", &secret.iv)?;
    let tag = decode_fixed::<TAG_LEN>("tag", &secret.tag)?;
    let mut buffer = hex::decode(&secret.ciphertext)
        .map_err(|e| VaultError::Format(format!("ciphertext is not hex: {e}")))?;

    let key = derive_key(master_key, &salt);
    let cipher = Aes256Gcm16::new_from_slice(&key[..])
        .map_err(|e| VaultError::Crypto(format!("cipher init: {e}")))?;

    if cipher
        .decrypt_in_place_detached(
            GenericArray::from_slice(&iv),
            b"",
            &mut buffer,
            GenericArray::from_slice(&tag),
        )
        .is_err()
    {
        warn!("AEAD tag verification failed");
        return Err(VaultError::Integrity);
    }

    match String::from_utf8(buffer) {
        Ok(plaintext) => Ok(Zeroizing::new(plaintext)),
        Err(e) => {
            e.into_bytes().zeroize();
            Err(VaultError::Format("decrypted secret is not UTF-8".to_string()))
        }
    }
}

/// Encrypt into the single-field `salt:iv:tag:ciphertext` form.
///
/// # Errors
/// `VaultError::Format` for an empty plaintext, whose ciphertext part
/// would be empty and therefore undecodable.
pub fn encrypt_to_string(plaintext: &str, master_key: &MasterKey) -> Result<String> {
    if plaintext.is_empty() {
        return Err(VaultError::Format(
            "cannot pack an empty secret into the combined form".to_string(),
        ));
    }
    encrypt(plaintext, master_key).map(|secret| secret.to_string())
}

/// Decrypt the single-field form produced by [`encrypt_to_string`].
///
/// # Errors
/// `VaultError::Format` unless the input splits into exactly four
/// non-empty parts, plus everything [`decrypt`] returns.
pub fn decrypt_from_string(combined: &str, master_key: &MasterKey) -> Result<Zeroizing<String>> {
    let secret: EncryptedSecret = combined.parse()?;
    decrypt(&secret, master_key)
}

fn random_bytes<const N: usize>() -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| VaultError::Crypto(format!("OS RNG failure: {e}")))?;
    Ok(bytes)
}

fn decode_fixed<const N: usize>(field: &str, value: &str) -> Result<[u8; N]> {
    let bytes =
        hex::decode(value).map_err(|e| VaultError::Format(format!("{field} is not hex: {e}")))?;
    bytes.try_into().map_err(|bytes: Vec<u8>| {
        VaultError::Format(format!("{field} must be {N} bytes, got {}", bytes.len()))
    })
}
