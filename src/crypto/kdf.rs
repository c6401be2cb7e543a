//! Key Derivation - PBKDF2-HMAC-SHA256
//!
//! Stretches the master passphrase with a per-secret salt into a 256-bit
//! AES key. Called fresh for every encrypt and decrypt; derived keys are
//! never cached across secrets.

use sha2::Sha256;
use zeroize::Zeroizing;

use super::master_key::MasterKey;

/// Fixed iteration count. Changing it breaks every stored secret.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// Derive the symmetric key for one secret.
pub fn derive_key(master_key: &MasterKey, salt: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
    derive_with_rounds(master_key.expose(), salt, PBKDF2_ITERATIONS)
}

fn derive_with_rounds(password: &[u8], salt: &[u8], rounds: u32) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, rounds, &mut key[..]);
    key
}
