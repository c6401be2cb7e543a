//! Crypto layer - Secrets at rest and wallet keys.
//!
//! - `master_key`: the required master passphrase
//! - `kdf`: PBKDF2-HMAC-SHA256 key derivation
//! - `cipher`: AES-256-GCM encryption of secret strings
//! - `keys`: secp256k1 wallet generation and signer reconstruction

pub mod cipher;
pub mod kdf;
pub mod keys;
pub mod master_key;

pub use cipher::{decrypt, decrypt_from_string, encrypt, encrypt_to_string};
pub use keys::{GeneratedWallet, SigningWallet};
pub use master_key::MasterKey;
