//! Vault Error Taxonomy
//!
//! Every failure the vault can surface, grouped by who has to act on it:
//! operators (configuration, integrity, crypto), the exchange integration
//! (auth vs availability), or the end user (duplicate signup, missing gas).
//! Callers branch on the variant; nothing in the vault swallows a decrypt
//! or signature failure.

use thiserror::Error;

/// Errors produced by the wallet and credential vault.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Missing or invalid configuration (master key, RPC URL, addresses).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// AEAD tag did not verify: corrupted record or master key mismatch.
    #[error("integrity check failed: ciphertext or tag does not verify under the master key")]
    Integrity,

    /// Stored encrypted data is not in the expected shape.
    #[error("invalid encrypted data format: {0}")]
    Format(String),

    /// Signup attempted for a user that already owns a wallet.
    #[error("user {user_id} already has a wallet")]
    AlreadyExists { user_id: String },

    /// The user document exists but has no wallet yet.
    #[error("no wallet found for user {user_id}")]
    WalletNotFound { user_id: String },

    /// No user document at all.
    #[error("user {user_id} not found")]
    UserNotFound { user_id: String },

    /// The exchange rejected the wallet signature. Not retryable.
    #[error("exchange rejected wallet authentication: {0}")]
    ExchangeAuth(String),

    /// The exchange could not be reached or answered with a server error.
    #[error("exchange unavailable: {0}")]
    ExchangeUnavailable(String),

    /// The wallet cannot pay for gas on Polygon.
    #[error("insufficient POL for gas on {address}: {detail}")]
    InsufficientGas { address: String, detail: String },

    /// Some approvals confirmed before a later one failed.
    #[error("allowances partially set ({} approvals confirmed): {source}", .tx_hashes.len())]
    PartialAllowance {
        tx_hashes: Vec<String>,
        #[source]
        source: Box<VaultError>,
    },

    /// An operation did not complete within its deadline.
    #[error("timed out after {seconds}s waiting for {operation}")]
    Timeout { operation: String, seconds: u64 },

    /// JSON-RPC or contract call failure.
    #[error("chain error: {0}")]
    Chain(String),

    /// User record store failure.
    #[error("user store error: {0}")]
    Store(String),

    /// RNG or cipher construction failure.
    #[error("crypto failure: {0}")]
    Crypto(String),
}

impl VaultError {
    /// Whether a caller may retry the operation with backoff.
    ///
    /// A partial allowance run is classified by the error that stopped it.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::PartialAllowance { source, .. } => source.is_retryable(),
            _ => matches!(
                self,
                Self::ExchangeUnavailable(_) | Self::Timeout { .. } | Self::Chain(_) | Self::Store(_)
            ),
        }
    }

    /// Whether the error is caused by the user and should be shown as-is.
    pub fn is_user_error(&self) -> bool {
        match self {
            Self::PartialAllowance { source, .. } => source.is_user_error(),
            _ => matches!(
                self,
                Self::AlreadyExists { .. } | Self::WalletNotFound { .. } | Self::InsufficientGas { .. }
            ),
        }
    }

    /// Whether the error signals a broken deployment that needs an operator.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::PartialAllowance { source, .. } => source.is_fatal(),
            _ => matches!(
                self,
                Self::Configuration(_)
                    | Self::Integrity
                    | Self::Format(_)
                    | Self::ExchangeAuth(_)
                    | Self::Crypto(_)
            ),
        }
    }
}

pub type Result<T> = std::result::Result<T, VaultError>;
