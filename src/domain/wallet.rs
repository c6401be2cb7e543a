//! Custodial wallet records and the per-user lifecycle.
//!
//! The user document owns the encrypted wallet, the encrypted CLOB
//! credentials and the cached `allowancesSet` flag. Field names follow
//! the stored document layout (camelCase) so existing documents load
//! unchanged.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::credentials::EncryptedCredentials;
use super::secret::EncryptedSecret;

/// At-rest wallet: plaintext address plus the encrypted private key.
///
/// Created once at signup and never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedWalletRecord {
    /// EIP-55 checksummed address derived from the private key.
    pub address: String,
    /// Hex ciphertext of the `0x`-prefixed private key.
    pub encrypted_private_key: String,
    pub iv: String,
    pub salt: String,
    pub tag: String,
}

impl EncryptedWalletRecord {
    /// Pair an address with the encryption of its private key.
    pub fn new(address: String, secret: EncryptedSecret) -> Self {
        Self {
            address,
            encrypted_private_key: secret.ciphertext,
            iv: secret.iv,
            salt: secret.salt,
            tag: secret.tag,
        }
    }

    /// The encrypted private key as a cipher input.
    pub fn secret(&self) -> EncryptedSecret {
        EncryptedSecret {
            ciphertext: self.encrypted_private_key.clone(),
            iv: self.iv.clone(),
            salt: self.salt.clone(),
            tag: self.tag.clone(),
        }
    }
}

/// One user document in the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet: Option<EncryptedWalletRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polymarket_creds: Option<EncryptedCredentials>,
    #[serde(default)]
    pub allowances_set: bool,
}

impl UserRecord {
    /// New user document holding a freshly created wallet.
    pub fn with_wallet(id: &str, email: Option<String>, wallet: EncryptedWalletRecord) -> Self {
        Self {
            id: id.to_string(),
            email,
            created_at: Utc::now(),
            wallet: Some(wallet),
            polymarket_creds: None,
            allowances_set: false,
        }
    }

    /// Classify the document into its lifecycle state.
    pub fn lifecycle(&self) -> WalletLifecycle<'_> {
        match (&self.wallet, &self.polymarket_creds, self.allowances_set) {
            (None, _, _) => WalletLifecycle::NoWallet,
            (Some(wallet), credentials, true) => WalletLifecycle::AllowancesSet {
                wallet,
                credentials: credentials.as_ref(),
            },
            (Some(wallet), Some(credentials), false) => {
                WalletLifecycle::CredentialsDerived { wallet, credentials }
            }
            (Some(wallet), None, false) => WalletLifecycle::WalletCreated { wallet },
        }
    }

    /// Apply a partial update. Absent fields are left untouched.
    pub fn apply(&mut self, update: &UserUpdate) {
        if let Some(wallet) = &update.wallet {
            self.wallet = Some(wallet.clone());
        }
        if let Some(creds) = &update.polymarket_creds {
            self.polymarket_creds = Some(creds.clone());
        }
        if let Some(flag) = update.allowances_set {
            self.allowances_set = flag;
        }
    }
}

/// Partial update of a user document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub wallet: Option<EncryptedWalletRecord>,
    pub polymarket_creds: Option<EncryptedCredentials>,
    pub allowances_set: Option<bool>,
}

impl UserUpdate {
    /// Update that records the allowances as granted.
    pub fn allowances_set() -> Self {
        Self {
            allowances_set: Some(true),
            ..Self::default()
        }
    }
}

/// Lifecycle of a custodial wallet:
/// `NoWallet -> WalletCreated -> CredentialsDerived -> AllowancesSet`.
///
/// Credentials and allowances are set lazily on the first trade and
/// independently of each other, so `AllowancesSet` may or may not carry
/// credentials. Trading needs both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletLifecycle<'a> {
    NoWallet,
    WalletCreated {
        wallet: &'a EncryptedWalletRecord,
    },
    CredentialsDerived {
        wallet: &'a EncryptedWalletRecord,
        credentials: &'a EncryptedCredentials,
    },
    AllowancesSet {
        wallet: &'a EncryptedWalletRecord,
        credentials: Option<&'a EncryptedCredentials>,
    },
}

impl WalletLifecycle<'_> {
    /// Whether both trading prerequisites are already cached.
    pub const fn is_trade_ready(&self) -> bool {
        matches!(
            self,
            Self::AllowancesSet {
                credentials: Some(_),
                ..
            }
        )
    }
}

/// On-chain balances of a custodial wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalances {
    pub address: String,
    /// USDC (6 decimals).
    pub usdc_balance: Decimal,
    /// Native POL (18 decimals).
    pub pol_balance: Decimal,
}
