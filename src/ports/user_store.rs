//! User Store Port - Per-user Document Persistence
//!
//! The record store owns the encrypted wallet and credentials as
//! sub-fields of a user document. Each call is atomic on its own; the
//! two conditional writes are what keep concurrent requests from
//! overwriting a wallet or storing two different credential sets.

use async_trait::async_trait;

use crate::domain::{EncryptedCredentials, EncryptedWalletRecord, UserRecord, UserUpdate};
use crate::error::Result;

/// Persistence of user documents.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
  /// Load a user document, `None` if it does not exist.
  async fn get(&self, user_id: &str) -> Result<Option<UserRecord>>;

  /// Insert a new document.
  ///
  /// Fails with `AlreadyExists` if a document with this id exists.
  async fn create(&self, record: UserRecord) -> Result<()>;

  /// Apply a partial update to an existing document.
  ///
  /// Fails with `UserNotFound` if there is no such document.
  async fn update(&self, user_id: &str, update: UserUpdate) -> Result<()>;

  /// Attach a wallet to an existing document only if it has none.
  ///
  /// Returns `false` (and writes nothing) when a wallet is already set.
  async fn set_wallet_if_absent(
    &self,
    user_id: &str,
    wallet: EncryptedWalletRecord,
  ) -> Result<bool>;

  /// Store encrypted credentials only if none are stored yet.
  ///
  /// Returns `false` (and writes nothing) when another request won.
  async fn store_credentials_if_absent(
    &self,
    user_id: &str,
    credentials: EncryptedCredentials,
  ) -> Result<bool>;
}
