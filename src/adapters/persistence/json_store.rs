//! JSON User Store - One Atomic Document per User
//!
//! Each user document lives in `<data_dir>/users/<id>.json` and is
//! rewritten with the tmp-then-rename pattern, so a crash leaves either
//! the old or the new document, never a partial one. Read-modify-write
//! cycles run under a single async mutex, which makes the conditional
//! writes of the `UserStore` port true compare-and-swaps within this
//! process.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::domain::{EncryptedCredentials, EncryptedWalletRecord, UserRecord, UserUpdate};
use crate::error::{Result, VaultError};
use crate::ports::UserStore;

/// File-backed user record store.
pub struct JsonUserStore {
    /// Directory holding `<id>.json` documents.
    users_dir: PathBuf,
    /// Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl JsonUserStore {
    /// Open the store, creating `<data_dir>/users` if needed.
    ///
    /// # Errors
    /// `VaultError::Store` if the directory cannot be created.
    pub async fn new(data_dir: &str) -> Result<Self> {
        let users_dir = Path::new(data_dir).join("users");
        fs::create_dir_all(&users_dir)
            .await
            .map_err(|e| store_error("create data directory", &e))?;

        Ok(Self {
            users_dir,
            write_lock: Mutex::new(()),
        })
    }

    fn document_path(&self, user_id: &str) -> Result<PathBuf> {
        validate_user_id(user_id)?;
        Ok(self.users_dir.join(format!("{user_id}.json")))
    }

    async fn read(&self, user_id: &str) -> Result<Option<UserRecord>> {
        let path = self.document_path(user_id)?;
        let json = match fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(store_error("read user document", &e)),
        };
        let record = serde_json::from_str(&json).map_err(|e| {
            VaultError::Store(format!("corrupt user document {}: {e}", path.display()))
        })?;
        Ok(Some(record))
    }

    /// Write a document atomically (tmp → rename).
    async fn write(&self, record: &UserRecord) -> Result<()> {
        let path = self.document_path(&record.id)?;
        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| VaultError::Store(format!("serialize user document: {e}")))?;

        fs::write(&tmp_path, json)
            .await
            .map_err(|e| store_error("write tmp user document", &e))?;
        fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| store_error("rename user document", &e))?;

        debug!(user_id = %record.id, "User document saved");
        Ok(())
    }

    /// Check the users directory is still accessible.
    pub async fn is_healthy(&self) -> bool {
        fs::metadata(&self.users_dir).await.is_ok()
    }
}

/// Ids become file names; only `[A-Za-z0-9_-]` is allowed.
fn validate_user_id(user_id: &str) -> Result<()> {
    let valid = !user_id.is_empty()
        && user_id.len() <= 128
        && user_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(VaultError::Store(format!("invalid user id {user_id:?}")))
    }
}

fn store_error(action: &str, err: &std::io::Error) -> VaultError {
    VaultError::Store(format!("failed to {action}: {err}"))
}

#[async_trait]
impl UserStore for JsonUserStore {
    async fn get(&self, user_id: &str) -> Result<Option<UserRecord>> {
        self.read(user_id).await
    }

    #[instrument(skip(self, record), fields(user_id = %record.id))]
    async fn create(&self, record: UserRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if self.read(&record.id).await?.is_some() {
            return Err(VaultError::AlreadyExists {
                user_id: record.id,
            });
        }
        self.write(&record).await
    }

    #[instrument(skip(self, update))]
    async fn update(&self, user_id: &str, update: UserUpdate) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut record = self
            .read(user_id)
            .await?
            .ok_or_else(|| VaultError::UserNotFound {
                user_id: user_id.to_string(),
            })?;
        record.apply(&update);
        self.write(&record).await
    }

    #[instrument(skip(self, wallet))]
    async fn set_wallet_if_absent(&self, user_id: &str, wallet: EncryptedWalletRecord) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut record = self
            .read(user_id)
            .await?
            .ok_or_else(|| VaultError::UserNotFound {
                user_id: user_id.to_string(),
            })?;
        if record.wallet.is_some() {
            return Ok(false);
        }
        record.wallet = Some(wallet);
        self.write(&record).await?;
        Ok(true)
    }

    #[instrument(skip(self, credentials))]
    async fn store_credentials_if_absent(
        &self,
        user_id: &str,
        credentials: EncryptedCredentials,
    ) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut record = self
            .read(user_id)
            .await?
            .ok_or_else(|| VaultError::UserNotFound {
                user_id: user_id.to_string(),
            })?;
        if record.polymarket_creds.is_some() {
            return Ok(false);
        }
        record.polymarket_creds = Some(credentials);
        self.write(&record).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    fn temp_dir() -> String {
        let suffix: u64 = rand::random();
        std::env::temp_dir()
            .join(format!("vault-store-test-{suffix:016x}"))
            .to_string_lossy()
            .into_owned()
    }

    fn wallet(address: &str) -> EncryptedWalletRecord {
        EncryptedWalletRecord {
            address: address.into(),
            encrypted_private_key: "ab".into(),
            iv: "00".repeat(16),
            salt: "11".repeat(32),
            tag: "22".repeat(16),
        }
    }

    fn creds(marker: &str) -> EncryptedCredentials {
        EncryptedCredentials {
            encrypted_api_key: format!("{marker}:a:b:c"),
            encrypted_secret: format!("{marker}:a:b:c"),
            encrypted_passphrase: format!("{marker}:a:b:c"),
        }
    }

    #[tokio::test]
    async fn test_create_get_and_duplicate() {
        let dir = temp_dir();
        let store = JsonUserStore::new(&dir).await.unwrap();
        assert!(store.get("alice").await.unwrap().is_none());

        let record = UserRecord::with_wallet("alice", None, wallet("0x01"));
        store.create(record.clone()).await.unwrap();
        assert_eq!(store.get("alice").await.unwrap(), Some(record));

        let dup = UserRecord::with_wallet("alice", None, wallet("0x02"));
        let err = store.create(dup).await.unwrap_err();
        assert!(matches!(err, VaultError::AlreadyExists { .. }));
        let kept = store.get("alice").await.unwrap().unwrap();
        assert_eq!(kept.wallet.unwrap().address, "0x01");

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let dir = temp_dir();
        let store = JsonUserStore::new(&dir).await.unwrap();
        let err = store
            .update("ghost", UserUpdate::allowances_set())
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::UserNotFound { .. }));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_credentials_stored_once() {
        let dir = temp_dir();
        let store = JsonUserStore::new(&dir).await.unwrap();
        store
            .create(UserRecord::with_wallet("bob", None, wallet("0x03")))
            .await
            .unwrap();

        assert!(store.store_credentials_if_absent("bob", creds("first")).await.unwrap());
        assert!(!store.store_credentials_if_absent("bob", creds("second")).await.unwrap());

        let record = store.get("bob").await.unwrap().unwrap();
        assert_eq!(record.polymarket_creds, Some(creds("first")));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_wallet_attached_once() {
        let dir = temp_dir();
        let store = JsonUserStore::new(&dir).await.unwrap();
        let mut record = UserRecord::with_wallet("carol", None, wallet("0x04"));
        record.wallet = None;
        store.create(record).await.unwrap();

        assert!(store.set_wallet_if_absent("carol", wallet("0x05")).await.unwrap());
        assert!(!store.set_wallet_if_absent("carol", wallet("0x06")).await.unwrap());
        let stored = store.get("carol").await.unwrap().unwrap();
        assert_eq!(stored.wallet.unwrap().address, "0x05");
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_path_traversal_ids_rejected() {
        let dir = temp_dir();
        let store = JsonUserStore::new(&dir).await.unwrap();
        for bad in ["../etc/passwd", "a/b", "", "x.json"] {
            assert!(matches!(store.get(bad).await, Err(VaultError::Store(_))), "{bad}");
        }
        let _ = std::fs::remove_dir_all(dir);
    }
}
