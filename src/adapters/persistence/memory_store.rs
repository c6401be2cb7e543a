//! In-memory user store for tests and local runs.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{EncryptedCredentials, EncryptedWalletRecord, UserRecord, UserUpdate};
use crate::error::{Result, VaultError};
use crate::ports::UserStore;

/// `UserStore` backed by a map. Conditional writes hold the write lock
/// for the whole check-and-set.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

fn not_found(user_id: &str) -> VaultError {
    VaultError::UserNotFound {
        user_id: user_id.to_string(),
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get(&self, user_id: &str) -> Result<Option<UserRecord>> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn create(&self, record: UserRecord) -> Result<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&record.id) {
            return Err(VaultError::AlreadyExists { user_id: record.id });
        }
        users.insert(record.id.clone(), record);
        Ok(())
    }

    async fn update(&self, user_id: &str, update: UserUpdate) -> Result<()> {
        let mut users = self.users.write().await;
        let record = users.get_mut(user_id).ok_or_else(|| not_found(user_id))?;
        record.apply(&update);
        Ok(())
    }

    async fn set_wallet_if_absent(&self, user_id: &str, wallet: EncryptedWalletRecord) -> Result<bool> {
        let mut users = self.users.write().await;
        let record = users.get_mut(user_id).ok_or_else(|| not_found(user_id))?;
        if record.wallet.is_some() {
            return Ok(false);
        }
        record.wallet = Some(wallet);
        Ok(true)
    }

    async fn store_credentials_if_absent(
        &self,
        user_id: &str,
        credentials: EncryptedCredentials,
    ) -> Result<bool> {
        let mut users = self.users.write().await;
        let record = users.get_mut(user_id).ok_or_else(|| not_found(user_id))?;
        if record.polymarket_creds.is_some() {
            return Ok(false);
        }
        record.polymarket_creds = Some(credentials);
        Ok(true)
    }
}
