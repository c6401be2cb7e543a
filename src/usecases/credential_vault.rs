//! Credential Vault Use Case - Custodial Wallet Lifecycle
//!
//! Orchestrates the per-user pipeline:
//! signup creates and encrypts a wallet; a trade request decrypts it,
//! grants exchange approvals and obtains API credentials, each at most
//! once per user, and hands back a session able to sign orders.
//!
//! Decrypted keys and credentials only live inside the returned values
//! for the duration of a request. Nothing here catches an integrity or
//! signature failure; they propagate to the caller.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use super::allowance_manager::AllowanceManager;
use super::exchange_credentials::{decrypt_credentials, derive_api_credentials, encrypt_credentials};
use crate::adapters::metrics::VaultMetrics;
use crate::crypto::{decrypt, encrypt, keys, MasterKey, SigningWallet};
use crate::domain::{
  ClobAuth, ContractAddresses, EncryptedCredentials, EncryptedWalletRecord, ExchangeCredentials,
  UserRecord, UserUpdate, WalletBalances, WalletLifecycle,
};
use crate::error::{Result, VaultError};
use crate::ports::{ChainClient, ExchangeAuth, UserStore};

/// USDC base-unit decimals.
pub const USDC_DECIMALS: u32 = 6;
/// POL (native) base-unit decimals.
pub const POL_DECIMALS: u32 = 18;

/// Generate a wallet and encrypt its private key in one step.
///
/// # Errors
/// `Crypto` if the RNG or cipher fails. Never a user error.
pub fn create_encrypted_wallet(master_key: &MasterKey) -> Result<EncryptedWalletRecord> {
  let generated = keys::generate()?;
  let secret = encrypt(&generated.private_key, master_key)?;
  Ok(EncryptedWalletRecord::new(generated.address, secret))
}

/// Decrypt a stored wallet and rebuild its signer.
///
/// # Errors
/// `Integrity` if the tag does not verify or the decrypted key does not
/// belong to the stored address; `Format` for malformed fields.
pub fn decrypt_wallet(record: &EncryptedWalletRecord, master_key: &MasterKey) -> Result<SigningWallet> {
  let private_key = decrypt(&record.secret(), master_key)?;
  let wallet = SigningWallet::from_private_key(&private_key)?;
  if !wallet.checksum_address().eq_ignore_ascii_case(&record.address) {
    return Err(VaultError::Integrity);
  }
  Ok(wallet)
}

/// A decrypted wallet attached to a chain client.
pub struct ConnectedWallet<C: ChainClient> {
  wallet: SigningWallet,
  chain: Arc<C>,
}

impl<C: ChainClient> ConnectedWallet<C> {
  pub fn address(&self) -> Address {
    self.wallet.address()
  }

  pub const fn wallet(&self) -> &SigningWallet {
    &self.wallet
  }

  pub const fn chain(&self) -> &Arc<C> {
    &self.chain
  }

  /// Native POL balance in wei.
  ///
  /// # Errors
  /// `Chain` if the RPC call fails.
  pub async fn native_balance(&self) -> Result<U256> {
    self.chain.native_balance(self.wallet.address()).await
  }
}

/// Decrypt a stored wallet and attach it to a chain client.
///
/// # Errors
/// Same as [`decrypt_wallet`].
pub fn connect_wallet<C: ChainClient>(
  record: &EncryptedWalletRecord,
  chain: Arc<C>,
  master_key: &MasterKey,
) -> Result<ConnectedWallet<C>> {
  let wallet = decrypt_wallet(record, master_key)?;
  Ok(ConnectedWallet { wallet, chain })
}

/// Everything needed to place orders for one user.
#[derive(Debug)]
pub struct TradingSession {
  pub wallet: SigningWallet,
  /// L2 signer for CLOB order requests.
  pub auth: ClobAuth,
  /// Approval transactions confirmed while preparing this session.
  pub approval_tx_hashes: Vec<String>,
  /// Whether credentials were obtained from the exchange in this call.
  pub credentials_derived: bool,
}

/// Wallet and credential vault over the store, exchange and chain ports.
pub struct CredentialVault<S: UserStore, E: ExchangeAuth, C: ChainClient> {
  store: Arc<S>,
  exchange: Arc<E>,
  chain: Arc<C>,
  allowances: AllowanceManager<C>,
  contracts: ContractAddresses,
  master_key: MasterKey,
  metrics: Option<Arc<VaultMetrics>>,
}

impl<S: UserStore, E: ExchangeAuth, C: ChainClient> CredentialVault<S, E, C> {
  pub fn new(
    store: Arc<S>,
    exchange: Arc<E>,
    chain: Arc<C>,
    contracts: ContractAddresses,
    master_key: MasterKey,
  ) -> Self {
    Self {
      allowances: AllowanceManager::new(Arc::clone(&chain), contracts),
      store,
      exchange,
      chain,
      contracts,
      master_key,
      metrics: None,
    }
  }

  /// Attach Prometheus counters.
  #[must_use]
  pub fn with_metrics(mut self, metrics: Arc<VaultMetrics>) -> Self {
    self.metrics = Some(metrics);
    self
  }

  pub const fn allowances(&self) -> &AllowanceManager<C> {
    &self.allowances
  }

  /// Create the user's custodial wallet. One-shot per user.
  ///
  /// # Errors
  /// `AlreadyExists` if the user already has a wallet; the stored wallet
  /// is left untouched.
  #[instrument(skip(self, email))]
  pub async fn signup(&self, user_id: &str, email: Option<String>) -> Result<String> {
    let existing = self.store.get(user_id).await?;
    if existing.as_ref().is_some_and(|r| r.wallet.is_some()) {
      return Err(VaultError::AlreadyExists {
        user_id: user_id.to_string(),
      });
    }

    let wallet = create_encrypted_wallet(&self.master_key)?;
    let address = wallet.address.clone();

    if existing.is_some() {
      if !self.store.set_wallet_if_absent(user_id, wallet).await? {
        return Err(VaultError::AlreadyExists {
          user_id: user_id.to_string(),
        });
      }
    } else {
      self
        .store
        .create(UserRecord::with_wallet(user_id, email, wallet))
        .await?;
    }

    if let Some(metrics) = &self.metrics {
      metrics.wallets_created.inc();
    }
    info!(address = %address, "Custodial wallet created");
    Ok(address)
  }

  /// USDC and POL balances of the user's wallet.
  ///
  /// # Errors
  /// `UserNotFound` / `WalletNotFound`, or `Chain` on RPC failure.
  #[instrument(skip(self))]
  pub async fn balances(&self, user_id: &str) -> Result<WalletBalances> {
    let record = self.load(user_id).await?;
    let wallet = record.wallet.as_ref().ok_or_else(|| VaultError::WalletNotFound {
      user_id: user_id.to_string(),
    })?;
    let owner: Address = wallet
      .address
      .parse()
      .map_err(|_| VaultError::Format(format!("stored address {} is invalid", wallet.address)))?;

    let (usdc, pol) = tokio::try_join!(
      self.chain.erc20_balance(self.contracts.usdc, owner),
      self.chain.native_balance(owner),
    )?;

    Ok(WalletBalances {
      address: wallet.address.clone(),
      usdc_balance: to_decimal(usdc, USDC_DECIMALS)?,
      pol_balance: to_decimal(pol, POL_DECIMALS)?,
    })
  }

  /// Decrypt the user's wallet and attach it to the vault's chain client.
  ///
  /// # Errors
  /// `UserNotFound` / `WalletNotFound`, or [`decrypt_wallet`] errors.
  pub async fn connected_wallet(&self, user_id: &str) -> Result<ConnectedWallet<C>> {
    let record = self.load(user_id).await?;
    let wallet = record.wallet.as_ref().ok_or_else(|| VaultError::WalletNotFound {
      user_id: user_id.to_string(),
    })?;
    connect_wallet(wallet, Arc::clone(&self.chain), &self.master_key).map_err(|e| self.observe(e))
  }

  /// Bring the user to a trade-ready state and return a signing session.
  ///
  /// Approvals run unless the cached `allowancesSet` flag says they are
  /// done; credentials are decrypted from the record or derived once and
  /// stored with a conditional write.
  ///
  /// # Errors
  /// `WalletNotFound`, `Integrity`, `InsufficientGas`,
  /// `PartialAllowance`, `Timeout`, `ExchangeAuth`, `ExchangeUnavailable`.
  #[instrument(skip(self))]
  pub async fn prepare_trading(&self, user_id: &str) -> Result<TradingSession> {
    let record = self.load(user_id).await?;

    let (wallet_record, allowances_cached, stored_credentials) = match record.lifecycle() {
      WalletLifecycle::NoWallet => {
        return Err(VaultError::WalletNotFound {
          user_id: user_id.to_string(),
        });
      }
      WalletLifecycle::WalletCreated { wallet } => (wallet, false, None),
      WalletLifecycle::CredentialsDerived {
        wallet,
        credentials,
      } => (wallet, false, Some(credentials)),
      WalletLifecycle::AllowancesSet {
        wallet,
        credentials,
      } => (wallet, true, credentials),
    };

    let wallet = decrypt_wallet(wallet_record, &self.master_key).map_err(|e| self.observe(e))?;

    let approval_tx_hashes = if allowances_cached {
      Vec::new()
    } else {
      self.ensure_allowances(user_id, &wallet).await?
    };

    let (credentials, credentials_derived) = match stored_credentials {
      Some(encrypted) => (
        decrypt_credentials(encrypted, &self.master_key).map_err(|e| self.observe(e))?,
        false,
      ),
      None => (self.derive_and_store(user_id, &wallet).await?, true),
    };

    let auth = ClobAuth::new(wallet.checksum_address(), credentials);
    info!(
      address = %wallet.address(),
      approvals = approval_tx_hashes.len(),
      credentials_derived,
      "Trading session ready"
    );

    Ok(TradingSession {
      wallet,
      auth,
      approval_tx_hashes,
      credentials_derived,
    })
  }

  /// Check allowances, grant missing ones and record the cached flag.
  async fn ensure_allowances(&self, user_id: &str, wallet: &SigningWallet) -> Result<Vec<String>> {
    let state = self.allowances.check_allowances(wallet.address()).await?;

    let tx_hashes = if state.is_complete() {
      Vec::new()
    } else {
      let outcome = self.allowances.set_allowances(wallet).await;
      if let Some(metrics) = &self.metrics {
        metrics.allowance_txs.inc_by(outcome.tx_hashes.len() as u64);
      }
      outcome.into_result().map_err(|e| self.observe(e))?
    };

    self
      .store
      .update(user_id, UserUpdate::allowances_set())
      .await?;
    Ok(tx_hashes)
  }

  /// Derive credentials and store them unless another request won the race,
  /// in which case the stored set is used.
  async fn derive_and_store(&self, user_id: &str, wallet: &SigningWallet) -> Result<ExchangeCredentials> {
    let credentials = match derive_api_credentials(self.exchange.as_ref(), wallet).await {
      Ok(credentials) => credentials,
      Err(e) => {
        self.count_derivation("failed");
        return Err(e);
      }
    };
    let encrypted = encrypt_credentials(&credentials, &self.master_key)?;

    if self
      .store
      .store_credentials_if_absent(user_id, encrypted)
      .await?
    {
      self.count_derivation("stored");
      return Ok(credentials);
    }

    warn!("Concurrent credential derivation detected, using stored credentials");
    self.count_derivation("race_lost");
    let winner: EncryptedCredentials = self
      .load(user_id)
      .await?
      .polymarket_creds
      .ok_or_else(|| VaultError::Store("credentials vanished after conditional write".to_string()))?;
    decrypt_credentials(&winner, &self.master_key).map_err(|e| self.observe(e))
  }

  async fn load(&self, user_id: &str) -> Result<UserRecord> {
    self
      .store
      .get(user_id)
      .await?
      .ok_or_else(|| VaultError::UserNotFound {
        user_id: user_id.to_string(),
      })
  }

  fn count_derivation(&self, outcome: &str) {
    if let Some(metrics) = &self.metrics {
      metrics
        .credential_derivations
        .with_label_values(&[outcome])
        .inc();
    }
  }

  fn observe(&self, err: VaultError) -> VaultError {
    if let Some(metrics) = &self.metrics {
      metrics.observe_error(&err);
    }
    err
  }
}

/// Base units to an exact decimal amount.
fn to_decimal(amount: U256, decimals: u32) -> Result<Decimal> {
  let raw = i128::try_from(amount)
    .map_err(|_| VaultError::Chain(format!("balance {amount} out of range")))?;
  Decimal::try_from_i128_with_scale(raw, decimals)
    .map(|d| d.normalize())
    .map_err(|_| VaultError::Chain(format!("balance {amount} out of range")))
}
