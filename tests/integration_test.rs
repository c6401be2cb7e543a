//! Integration Tests - End-to-end Vault Component Testing
//!
//! Tests the interaction between usecases, ports, and mock adapters.
//! Uses mockall for trait mocking, the in-memory user store, and
//! tokio::test for async tests.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use chrono::Utc;
use mockall::mock;
use rust_decimal_macros::dec;

use polymarket_custody_vault::adapters::persistence::MemoryUserStore;
use polymarket_custody_vault::config::ContractConfig;
use polymarket_custody_vault::crypto::{keys, MasterKey, SigningWallet};
use polymarket_custody_vault::domain::{
    ContractAddresses, EncryptedCredentials, EncryptedWalletRecord, ExchangeCredentials,
    UserRecord, UserUpdate,
};
use polymarket_custody_vault::error::{Result, VaultError};
use polymarket_custody_vault::ports::{ChainClient, ExchangeAuth, UserStore};
use polymarket_custody_vault::usecases::exchange_credentials::encrypt_credentials;
use polymarket_custody_vault::usecases::{AllowanceManager, CredentialVault};

// ---- Mock Definitions ----

mock! {
    pub Chain {}

    #[async_trait]
    impl ChainClient for Chain {
        async fn erc20_allowance(&self, token: Address, owner: Address, spender: Address)
            -> Result<U256>;
        async fn erc20_balance(&self, token: Address, owner: Address) -> Result<U256>;
        async fn is_approved_for_all(&self, token: Address, owner: Address, operator: Address)
            -> Result<bool>;
        async fn native_balance(&self, owner: Address) -> Result<U256>;
        async fn gas_price(&self) -> Result<u128>;
        async fn has_code(&self, address: Address) -> Result<bool>;
        async fn approve(
            &self,
            wallet: &SigningWallet,
            token: Address,
            spender: Address,
            amount: U256,
        ) -> Result<String>;
        async fn set_approval_for_all(
            &self,
            wallet: &SigningWallet,
            token: Address,
            operator: Address,
            approved: bool,
        ) -> Result<String>;
        async fn is_healthy(&self) -> bool;
    }
}

mock! {
    pub Exchange {}

    #[async_trait]
    impl ExchangeAuth for Exchange {
        async fn create_or_derive_api_key(&self, wallet: &SigningWallet)
            -> Result<ExchangeCredentials>;
    }
}

// ---- Helpers ----

const GAS_PRICE_WEI: u128 = 30_000_000_000;

fn master_key() -> MasterKey {
    MasterKey::new("test-master-key").unwrap()
}

fn contracts() -> ContractAddresses {
    ContractConfig::default().addresses().unwrap()
}

fn vault(
    store: Arc<MemoryUserStore>,
    exchange: MockExchange,
    chain: MockChain,
) -> CredentialVault<MemoryUserStore, MockExchange, MockChain> {
    CredentialVault::new(
        store,
        Arc::new(exchange),
        Arc::new(chain),
        contracts(),
        master_key(),
    )
}

fn credentials() -> ExchangeCredentials {
    ExchangeCredentials::new(
        "api-key-1",
        "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=",
        "pass-1",
    )
}

/// Chain where nothing is approved yet and the wallet holds `pol` wei.
fn unapproved_chain(pol: U256) -> MockChain {
    let mut chain = MockChain::new();
    chain
        .expect_erc20_allowance()
        .returning(|_, _, _| Ok(U256::ZERO));
    chain
        .expect_is_approved_for_all()
        .returning(|_, _, _| Ok(false));
    chain.expect_native_balance().returning(move |_| Ok(pol));
    chain.expect_gas_price().returning(|| Ok(GAS_PRICE_WEI));
    chain
}

/// Chain where every approval is already granted.
fn approved_chain() -> MockChain {
    let mut chain = MockChain::new();
    chain
        .expect_erc20_allowance()
        .returning(|_, _, _| Ok(U256::MAX));
    chain
        .expect_is_approved_for_all()
        .returning(|_, _, _| Ok(true));
    chain
}

fn test_wallet() -> SigningWallet {
    SigningWallet::from_private_key(&keys::generate().unwrap().private_key).unwrap()
}

fn one_pol() -> U256 {
    U256::from(1_000_000_000_000_000_000u128)
}

async fn stored_wallet(store: &MemoryUserStore, user_id: &str) -> EncryptedWalletRecord {
    store
        .get(user_id)
        .await
        .unwrap()
        .and_then(|r| r.wallet)
        .unwrap()
}

// ---- Signup ----

#[tokio::test]
async fn test_signup_is_one_shot() {
    let store = Arc::new(MemoryUserStore::new());
    let vault = vault(Arc::clone(&store), MockExchange::new(), MockChain::new());

    let address = vault
        .signup("user-1", Some("a@example.com".to_string()))
        .await
        .unwrap();
    assert!(address.starts_with("0x"));
    assert_eq!(address.len(), 42);

    let second = vault.signup("user-1", None).await;
    assert!(matches!(second, Err(VaultError::AlreadyExists { .. })));
    assert_eq!(stored_wallet(&store, "user-1").await.address, address);
}

#[tokio::test]
async fn test_signup_attaches_wallet_to_existing_document() {
    let store = Arc::new(MemoryUserStore::new());
    store
        .create(UserRecord {
            id: "user-2".to_string(),
            email: Some("b@example.com".to_string()),
            created_at: Utc::now(),
            wallet: None,
            polymarket_creds: None,
            allowances_set: false,
        })
        .await
        .unwrap();

    let vault = vault(Arc::clone(&store), MockExchange::new(), MockChain::new());
    let address = vault.signup("user-2", None).await.unwrap();

    let record = store.get("user-2").await.unwrap().unwrap();
    assert_eq!(record.email.as_deref(), Some("b@example.com"));
    assert_eq!(record.wallet.unwrap().address, address);
}

#[tokio::test]
async fn test_reconnect_yields_same_address() {
    let store = Arc::new(MemoryUserStore::new());
    let vault = vault(Arc::clone(&store), MockExchange::new(), MockChain::new());
    let address = vault.signup("user-3", None).await.unwrap();

    let first = vault.connected_wallet("user-3").await.unwrap();
    let second = vault.connected_wallet("user-3").await.unwrap();
    assert_eq!(first.wallet().checksum_address(), address);
    assert_eq!(first.address(), second.address());
}

#[tokio::test]
async fn test_wrong_master_key_is_integrity_error() {
    let store = Arc::new(MemoryUserStore::new());
    let vault_a = vault(Arc::clone(&store), MockExchange::new(), MockChain::new());
    vault_a.signup("user-4", None).await.unwrap();

    let vault_b = CredentialVault::new(
        Arc::clone(&store),
        Arc::new(MockExchange::new()),
        Arc::new(MockChain::new()),
        contracts(),
        MasterKey::new("rotated-master-key").unwrap(),
    );

    let result = vault_b.prepare_trading("user-4").await;
    assert!(matches!(result, Err(VaultError::Integrity)));
}

#[tokio::test]
async fn test_unknown_user_and_missing_wallet() {
    let store = Arc::new(MemoryUserStore::new());
    store
        .create(UserRecord {
            id: "no-wallet".to_string(),
            email: None,
            created_at: Utc::now(),
            wallet: None,
            polymarket_creds: None,
            allowances_set: false,
        })
        .await
        .unwrap();
    let vault = vault(Arc::clone(&store), MockExchange::new(), MockChain::new());

    assert!(matches!(
        vault.prepare_trading("ghost").await,
        Err(VaultError::UserNotFound { .. })
    ));
    assert!(matches!(
        vault.prepare_trading("no-wallet").await,
        Err(VaultError::WalletNotFound { .. })
    ));
    assert!(matches!(
        vault.balances("no-wallet").await,
        Err(VaultError::WalletNotFound { .. })
    ));
}

// ---- Balances ----

#[tokio::test]
async fn test_balances_are_exact_decimals() {
    let mut chain = MockChain::new();
    chain
        .expect_erc20_balance()
        .returning(|_, _| Ok(U256::from(1_500_000u64)));
    chain
        .expect_native_balance()
        .returning(|_| Ok(U256::from(2_250_000_000_000_000_000u128)));

    let store = Arc::new(MemoryUserStore::new());
    let vault = vault(Arc::clone(&store), MockExchange::new(), chain);
    let address = vault.signup("user-5", None).await.unwrap();

    let balances = vault.balances("user-5").await.unwrap();
    assert_eq!(balances.address, address);
    assert_eq!(balances.usdc_balance, dec!(1.5));
    assert_eq!(balances.pol_balance, dec!(2.25));
}

// ---- Allowances ----

#[tokio::test]
async fn test_fresh_wallet_has_no_allowances() {
    let manager = AllowanceManager::new(Arc::new(unapproved_chain(one_pol())), contracts());
    let wallet = test_wallet();

    let state = manager.check_allowances(wallet.address()).await.unwrap();
    assert!(!state.ctf);
    assert!(!state.usdc);
    assert!(!state.is_complete());
}

#[tokio::test]
async fn test_set_allowances_is_idempotent() {
    let mut chain = approved_chain();
    chain.expect_approve().times(0);
    chain.expect_set_approval_for_all().times(0);
    chain.expect_native_balance().times(0);

    let manager = AllowanceManager::new(Arc::new(chain), contracts());
    let wallet = test_wallet();

    let outcome = manager.set_allowances(&wallet).await;
    assert!(outcome.success);
    assert!(outcome.tx_hashes.is_empty());
}

#[tokio::test]
async fn test_set_allowances_submits_six_approvals_in_order() {
    let contracts = contracts();
    let mut chain = unapproved_chain(one_pol());
    let mut seq = mockall::Sequence::new();
    for (i, (_, spender)) in contracts.exchange_spenders().into_iter().enumerate() {
        chain
            .expect_approve()
            .withf(move |_, token, s, amount| {
                *token == contracts.usdc && *s == spender && *amount == U256::MAX
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_, _, _, _| Ok(format!("0xusdc{i}")));
        chain
            .expect_set_approval_for_all()
            .withf(move |_, token, op, approved| *token == contracts.ctf && *op == spender && *approved)
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_, _, _, _| Ok(format!("0xctf{i}")));
    }

    let manager = AllowanceManager::new(Arc::new(chain), contracts);
    let wallet = test_wallet();

    let outcome = manager.set_allowances(&wallet).await;
    assert!(outcome.success);
    assert_eq!(
        outcome.tx_hashes,
        vec!["0xusdc0", "0xctf0", "0xusdc1", "0xctf1", "0xusdc2", "0xctf2"]
    );
}

#[tokio::test]
async fn test_insufficient_gas_sends_no_transaction() {
    let mut chain = unapproved_chain(U256::ZERO);
    chain.expect_approve().times(0);
    chain.expect_set_approval_for_all().times(0);

    let manager = AllowanceManager::new(Arc::new(chain), contracts());
    let wallet = test_wallet();

    let outcome = manager.set_allowances(&wallet).await;
    assert!(!outcome.success);
    assert!(outcome.tx_hashes.is_empty());
    let err = outcome.into_result().unwrap_err();
    assert!(matches!(err, VaultError::InsufficientGas { .. }));
    assert!(err.to_string().contains("add POL for gas"));
}

#[tokio::test]
async fn test_partial_allowance_keeps_confirmed_hashes() {
    let mut chain = unapproved_chain(one_pol());
    chain
        .expect_approve()
        .times(1)
        .returning(|_, _, _, _| Ok("0x01".to_string()));
    chain
        .expect_set_approval_for_all()
        .times(1)
        .returning(|_, _, _, _| Err(VaultError::Chain("execution reverted".to_string())));

    let store = Arc::new(MemoryUserStore::new());
    let mut exchange = MockExchange::new();
    exchange.expect_create_or_derive_api_key().times(0);
    let vault = vault(Arc::clone(&store), exchange, chain);
    vault.signup("user-6", None).await.unwrap();

    match vault.prepare_trading("user-6").await {
        Err(VaultError::PartialAllowance { tx_hashes, source }) => {
            assert_eq!(tx_hashes, vec!["0x01".to_string()]);
            assert!(matches!(*source, VaultError::Chain(_)));
        }
        other => panic!("expected PartialAllowance, got {other:?}"),
    }

    let record = store.get("user-6").await.unwrap().unwrap();
    assert!(!record.allowances_set);
    assert!(record.polymarket_creds.is_none());
}

#[tokio::test]
async fn test_confirmation_timeout_mid_sequence_is_partial() {
    let mut chain = unapproved_chain(one_pol());
    chain
        .expect_approve()
        .times(1)
        .returning(|_, _, _, _| Ok("0x01".to_string()));
    chain
        .expect_set_approval_for_all()
        .times(1)
        .returning(|_, _, _, _| {
            Err(VaultError::Timeout {
                operation: "setApprovalForAll receipt 0x02".to_string(),
                seconds: 120,
            })
        });

    let store = Arc::new(MemoryUserStore::new());
    let mut exchange = MockExchange::new();
    exchange.expect_create_or_derive_api_key().times(0);
    let vault = vault(Arc::clone(&store), exchange, chain);
    vault.signup("user-12", None).await.unwrap();

    match vault.prepare_trading("user-12").await {
        Err(VaultError::PartialAllowance { tx_hashes, source }) => {
            assert_eq!(tx_hashes, vec!["0x01".to_string()]);
            assert!(matches!(*source, VaultError::Timeout { seconds: 120, .. }));
        }
        other => panic!("expected PartialAllowance, got {other:?}"),
    }
    assert!(!store.get("user-12").await.unwrap().unwrap().allowances_set);
}

#[tokio::test]
async fn test_gas_exhausted_mid_sequence_stays_user_error() {
    let mut chain = unapproved_chain(one_pol());
    chain
        .expect_approve()
        .times(1)
        .returning(|_, _, _, _| Ok("0x01".to_string()));
    chain
        .expect_set_approval_for_all()
        .times(1)
        .returning(|wallet, _, _, _| {
            Err(VaultError::InsufficientGas {
                address: wallet.checksum_address(),
                detail: "setApprovalForAll rejected by node: insufficient funds".to_string(),
            })
        });

    let store = Arc::new(MemoryUserStore::new());
    let vault = vault(Arc::clone(&store), MockExchange::new(), chain);
    vault.signup("user-13", None).await.unwrap();

    let err = vault.prepare_trading("user-13").await.unwrap_err();
    assert!(matches!(err, VaultError::PartialAllowance { .. }));
    assert!(err.is_user_error());
    assert!(!err.is_retryable());
    assert!(!err.is_fatal());
}

// ---- Trading session ----

#[tokio::test]
async fn test_credentials_derived_once_across_sessions() {
    let mut chain = unapproved_chain(one_pol());
    chain
        .expect_approve()
        .times(3)
        .returning(|_, _, _, _| Ok("0xaa".to_string()));
    chain
        .expect_set_approval_for_all()
        .times(3)
        .returning(|_, _, _, _| Ok("0xbb".to_string()));

    let mut exchange = MockExchange::new();
    exchange
        .expect_create_or_derive_api_key()
        .times(1)
        .returning(|_| Ok(credentials()));

    let store = Arc::new(MemoryUserStore::new());
    let vault = vault(Arc::clone(&store), exchange, chain);
    let address = vault.signup("user-7", None).await.unwrap();

    let first = vault.prepare_trading("user-7").await.unwrap();
    assert!(first.credentials_derived);
    assert_eq!(first.approval_tx_hashes.len(), 6);
    assert_eq!(first.auth.address(), address);
    assert_eq!(first.auth.api_key(), "api-key-1");

    let record = store.get("user-7").await.unwrap().unwrap();
    assert!(record.allowances_set);
    assert!(record.lifecycle().is_trade_ready());
    let stored = record.polymarket_creds.unwrap();
    assert!(!stored.encrypted_api_key.contains("api-key-1"));

    let second = vault.prepare_trading("user-7").await.unwrap();
    assert!(!second.credentials_derived);
    assert!(second.approval_tx_hashes.is_empty());
    assert_eq!(second.auth.api_key(), "api-key-1");
}

#[tokio::test]
async fn test_allowances_granted_elsewhere_only_set_flag() {
    let mut chain = approved_chain();
    chain.expect_approve().times(0);

    let mut exchange = MockExchange::new();
    exchange
        .expect_create_or_derive_api_key()
        .times(1)
        .returning(|_| Ok(credentials()));

    let store = Arc::new(MemoryUserStore::new());
    let vault = vault(Arc::clone(&store), exchange, chain);
    vault.signup("user-8", None).await.unwrap();

    let session = vault.prepare_trading("user-8").await.unwrap();
    assert!(session.approval_tx_hashes.is_empty());
    assert!(store.get("user-8").await.unwrap().unwrap().allowances_set);
}

#[tokio::test]
async fn test_exchange_auth_error_propagates_and_stores_nothing() {
    let mut exchange = MockExchange::new();
    exchange
        .expect_create_or_derive_api_key()
        .times(1)
        .returning(|_| Err(VaultError::ExchangeAuth("401 Unauthorized".to_string())));

    let store = Arc::new(MemoryUserStore::new());
    let vault = vault(Arc::clone(&store), exchange, MockChain::new());
    vault.signup("user-9", None).await.unwrap();
    store
        .update("user-9", UserUpdate::allowances_set())
        .await
        .unwrap();

    let result = vault.prepare_trading("user-9").await;
    assert!(matches!(result, Err(VaultError::ExchangeAuth(_))));
    assert!(store.get("user-9").await.unwrap().unwrap().polymarket_creds.is_none());
}

#[tokio::test]
async fn test_incomplete_credentials_are_rejected() {
    let mut exchange = MockExchange::new();
    exchange
        .expect_create_or_derive_api_key()
        .returning(|_| Ok(ExchangeCredentials::new("key", "", "pass")));

    let store = Arc::new(MemoryUserStore::new());
    let vault = vault(Arc::clone(&store), exchange, MockChain::new());
    vault.signup("user-10", None).await.unwrap();
    store
        .update("user-10", UserUpdate::allowances_set())
        .await
        .unwrap();

    assert!(matches!(
        vault.prepare_trading("user-10").await,
        Err(VaultError::ExchangeAuth(_))
    ));
}

/// Store that lets a competing request win the credential write.
struct RacingStore {
    inner: MemoryUserStore,
    winner: EncryptedCredentials,
}

#[async_trait]
impl UserStore for RacingStore {
    async fn get(&self, user_id: &str) -> Result<Option<UserRecord>> {
        self.inner.get(user_id).await
    }

    async fn create(&self, record: UserRecord) -> Result<()> {
        self.inner.create(record).await
    }

    async fn update(&self, user_id: &str, update: UserUpdate) -> Result<()> {
        self.inner.update(user_id, update).await
    }

    async fn set_wallet_if_absent(
        &self,
        user_id: &str,
        wallet: EncryptedWalletRecord,
    ) -> Result<bool> {
        self.inner.set_wallet_if_absent(user_id, wallet).await
    }

    async fn store_credentials_if_absent(
        &self,
        user_id: &str,
        credentials: EncryptedCredentials,
    ) -> Result<bool> {
        self.inner
            .store_credentials_if_absent(user_id, self.winner.clone())
            .await?;
        self.inner
            .store_credentials_if_absent(user_id, credentials)
            .await
    }
}

#[tokio::test]
async fn test_race_loser_uses_stored_credentials() {
    let winner = ExchangeCredentials::new("winner-key", "d2lubmVy", "winner-pass");
    let store = Arc::new(RacingStore {
        inner: MemoryUserStore::new(),
        winner: encrypt_credentials(&winner, &master_key()).unwrap(),
    });

    let mut exchange = MockExchange::new();
    exchange
        .expect_create_or_derive_api_key()
        .times(1)
        .returning(|_| Ok(credentials()));

    let vault = CredentialVault::new(
        Arc::clone(&store),
        Arc::new(exchange),
        Arc::new(MockChain::new()),
        contracts(),
        master_key(),
    );
    vault.signup("user-11", None).await.unwrap();
    store
        .update("user-11", UserUpdate::allowances_set())
        .await
        .unwrap();

    let session = vault.prepare_trading("user-11").await.unwrap();
    assert_eq!(session.auth.api_key(), "winner-key");
}
