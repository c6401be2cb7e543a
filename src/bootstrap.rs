//! Service Bootstrap - Explicit Process-wide Wiring
//!
//! `init` builds the user store, chain client, exchange client and metrics
//! once at process start and returns a `Handle` that owns them. Components
//! receive what they need from the handle; there is no lazy global state.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::adapters::api::{ClobClient, ClobClientConfig};
use crate::adapters::chain::PolygonChain;
use crate::adapters::metrics::{HealthState, VaultMetrics};
use crate::adapters::persistence::JsonUserStore;
use crate::config::AppConfig;
use crate::crypto::MasterKey;
use crate::domain::{ContractAddresses, EncryptedWalletRecord};
use crate::usecases::{connect_wallet, ConnectedWallet, CredentialVault};

/// The vault as wired for production.
pub type ServiceVault = CredentialVault<JsonUserStore, ClobClient, PolygonChain>;

/// Everything initialized at startup.
pub struct Handle {
    pub config: AppConfig,
    pub contracts: ContractAddresses,
    pub store: Arc<JsonUserStore>,
    pub chain: Arc<PolygonChain>,
    pub exchange: Arc<ClobClient>,
    pub metrics: Arc<VaultMetrics>,
    pub health: Arc<HealthState>,
    pub vault: Arc<ServiceVault>,
}

/// Build every component from a validated config and the master key.
///
/// Performs no network calls; chain and contract checks run separately
/// so tests can wire a handle against unreachable endpoints.
///
/// # Errors
/// Invalid addresses or URLs, or an unusable data directory.
pub async fn init(config: AppConfig, master_key: MasterKey) -> Result<Handle> {
    let contracts = config
        .contracts
        .addresses()
        .context("Invalid contract addresses")?;

    let store = Arc::new(
        JsonUserStore::new(&config.store.data_dir)
            .await
            .context("Failed to open user store")?,
    );

    let chain = Arc::new(
        PolygonChain::new(
            &config.chain.rpc_url,
            Duration::from_secs(config.chain.confirmation_timeout_seconds),
        )
        .context("Failed to create Polygon client")?,
    );

    let exchange = Arc::new(
        ClobClient::new(ClobClientConfig {
            base_url: config.exchange.clob_url.clone(),
            chain_id: config.chain.chain_id,
            timeout: Duration::from_secs(config.exchange.timeout_seconds),
            max_retries: config.exchange.max_retries,
            requests_per_minute: config.exchange.requests_per_minute,
            ..ClobClientConfig::default()
        })
        .context("Failed to create CLOB client")?,
    );

    let metrics = Arc::new(VaultMetrics::new().context("Failed to register metrics")?);
    let health = Arc::new(HealthState::new());

    let vault = Arc::new(
        CredentialVault::new(
            Arc::clone(&store),
            Arc::clone(&exchange),
            Arc::clone(&chain),
            contracts,
            master_key,
        )
        .with_metrics(Arc::clone(&metrics)),
    );

    info!(
        rpc = %config.chain.rpc_url,
        clob = %config.exchange.clob_url,
        data_dir = %config.store.data_dir,
        "Vault components initialized"
    );

    Ok(Handle {
        config,
        contracts,
        store,
        chain,
        exchange,
        metrics,
        health,
        vault,
    })
}

/// Decrypt a stored wallet and attach it to a fresh provider for `rpc_url`.
///
/// # Errors
/// `Configuration` for a bad URL, `Integrity` if the record does not
/// decrypt under `master_key`.
pub fn get_connected_wallet(
    record: &EncryptedWalletRecord,
    rpc_url: &str,
    master_key: &MasterKey,
    confirmation_timeout: Duration,
) -> crate::error::Result<ConnectedWallet<PolygonChain>> {
    let chain = Arc::new(PolygonChain::new(rpc_url, confirmation_timeout)?);
    connect_wallet(record, chain, master_key)
}
