//! Polymarket Custody Vault - Entry Point
//!
//! Initializes configuration, logging, the master key and the vault
//! components, verifies the chain, then serves the vault API until
//! SIGINT.
//!
//! Wiring sequence:
//! 1. Load config.toml (+ env overrides) and validate
//! 2. Init tracing (JSON structured logging)
//! 3. Read ENCRYPTION_MASTER_KEY (startup aborts without it)
//! 4. Build store, Polygon client, CLOB client, metrics, vault
//! 5. Verify chain id and contract deployments
//! 6. Spawn health prober (RPC + store → /ready)
//! 7. Serve vault API + /live /ready /metrics
//! 8. Wait for SIGINT → graceful shutdown

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

use polymarket_custody_vault::adapters::chain::{ContractValidator, PolygonChain};
use polymarket_custody_vault::adapters::persistence::JsonUserStore;
use polymarket_custody_vault::adapters::{metrics, server};
use polymarket_custody_vault::bootstrap::{self, Handle};
use polymarket_custody_vault::config;
use polymarket_custody_vault::crypto::MasterKey;
use polymarket_custody_vault::ports::ChainClient;

const HEALTH_PROBE_INTERVAL: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("VAULT_CONFIG").ok())
        .unwrap_or_else(|| "config.toml".to_string());
    let config = config::loader::load_config(&config_path)
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.service.log_level)
                }),
        )
        .json()
        .init();

    info!(
        name = %config.service.name,
        version = env!("CARGO_PKG_VERSION"),
        chain_id = config.chain.chain_id,
        "Starting Polymarket Custody Vault"
    );

    // ── 3. Master key (required, never defaulted) ───────────
    let master_key = MasterKey::from_env().context("Encryption master key unavailable")?;

    // ── 4. Wire components ──────────────────────────────────
    let handle = bootstrap::init(config, master_key).await?;

    // ── 5. Verify chain and contracts ───────────────────────
    handle
        .chain
        .verify_chain_id(handle.config.chain.chain_id)
        .await
        .context("Chain id verification failed")?;
    ContractValidator::new(Arc::clone(&handle.chain))
        .validate_all(&handle.contracts)
        .await
        .context("Contract validation failed")?;

    if !handle.exchange.health_check().await {
        warn!(clob = %handle.config.exchange.clob_url, "CLOB not reachable at startup");
    }

    // ── 6. Health prober ────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let probe_handle = tokio::spawn(run_health_probe(
        HandleProbe::from(&handle),
        shutdown_rx,
    ));

    // ── 7. Serve vault API + probes ─────────────────────────
    let app = server::routes(Arc::clone(&handle.vault)).merge(metrics::health::routes(
        Arc::clone(&handle.health),
        Arc::clone(&handle.metrics),
    ));

    let listener = tokio::net::TcpListener::bind(&handle.config.service.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", handle.config.service.bind_address))?;
    info!(address = %handle.config.service.bind_address, "Vault API listening");

    // ── 8. Serve until SIGINT ───────────────────────────────
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if signal::ctrl_c().await.is_ok() {
                info!("SIGINT received, initiating graceful shutdown");
            }
            let _ = shutdown_tx.send(true);
        })
        .await
        .context("Vault API server failed")?;

    let _ = tokio::time::timeout(Duration::from_secs(5), probe_handle).await;
    info!("Shutdown complete");
    Ok(())
}

/// Components the health prober polls.
struct HandleProbe {
    chain: Arc<PolygonChain>,
    store: Arc<JsonUserStore>,
    health: Arc<metrics::HealthState>,
}

impl From<&Handle> for HandleProbe {
    fn from(handle: &Handle) -> Self {
        Self {
            chain: Arc::clone(&handle.chain),
            store: Arc::clone(&handle.store),
            health: Arc::clone(&handle.health),
        }
    }
}

/// Refresh the readiness flags until shutdown.
async fn run_health_probe(probe: HandleProbe, mut shutdown_rx: watch::Receiver<bool>) {
    let mut interval = tokio::time::interval(HEALTH_PROBE_INTERVAL);
    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.changed() => {
                probe.health.set_chain_healthy(false);
                info!("Health prober stopped");
                break;
            }
            _ = interval.tick() => {
                let chain_ok = probe.chain.is_healthy().await;
                let store_ok = probe.store.is_healthy().await;
                if !chain_ok {
                    warn!("RPC health probe failed");
                }
                if !store_ok {
                    warn!("User store health probe failed");
                }
                probe.health.set_chain_healthy(chain_ok);
                probe.health.set_store_healthy(store_ok);
            }
        }
    }
}
