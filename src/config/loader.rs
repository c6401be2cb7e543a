//! Configuration Loader - File Loading, Env Overrides and Validation
//!
//! Handles loading `config.toml`, applying the deployment environment
//! overrides and validating every parameter with a clear message.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Upper bound on CLOB retries; backoff doubles per attempt.
pub const MAX_EXCHANGE_RETRIES: u32 = 10;

/// Load, override from the process environment, and validate.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let mut config = parse_config(&content)?;
  apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
  validate_config(&config)?;

  info!(
    rpc_url = %config.chain.rpc_url,
    chain_id = config.chain.chain_id,
    clob_url = %config.exchange.clob_url,
    data_dir = %config.store.data_dir,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse TOML content. Missing sections and fields take their defaults.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  toml::from_str(content).context("Failed to parse config.toml")
}

/// Apply environment overrides on top of the file values.
///
/// `lookup` abstracts the environment so tests need not mutate it.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<()>
where
  F: Fn(&str) -> Option<String>,
{
  let set = |target: &mut String, key: &str| {
    if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
      *target = value;
    }
  };

  set(&mut config.chain.rpc_url, "POLYGON_RPC_URL");
  set(&mut config.exchange.clob_url, "POLYMARKET_CLOB_URL");
  set(&mut config.contracts.usdc, "USDC_ADDRESS");
  set(&mut config.contracts.ctf, "CTF_ADDRESS");
  set(&mut config.contracts.ctf_exchange, "CTF_EXCHANGE");
  set(&mut config.contracts.neg_risk_ctf_exchange, "NEG_RISK_CTF_EXCHANGE");
  set(&mut config.contracts.neg_risk_adapter, "NEG_RISK_ADAPTER");

  if let Some(raw) = lookup("POLYGON_CHAIN_ID").filter(|v| !v.is_empty()) {
    config.chain.chain_id = raw
      .parse()
      .with_context(|| format!("POLYGON_CHAIN_ID is not a number: {raw}"))?;
  }

  Ok(())
}

/// Validate all configuration parameters.
pub fn validate_config(config: &AppConfig) -> Result<()> {
  // Chain validation
  anyhow::ensure!(
    !config.chain.rpc_url.is_empty(),
    "Polygon RPC URL must not be empty"
  );
  anyhow::ensure!(config.chain.chain_id > 0, "chain_id must be positive");
  anyhow::ensure!(
    config.chain.confirmation_timeout_seconds > 0,
    "confirmation_timeout_seconds must be positive"
  );

  // Contract validation
  config.contracts.addresses()?;

  // Exchange validation
  anyhow::ensure!(
    !config.exchange.clob_url.is_empty(),
    "CLOB API URL must not be empty"
  );
  anyhow::ensure!(
    config.exchange.timeout_seconds > 0,
    "exchange timeout_seconds must be positive"
  );
  anyhow::ensure!(
    config.exchange.max_retries <= MAX_EXCHANGE_RETRIES,
    "exchange max_retries must be at most {MAX_EXCHANGE_RETRIES}, got {}",
    config.exchange.max_retries
  );
  anyhow::ensure!(
    config.exchange.requests_per_minute > 0,
    "requests_per_minute must be positive"
  );

  // Store validation
  anyhow::ensure!(
    !config.store.data_dir.is_empty(),
    "store data_dir must not be empty"
  );

  Ok(())
}
