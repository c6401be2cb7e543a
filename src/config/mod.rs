//! Configuration Module - TOML-based Vault Configuration
//!
//! Loads and validates configuration from `config.toml` with
//! environment variable overrides. Every section has defaults for the
//! Polymarket deployment on Polygon mainnet, so an empty file is a valid
//! configuration. The encryption master key is NOT part of this file;
//! it is read from the environment only (see `crypto::MasterKey`).

pub mod loader;

use alloy::primitives::Address;
use serde::Deserialize;

use crate::domain::ContractAddresses;
use crate::error::VaultError;

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
  #[serde(default)]
  pub service: ServiceConfig,
  /// Polygon JSON-RPC settings.
  #[serde(default)]
  pub chain: ChainConfig,
  /// Token and exchange contract addresses.
  #[serde(default)]
  pub contracts: ContractConfig,
  /// Polymarket CLOB endpoint.
  #[serde(default)]
  pub exchange: ExchangeConfig,
  /// User record store.
  #[serde(default)]
  pub store: StoreConfig,
}

/// Service identity and HTTP bind address.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
  #[serde(default = "default_service_name")]
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Bind address for the vault API, health and metrics endpoints.
  #[serde(default = "default_bind_address")]
  pub bind_address: String,
}

/// Chain connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
  #[serde(default = "default_rpc_url")]
  pub rpc_url: String,
  /// Expected chain id (137 = Polygon mainnet).
  #[serde(default = "default_chain_id")]
  pub chain_id: u64,
  /// Deadline for each approval transaction to be mined.
  #[serde(default = "default_confirmation_timeout")]
  pub confirmation_timeout_seconds: u64,
}

/// Contract addresses, checksummed hex strings.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractConfig {
  /// USDC.e collateral token (ERC-20, 6 decimals).
  #[serde(default = "default_usdc")]
  pub usdc: String,
  /// Conditional Token Framework (ERC-1155).
  #[serde(default = "default_ctf")]
  pub ctf: String,
  #[serde(default = "default_ctf_exchange")]
  pub ctf_exchange: String,
  #[serde(default = "default_neg_risk_ctf_exchange")]
  pub neg_risk_ctf_exchange: String,
  #[serde(default = "default_neg_risk_adapter")]
  pub neg_risk_adapter: String,
}

impl ContractConfig {
  /// Parse every configured address.
  ///
  /// # Errors
  /// `VaultError::Configuration` naming the first unparsable entry.
  pub fn addresses(&self) -> Result<ContractAddresses, VaultError> {
    Ok(ContractAddresses {
      usdc: parse_address("usdc", &self.usdc)?,
      ctf: parse_address("ctf", &self.ctf)?,
      ctf_exchange: parse_address("ctf_exchange", &self.ctf_exchange)?,
      neg_risk_ctf_exchange: parse_address("neg_risk_ctf_exchange", &self.neg_risk_ctf_exchange)?,
      neg_risk_adapter: parse_address("neg_risk_adapter", &self.neg_risk_adapter)?,
    })
  }
}

fn parse_address(name: &str, value: &str) -> Result<Address, VaultError> {
  value
    .parse()
    .map_err(|e| VaultError::Configuration(format!("invalid {name} address {value:?}: {e}")))
}

/// Polymarket CLOB API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
  #[serde(default = "default_clob_url")]
  pub clob_url: String,
  /// Request timeout in seconds.
  #[serde(default = "default_timeout")]
  pub timeout_seconds: u64,
  /// Retries on 429/5xx/network errors before giving up.
  #[serde(default = "default_max_retries")]
  pub max_retries: u32,
  /// Client-side cap on auth requests.
  #[serde(default = "default_requests_per_minute")]
  pub requests_per_minute: u32,
}

/// User record store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
  /// Directory holding one JSON document per user.
  #[serde(default = "default_data_dir")]
  pub data_dir: String,
}

impl Default for ServiceConfig {
  fn default() -> Self {
    Self {
      name: default_service_name(),
      log_level: default_log_level(),
      bind_address: default_bind_address(),
    }
  }
}

impl Default for ChainConfig {
  fn default() -> Self {
    Self {
      rpc_url: default_rpc_url(),
      chain_id: default_chain_id(),
      confirmation_timeout_seconds: default_confirmation_timeout(),
    }
  }
}

impl Default for ContractConfig {
  fn default() -> Self {
    Self {
      usdc: default_usdc(),
      ctf: default_ctf(),
      ctf_exchange: default_ctf_exchange(),
      neg_risk_ctf_exchange: default_neg_risk_ctf_exchange(),
      neg_risk_adapter: default_neg_risk_adapter(),
    }
  }
}

impl Default for ExchangeConfig {
  fn default() -> Self {
    Self {
      clob_url: default_clob_url(),
      timeout_seconds: default_timeout(),
      max_retries: default_max_retries(),
      requests_per_minute: default_requests_per_minute(),
    }
  }
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self {
      data_dir: default_data_dir(),
    }
  }
}

// Default value functions for serde

fn default_service_name() -> String {
  "polymarket-custody-vault".to_string()
}

fn default_log_level() -> String {
  "info".to_string()
}

fn default_bind_address() -> String {
  "0.0.0.0:8080".to_string()
}

fn default_rpc_url() -> String {
  "https://polygon-rpc.com".to_string()
}

const fn default_chain_id() -> u64 {
  137
}

const fn default_confirmation_timeout() -> u64 {
  120
}

fn default_usdc() -> String {
  "0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174".to_string()
}

fn default_ctf() -> String {
  "0x4D97DCd97eC945f40cF65F87097ACe5EA0476045".to_string()
}

fn default_ctf_exchange() -> String {
  "0x4bFb41d5B3570DeFd03C39a9A4D8dE6Bd8B8982E".to_string()
}

fn default_neg_risk_ctf_exchange() -> String {
  "0xC5d563A36AE78145C45a50134d48A1215220f80a".to_string()
}

fn default_neg_risk_adapter() -> String {
  "0xd91E80cF2E7be2e162c6513ceD06f1dD0dA35296".to_string()
}

fn default_clob_url() -> String {
  "https://clob.polymarket.com".to_string()
}

const fn default_timeout() -> u64 {
  30
}

const fn default_max_retries() -> u32 {
  3
}

const fn default_requests_per_minute() -> u32 {
  60
}

fn default_data_dir() -> String {
  "data".to_string()
}
