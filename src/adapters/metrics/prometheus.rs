//! Prometheus Metrics Registry - Vault Observability
//!
//! Counters for the events an operator pages on: integrity failures
//! (master key mismatch or corrupted records), exchange auth rejections
//! and allowance failures by reason. Served at `/metrics`.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::error::VaultError;

/// Centralized Prometheus metrics for the vault.
///
/// All metrics follow the naming convention `custody_vault_*`.
pub struct VaultMetrics {
    /// Prometheus registry.
    registry: Registry,
    /// Wallets generated and persisted at signup.
    pub wallets_created: IntCounter,
    /// Decrypts that failed tag verification.
    pub integrity_failures: IntCounter,
    /// Credential derivations by outcome (stored, race_lost, failed).
    pub credential_derivations: IntCounterVec,
    /// Approval transactions confirmed on-chain.
    pub allowance_txs: IntCounter,
    /// Failed allowance runs by reason.
    pub allowance_failures: IntCounterVec,
}

impl VaultMetrics {
    /// Create and register all Prometheus metrics.
    ///
    /// # Errors
    /// Registration errors (duplicate names) from the prometheus crate.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let wallets_created = IntCounter::new(
            "custody_vault_wallets_created_total",
            "Custodial wallets generated at signup",
        )?;

        let integrity_failures = IntCounter::new(
            "custody_vault_integrity_failures_total",
            "Decrypts rejected by AEAD tag verification",
        )?;

        let credential_derivations = IntCounterVec::new(
            Opts::new(
                "custody_vault_credential_derivations_total",
                "Exchange credential derivations by outcome",
            ),
            &["outcome"],
        )?;

        let allowance_txs = IntCounter::new(
            "custody_vault_allowance_txs_total",
            "Approval transactions confirmed on-chain",
        )?;

        let allowance_failures = IntCounterVec::new(
            Opts::new(
                "custody_vault_allowance_failures_total",
                "Allowance runs that did not complete, by reason",
            ),
            &["reason"],
        )?;

        // Register all metrics
        registry.register(Box::new(wallets_created.clone()))?;
        registry.register(Box::new(integrity_failures.clone()))?;
        registry.register(Box::new(credential_derivations.clone()))?;
        registry.register(Box::new(allowance_txs.clone()))?;
        registry.register(Box::new(allowance_failures.clone()))?;

        Ok(Self {
            registry,
            wallets_created,
            integrity_failures,
            credential_derivations,
            allowance_txs,
            allowance_failures,
        })
    }

    /// Count an error if it is one the vault tracks.
    pub fn observe_error(&self, err: &VaultError) {
        match err {
            VaultError::Integrity => self.integrity_failures.inc(),
            VaultError::InsufficientGas { .. } => {
                self.allowance_failures.with_label_values(&["insufficient_gas"]).inc();
            }
            VaultError::PartialAllowance { .. } => {
                self.allowance_failures.with_label_values(&["partial"]).inc();
            }
            VaultError::Timeout { .. } => {
                self.allowance_failures.with_label_values(&["timeout"]).inc();
            }
            _ => {}
        }
    }

    /// Text exposition of every registered metric.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if encoder.encode(&metric_families, &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_counters() {
        let metrics = VaultMetrics::new().unwrap();
        metrics.wallets_created.inc();
        metrics.observe_error(&VaultError::Integrity);
        metrics.observe_error(&VaultError::InsufficientGas {
            address: "0x0".into(),
            detail: "empty".into(),
        });

        let text = metrics.render();
        assert!(text.contains("custody_vault_wallets_created_total 1"));
        assert!(text.contains("custody_vault_integrity_failures_total 1"));
        assert!(text.contains(r#"reason="insufficient_gas""#));
    }
}
