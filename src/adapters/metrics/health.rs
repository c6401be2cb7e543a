//! Health Check Routes - Liveness, Readiness and Metrics
//!
//! `/live` answers as long as the process runs. `/ready` reflects the
//! last RPC and store probes, refreshed by a background task in `main`.
//! `/metrics` serves the Prometheus text format.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use super::prometheus::VaultMetrics;

/// Shared health state polled by readiness probes.
#[derive(Debug)]
pub struct HealthState {
    /// Whether the last RPC probe succeeded.
    pub chain_healthy: AtomicBool,
    /// Whether the user store is accessible.
    pub store_healthy: AtomicBool,
}

impl HealthState {
    /// Create a new health state (not ready until the first probe).
    pub const fn new() -> Self {
        Self {
            chain_healthy: AtomicBool::new(false),
            store_healthy: AtomicBool::new(false),
        }
    }

    pub fn set_chain_healthy(&self, healthy: bool) {
        self.chain_healthy.store(healthy, Ordering::Relaxed);
    }

    pub fn set_store_healthy(&self, healthy: bool) {
        self.store_healthy.store(healthy, Ordering::Relaxed);
    }

    /// Check if the service is ready to serve traffic.
    pub fn is_ready(&self) -> bool {
        self.chain_healthy.load(Ordering::Relaxed) && self.store_healthy.load(Ordering::Relaxed)
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
struct ProbeState {
    health: Arc<HealthState>,
    metrics: Arc<VaultMetrics>,
}

/// Router for `/live`, `/ready` and `/metrics`.
pub fn routes(health: Arc<HealthState>, metrics: Arc<VaultMetrics>) -> Router {
    Router::new()
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
        .route("/metrics", get(render_metrics))
        .with_state(ProbeState { health, metrics })
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Readiness probe: returns 200 only if RPC and store are healthy.
async fn readiness(State(state): State<ProbeState>) -> impl IntoResponse {
    if state.health.is_ready() {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

async fn render_metrics(State(state): State<ProbeState>) -> impl IntoResponse {
    state.metrics.render()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_requires_both_probes() {
        let health = HealthState::new();
        assert!(!health.is_ready());
        health.set_chain_healthy(true);
        assert!(!health.is_ready());
        health.set_store_healthy(true);
        assert!(health.is_ready());
    }
}
