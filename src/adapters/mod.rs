//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP clients, blockchain RPC, file I/O) and
//! serves the vault over HTTP. Each sub-module groups adapters by
//! infrastructure concern.
//!
//! Adapter categories:
//! - `api`: Polymarket CLOB credential issuance and L1 auth
//! - `chain`: Polygon blockchain interaction via alloy-rs
//! - `metrics`: Prometheus metrics export and health checks
//! - `persistence`: JSON user documents and an in-memory store
//! - `server`: vault routes for the backend-for-frontend

pub mod api;
pub mod chain;
pub mod metrics;
pub mod persistence;
pub mod server;
