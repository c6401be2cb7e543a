//! Polymarket Custody Vault - Library Root
//!
//! Re-exports all modules for integration tests and benchmarks.

pub mod adapters;
pub mod bootstrap;
pub mod config;
pub mod crypto;
pub mod domain;
pub mod error;
pub mod ports;
pub mod usecases;
