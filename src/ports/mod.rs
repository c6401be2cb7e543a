//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `UserStore`: per-user document persistence
//! - `ExchangeAuth`: CLOB API credential issuance
//! - `ChainClient`: Polygon reads and approval transactions

pub mod chain_client;
pub mod exchange;
pub mod user_store;

pub use chain_client::ChainClient;
pub use exchange::ExchangeAuth;
pub use user_store::UserStore;
