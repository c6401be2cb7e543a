//! Persistence Adapters - User Record Stores
//!
//! Implements the `UserStore` port with one atomic JSON document per
//! user on disk, plus an in-memory map for tests and local runs.
//! No database dependency.

pub mod json_store;
pub mod memory_store;

pub use json_store::JsonUserStore;
pub use memory_store::MemoryUserStore;
