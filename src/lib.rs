//! Bank Ledger - accounts, entries and atomic money transfers
//!
//! # Modules
//!
//! - [`core_types`] - ID and amount aliases
//! - [`models`] - Account, Entry, Transfer and operation parameters
//! - [`error`] - Ledger and validation errors
//! - [`currency`] - Supported currency codes
//! - [`store`] - Ledger store contract, PostgreSQL and in-memory backends
//! - [`transfer`] - Transfer coordinator (atomic, deadlock-free money movement)
//! - [`gateway`] - HTTP API
//! - [`db`] - PostgreSQL pool and migrations
//! - [`config`] / [`logging`] - Runtime configuration and tracing setup

// Core types - must be first!
pub mod core_types;

pub mod currency;
pub mod error;
pub mod models;

// Storage and money movement
pub mod db;
pub mod store;
pub mod transfer;

// Service
pub mod config;
pub mod gateway;
pub mod logging;

// Convenient re-exports at crate root
pub use core_types::{AccountId, EntryId, MinorUnits, TransferId};
pub use error::{LedgerError, ValidationError};
pub use models::{Account, Entry, Page, Transfer, TransferParams, TransferResult};
pub use store::{LedgerStore, MemoryLedgerStore, PgLedgerStore, run_in_transaction};
pub use transfer::{TransferCoordinator, TransferPolicy};
