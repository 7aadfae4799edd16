//! Payment system
//!
//! Accounts, authentication and an atomic funds transfer ledger behind an
//! HTTP gateway.
//!
//! # Modules
//!
//! - [`money`] - `Amount` and `Balance` decimal types
//! - [`account`] - Account records, identifiers, number assignment
//! - [`ledger`] - Transfer records and per-account direction
//! - [`store`] - Store traits, in-memory and PostgreSQL implementations
//! - [`db`] - PostgreSQL pool and schema
//! - [`transfer`] - Transfer engine and balance invariant
//! - [`user_auth`] - Registration, login guard, JWT
//! - [`gateway`] - axum HTTP surface

pub mod account;
pub mod config;
pub mod db;
pub mod gateway;
pub mod ledger;
pub mod logging;
pub mod money;
pub mod store;
pub mod transfer;
pub mod user_auth;

// Convenient re-exports at crate root
pub use account::{Account, AccountId, AccountNumber, Role};
pub use ledger::{Direction, TransactionRecord};
pub use money::{Amount, Balance, MoneyError};
pub use store::{MemoryStore, PgStore, StoreError, TransactionalStore};
pub use transfer::{TransferEngine, TransferError};
pub use user_auth::{AuthError, UserAuthService};
