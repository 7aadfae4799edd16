//! Account + Ledger storage
//!
//! The transfer engine never mutates a balance outside of a store
//! transaction. This module defines the contract that makes that possible:
//!
//! - [`AccountStore`]: committed reads and registration inserts
//! - [`LedgerStore`]: append-only transaction history queries
//! - [`TransactionalStore`]: opens a [`StoreTx`], the scoped unit of work
//!
//! # Unit of work
//!
//! ```text
//! begin ─▶ lock_accounts(ascending ids) ─▶ save* ─▶ append* ─▶ commit
//!                                                    │
//!                             any error / drop ──────┴─▶ rollback
//! ```
//!
//! # Safety Invariants
//!
//! 1. **Lock before read-check-write**: an account row is locked before its
//!    balance is read for a decision, and stays locked until commit/rollback
//! 2. **Deterministic lock order**: locks are acquired in ascending
//!    `AccountId` order; a tx may never lock an id below one it already holds
//! 3. **All-or-nothing**: staged saves and appends become visible together
//!    at commit, or not at all
//! 4. **Drop = rollback**: a transaction dropped without `commit` leaves no
//!    trace

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::account::{Account, AccountId, AccountNumber, NewAccount};
use crate::ledger::TransactionRecord;

/// Storage error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Unique constraint violated: {0}")]
    Conflict(&'static str),

    #[error("Account {0} is not locked by this transaction")]
    NotLocked(AccountId),

    #[error("Lock order violation: {requested} requested while holding {held}")]
    LockOrder { requested: AccountId, held: AccountId },

    #[error("Timed out waiting for lock")]
    LockTimeout,

    #[error("Account number space exhausted after {0} attempts")]
    Exhausted(usize),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) => match db.code().as_deref() {
                // unique_violation
                Some("23505") => match db.constraint() {
                    Some(c) if c.contains("email") => StoreError::Conflict("email"),
                    Some(c) if c.contains("account_number") => {
                        StoreError::Conflict("account_number")
                    }
                    _ => StoreError::Conflict("unique"),
                },
                // lock_not_available
                Some("55P03") => StoreError::LockTimeout,
                _ => StoreError::Database(e.to_string()),
            },
            _ => StoreError::Database(e.to_string()),
        }
    }
}

/// Committed account reads and registration inserts.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn get_by_id(&self, id: AccountId) -> Result<Account, StoreError>;

    async fn get_by_account_number(&self, number: AccountNumber)
    -> Result<Account, StoreError>;

    async fn get_by_email(&self, email: &str) -> Result<Account, StoreError>;

    async fn account_number_exists(&self, number: AccountNumber) -> Result<bool, StoreError>;

    /// Insert a new principal.
    ///
    /// # Errors
    /// - `Conflict("email")` / `Conflict("account_number")` on duplicates
    async fn create(&self, new: NewAccount) -> Result<Account, StoreError>;
}

/// Append-only transaction history.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// All records where `number` is payer or recipient, timestamp ascending.
    async fn list_by_account_number(
        &self,
        number: AccountNumber,
    ) -> Result<Vec<TransactionRecord>, StoreError>;
}

/// A store able to open scoped transactions over accounts and ledger.
#[async_trait]
pub trait TransactionalStore: AccountStore + LedgerStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError>;
}

/// Scoped unit of work.
///
/// Reads through a `StoreTx` see the transaction's own staged writes.
#[async_trait]
pub trait StoreTx: Send {
    /// Resolve an account number to its identifier without locking.
    ///
    /// Account numbers are permanent, so the mapping cannot go stale.
    async fn find_id_by_account_number(
        &mut self,
        number: AccountNumber,
    ) -> Result<Option<AccountId>, StoreError>;

    /// Exclusively lock the given accounts and return them, in the order
    /// requested. Locks are taken in ascending id order regardless of the
    /// order of `ids`; duplicates are locked once.
    ///
    /// # Errors
    /// - `NotFound` if any id does not exist
    /// - `LockOrder` if an id is below one already held by this tx
    /// - `LockTimeout` if the wait exceeds the store's lock timeout
    async fn lock_accounts(&mut self, ids: &[AccountId]) -> Result<Vec<Account>, StoreError>;

    /// Stage an upsert of a locked account.
    ///
    /// # Errors
    /// - `NotLocked` if the account was not locked by this tx
    async fn save(&mut self, account: &Account) -> Result<(), StoreError>;

    /// Stage a ledger append.
    async fn append(&mut self, record: &TransactionRecord) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Sort + dedup ids into lock order.
pub(crate) fn lock_order(ids: &[AccountId]) -> Vec<AccountId> {
    let mut ordered = ids.to_vec();
    ordered.sort_unstable();
    ordered.dedup();
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_order_is_direction_independent() {
        let a = AccountId::new(3);
        let b = AccountId::new(9);
        assert_eq!(lock_order(&[a, b]), vec![a, b]);
        assert_eq!(lock_order(&[b, a]), vec![a, b]);
        assert_eq!(lock_order(&[b, b]), vec![b]);
    }

    #[test]
    fn test_display() {
        assert_eq!(StoreError::NotFound.to_string(), "Record not found");
        assert_eq!(
            StoreError::NotLocked(AccountId::new(4)).to_string(),
            "Account 4 is not locked by this transaction"
        );
    }
}
