//! In-memory store
//!
//! Committed state lives behind one `RwLock`. Row locks are per-account
//! `tokio::sync::Mutex` values kept in a `DashMap` and held as owned guards
//! by the transaction that acquired them.
//!
//! A transaction stages its writes privately and applies them under a single
//! write lock at commit, so readers only ever see committed state.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use super::{AccountStore, LedgerStore, StoreError, StoreTx, TransactionalStore, lock_order};
use crate::account::{Account, AccountId, AccountNumber, NewAccount};
use crate::ledger::TransactionRecord;

/// Default wait for a row lock before giving up.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct Committed {
    accounts: BTreeMap<AccountId, Account>,
    by_number: HashMap<AccountNumber, AccountId>,
    by_email: HashMap<String, AccountId>,
    ledger: Vec<TransactionRecord>,
    next_id: i64,
}

struct Shared {
    committed: RwLock<Committed>,
    row_locks: DashMap<AccountId, Arc<Mutex<()>>>,
    lock_timeout: Duration,
    fail_next_commit: AtomicBool,
}

impl Shared {
    fn read(&self) -> RwLockReadGuard<'_, Committed> {
        self.committed.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Committed> {
        self.committed.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Shared in-memory account + ledger store
#[derive(Clone)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                committed: RwLock::new(Committed {
                    next_id: 1,
                    ..Default::default()
                }),
                row_locks: DashMap::new(),
                lock_timeout,
                fail_next_commit: AtomicBool::new(false),
            }),
        }
    }

    /// Fault injection: the next `commit` on any transaction fails and the
    /// transaction is rolled back.
    pub fn inject_commit_failure(&self) {
        self.shared.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Total number of ledger records.
    pub fn ledger_len(&self) -> usize {
        self.shared.read().ledger.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn get_by_id(&self, id: AccountId) -> Result<Account, StoreError> {
        self.shared
            .read()
            .accounts
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_account_number(
        &self,
        number: AccountNumber,
    ) -> Result<Account, StoreError> {
        let committed = self.shared.read();
        committed
            .by_number
            .get(&number)
            .and_then(|id| committed.accounts.get(id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> Result<Account, StoreError> {
        let committed = self.shared.read();
        committed
            .by_email
            .get(email)
            .and_then(|id| committed.accounts.get(id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn account_number_exists(&self, number: AccountNumber) -> Result<bool, StoreError> {
        Ok(self.shared.read().by_number.contains_key(&number))
    }

    async fn create(&self, new: NewAccount) -> Result<Account, StoreError> {
        let mut committed = self.shared.write();
        if committed.by_email.contains_key(&new.email) {
            return Err(StoreError::Conflict("email"));
        }
        if committed.by_number.contains_key(&new.account_number) {
            return Err(StoreError::Conflict("account_number"));
        }

        let id = AccountId::new(committed.next_id);
        committed.next_id += 1;

        let account = new.into_account(id, Utc::now());
        committed.by_email.insert(account.email.clone(), id);
        committed.by_number.insert(account.account_number, id);
        committed.accounts.insert(id, account.clone());
        Ok(account)
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn list_by_account_number(
        &self,
        number: AccountNumber,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let mut records: Vec<TransactionRecord> = self
            .shared
            .read()
            .ledger
            .iter()
            .filter(|r| r.involves(number))
            .cloned()
            .collect();
        // Stable: equal timestamps keep commit order
        records.sort_by_key(|r| r.timestamp);
        Ok(records)
    }
}

#[async_trait]
impl TransactionalStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        Ok(Box::new(MemoryTx {
            shared: self.shared.clone(),
            guards: BTreeMap::new(),
            staged: BTreeMap::new(),
            appended: Vec::new(),
        }))
    }
}

/// In-memory unit of work
///
/// Dropping it releases its row locks and discards staged writes.
struct MemoryTx {
    shared: Arc<Shared>,
    guards: BTreeMap<AccountId, OwnedMutexGuard<()>>,
    staged: BTreeMap<AccountId, Account>,
    appended: Vec<TransactionRecord>,
}

impl MemoryTx {
    fn current(&self, id: AccountId) -> Result<Account, StoreError> {
        if let Some(staged) = self.staged.get(&id) {
            return Ok(staged.clone());
        }
        self.shared
            .read()
            .accounts
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn find_id_by_account_number(
        &mut self,
        number: AccountNumber,
    ) -> Result<Option<AccountId>, StoreError> {
        Ok(self.shared.read().by_number.get(&number).copied())
    }

    async fn lock_accounts(&mut self, ids: &[AccountId]) -> Result<Vec<Account>, StoreError> {
        let ordered = lock_order(ids);
        let highest_held = self.guards.keys().next_back().copied();

        for id in ordered {
            if self.guards.contains_key(&id) {
                continue;
            }
            if let Some(held) = highest_held
                && id < held
            {
                return Err(StoreError::LockOrder {
                    requested: id,
                    held,
                });
            }
            if !self.shared.read().accounts.contains_key(&id) {
                return Err(StoreError::NotFound);
            }

            let row_lock = Arc::clone(&self.shared.row_locks.entry(id).or_default());
            let guard = tokio::time::timeout(self.shared.lock_timeout, row_lock.lock_owned())
                .await
                .map_err(|_| StoreError::LockTimeout)?;
            self.guards.insert(id, guard);
        }

        ids.iter().map(|id| self.current(*id)).collect()
    }

    async fn save(&mut self, account: &Account) -> Result<(), StoreError> {
        if !self.guards.contains_key(&account.id) {
            return Err(StoreError::NotLocked(account.id));
        }
        let stored_number = self
            .shared
            .read()
            .accounts
            .get(&account.id)
            .map(|a| a.account_number)
            .ok_or(StoreError::NotFound)?;
        if stored_number != account.account_number {
            return Err(StoreError::Conflict("account_number"));
        }
        self.staged.insert(account.id, account.clone());
        Ok(())
    }

    async fn append(&mut self, record: &TransactionRecord) -> Result<(), StoreError> {
        self.appended.push(record.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        if self.shared.fail_next_commit.swap(false, Ordering::SeqCst) {
            debug!("Injected commit failure, rolling back");
            return Err(StoreError::Database("injected commit failure".to_string()));
        }

        let MemoryTx {
            shared,
            guards,
            staged,
            appended,
        } = *self;

        {
            let mut committed = shared.write();
            for (id, account) in staged {
                committed.accounts.insert(id, account);
            }
            committed.ledger.extend(appended);
        }

        // Row locks are released only after the writes are visible
        drop(guards);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        debug!(locks = self.guards.len(), "Rolling back in-memory transaction");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Role;
    use crate::money::{Amount, Balance};
    use rust_decimal_macros::dec;

    fn new_account(n: u32, email: &str) -> NewAccount {
        NewAccount {
            account_number: AccountNumber::new(n).unwrap(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            phone: None,
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let store = MemoryStore::new();
        let a = store
            .create(new_account(12_345_678, "a@example.com"))
            .await
            .unwrap();

        assert_eq!(store.get_by_id(a.id).await.unwrap().email, "a@example.com");
        assert_eq!(
            store.get_by_account_number(a.account_number).await.unwrap().id,
            a.id
        );
        assert_eq!(store.get_by_email("a@example.com").await.unwrap().id, a.id);
        assert_eq!(
            store.get_by_email("missing@example.com").await.unwrap_err(),
            StoreError::NotFound
        );
    }

    #[tokio::test]
    async fn test_create_rejects_duplicates() {
        let store = MemoryStore::new();
        store
            .create(new_account(12_345_678, "a@example.com"))
            .await
            .unwrap();

        let dup_email = store.create(new_account(23_456_789, "a@example.com")).await;
        assert_eq!(dup_email.unwrap_err(), StoreError::Conflict("email"));

        let dup_number = store.create(new_account(12_345_678, "b@example.com")).await;
        assert_eq!(dup_number.unwrap_err(), StoreError::Conflict("account_number"));
    }

    #[tokio::test]
    async fn test_uncommitted_writes_are_invisible() {
        let store = MemoryStore::new();
        let a = store
            .create(new_account(12_345_678, "a@example.com"))
            .await
            .unwrap();

        let mut tx = store.begin().await.unwrap();
        let mut locked = tx.lock_accounts(&[a.id]).await.unwrap().remove(0);
        locked.balance.credit(Amount::new(dec!(5)).unwrap()).unwrap();
        tx.save(&locked).await.unwrap();

        assert_eq!(store.get_by_id(a.id).await.unwrap().balance(), Balance::ZERO);

        drop(tx);
        assert_eq!(store.get_by_id(a.id).await.unwrap().balance(), Balance::ZERO);
    }

    #[tokio::test]
    async fn test_save_requires_lock() {
        let store = MemoryStore::new();
        let a = store
            .create(new_account(12_345_678, "a@example.com"))
            .await
            .unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.save(&a).await.unwrap_err(), StoreError::NotLocked(a.id));
    }

    #[tokio::test]
    async fn test_lock_order_violation() {
        let store = MemoryStore::new();
        let a = store
            .create(new_account(12_345_678, "a@example.com"))
            .await
            .unwrap();
        let b = store
            .create(new_account(23_456_789, "b@example.com"))
            .await
            .unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.lock_accounts(&[b.id]).await.unwrap();
        let err = tx.lock_accounts(&[a.id]).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::LockOrder {
                requested: a.id,
                held: b.id
            }
        );
    }

    #[tokio::test]
    async fn test_lock_timeout() {
        let store = MemoryStore::with_lock_timeout(Duration::from_millis(20));
        let a = store
            .create(new_account(12_345_678, "a@example.com"))
            .await
            .unwrap();

        let mut holder = store.begin().await.unwrap();
        holder.lock_accounts(&[a.id]).await.unwrap();

        let mut waiter = store.begin().await.unwrap();
        assert_eq!(
            waiter.lock_accounts(&[a.id]).await.unwrap_err(),
            StoreError::LockTimeout
        );

        // Released on rollback
        holder.rollback().await.unwrap();
        assert!(waiter.lock_accounts(&[a.id]).await.is_ok());
    }

    #[tokio::test]
    async fn test_injected_commit_failure_discards_writes() {
        let store = MemoryStore::new();
        let a = store
            .create(new_account(12_345_678, "a@example.com"))
            .await
            .unwrap();
        store.inject_commit_failure();

        let mut tx = store.begin().await.unwrap();
        let mut locked = tx.lock_accounts(&[a.id]).await.unwrap().remove(0);
        locked.balance.credit(Amount::new(dec!(5)).unwrap()).unwrap();
        tx.save(&locked).await.unwrap();
        assert!(tx.commit().await.is_err());

        assert_eq!(store.get_by_id(a.id).await.unwrap().balance(), Balance::ZERO);
        // Lock released with the failed transaction
        let mut tx = store.begin().await.unwrap();
        assert!(tx.lock_accounts(&[a.id]).await.is_ok());
    }
}
