//! PostgreSQL store
//!
//! Accounts live in `accounts_tb`, the ledger in `transactions_tb`.
//! Transactions lock rows with `SELECT ... FOR UPDATE`, one row at a time in
//! ascending `account_id` order, under a `SET LOCAL lock_timeout` so a stalled
//! peer surfaces as `StoreError::LockTimeout` instead of hanging.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::debug;

use super::{AccountStore, LedgerStore, StoreError, StoreTx, TransactionalStore, lock_order};
use crate::account::{Account, AccountId, AccountNumber, NewAccount, Role};
use crate::ledger::{TransactionRecord, TransactionType};
use crate::money::{Amount, Balance};

const ACCOUNT_COLUMNS: &str = "account_id, account_number, email, password_hash, first_name, \
     last_name, phone, role, balance, failed_logins, is_locked, created_at";

/// PostgreSQL-backed account + ledger store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    lock_timeout: Duration,
}

impl PgStore {
    pub fn new(pool: PgPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Convert database row to Account
fn row_to_account(row: &PgRow) -> Result<Account, StoreError> {
    let account_number: i64 = row.try_get("account_number")?;
    let account_number = AccountNumber::from_db(account_number)
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;

    let role_id: i16 = row.try_get("role")?;
    let role = Role::from_id(role_id)
        .ok_or_else(|| StoreError::Corrupt(format!("Invalid role ID: {}", role_id)))?;

    let balance: Decimal = row.try_get("balance")?;
    let balance = Balance::new(balance).map_err(|e| StoreError::Corrupt(e.to_string()))?;

    let failed_logins: i32 = row.try_get("failed_logins")?;
    let failed_logins = u32::try_from(failed_logins)
        .map_err(|_| StoreError::Corrupt(format!("Negative failed_logins: {}", failed_logins)))?;

    Ok(Account {
        id: AccountId::new(row.try_get("account_id")?),
        account_number,
        email: row.try_get("email")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        phone: row.try_get("phone")?,
        role,
        created_at: row.try_get("created_at")?,
        password_hash: row.try_get("password_hash")?,
        balance,
        failed_logins,
        locked: row.try_get("is_locked")?,
    })
}

/// Convert database row to TransactionRecord
fn row_to_record(row: &PgRow) -> Result<TransactionRecord, StoreError> {
    let number = |col: &str| -> Result<AccountNumber, StoreError> {
        let n: i64 = row.try_get(col)?;
        AccountNumber::from_db(n).map_err(|e| StoreError::Corrupt(e.to_string()))
    };

    let type_str: String = row.try_get("transaction_type")?;
    let transaction_type = TransactionType::from_db(&type_str).ok_or_else(|| {
        StoreError::Corrupt(format!("Invalid transaction_type: {}", type_str))
    })?;

    let amount: Decimal = row.try_get("amount")?;
    let amount = Amount::new(amount).map_err(|e| StoreError::Corrupt(e.to_string()))?;

    Ok(TransactionRecord {
        payer: number("payer_account_number")?,
        recipient: number("recipient_account_number")?,
        transaction_type,
        amount,
        timestamp: row.try_get("created_at")?,
    })
}

#[async_trait]
impl AccountStore for PgStore {
    async fn get_by_id(&self, id: AccountId) -> Result<Account, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts_tb WHERE account_id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;
        row_to_account(&row)
    }

    async fn get_by_account_number(
        &self,
        number: AccountNumber,
    ) -> Result<Account, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts_tb WHERE account_number = $1"
        ))
        .bind(number.db_value())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;
        row_to_account(&row)
    }

    async fn get_by_email(&self, email: &str) -> Result<Account, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts_tb WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;
        row_to_account(&row)
    }

    async fn account_number_exists(&self, number: AccountNumber) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM accounts_tb WHERE account_number = $1)",
        )
        .bind(number.db_value())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create(&self, new: NewAccount) -> Result<Account, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO accounts_tb
                (account_number, email, password_hash, first_name, last_name, phone, role)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(new.account_number.db_value())
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.phone)
        .bind(new.role.id())
        .fetch_one(&self.pool)
        .await?;
        row_to_account(&row)
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn list_by_account_number(
        &self,
        number: AccountNumber,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT payer_account_number, recipient_account_number, transaction_type,
                   amount, created_at
            FROM transactions_tb
            WHERE payer_account_number = $1 OR recipient_account_number = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(number.db_value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_record).collect()
    }
}

#[async_trait]
impl TransactionalStore for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let mut tx = self.pool.begin().await?;
        // SET does not take bind parameters; the value is an integer we own
        sqlx::query(&format!(
            "SET LOCAL lock_timeout = '{}ms'",
            self.lock_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await?;

        Ok(Box::new(PgTx {
            tx,
            locked: BTreeSet::new(),
        }))
    }
}

/// PostgreSQL unit of work
///
/// Dropping the inner `sqlx::Transaction` without commit rolls it back.
struct PgTx {
    tx: Transaction<'static, Postgres>,
    locked: BTreeSet<AccountId>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn find_id_by_account_number(
        &mut self,
        number: AccountNumber,
    ) -> Result<Option<AccountId>, StoreError> {
        let id: Option<i64> =
            sqlx::query_scalar("SELECT account_id FROM accounts_tb WHERE account_number = $1")
                .bind(number.db_value())
                .fetch_optional(&mut *self.tx)
                .await?;
        Ok(id.map(AccountId::new))
    }

    async fn lock_accounts(&mut self, ids: &[AccountId]) -> Result<Vec<Account>, StoreError> {
        let highest_held = self.locked.iter().next_back().copied();

        for id in lock_order(ids) {
            if self.locked.contains(&id) {
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
            sqlx::query("SELECT account_id FROM accounts_tb WHERE account_id = $1 FOR UPDATE")
                .bind(id.get())
                .fetch_optional(&mut *self.tx)
                .await?
                .ok_or(StoreError::NotFound)?;
            self.locked.insert(id);
        }

        let mut accounts = Vec::with_capacity(ids.len());
        for id in ids {
            let row = sqlx::query(&format!(
                "SELECT {ACCOUNT_COLUMNS} FROM accounts_tb WHERE account_id = $1"
            ))
            .bind(id.get())
            .fetch_one(&mut *self.tx)
            .await?;
            accounts.push(row_to_account(&row)?);
        }
        Ok(accounts)
    }

    async fn save(&mut self, account: &Account) -> Result<(), StoreError> {
        if !self.locked.contains(&account.id) {
            return Err(StoreError::NotLocked(account.id));
        }
        let result = sqlx::query(
            r#"
            UPDATE accounts_tb
            SET balance = $1, failed_logins = $2, is_locked = $3,
                first_name = $4, last_name = $5, phone = $6, updated_at = NOW()
            WHERE account_id = $7 AND account_number = $8
            "#,
        )
        .bind(account.balance.value())
        .bind(account.failed_logins as i32)
        .bind(account.locked)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.phone)
        .bind(account.id.get())
        .bind(account.account_number.db_value())
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn append(&mut self, record: &TransactionRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO transactions_tb
                (payer_account_number, recipient_account_number, transaction_type, amount, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.payer.db_value())
        .bind(record.recipient.db_value())
        .bind(record.transaction_type.as_str())
        .bind(record.amount.value())
        .bind(record.timestamp)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        debug!(locks = self.locked.len(), "Rolling back PostgreSQL transaction");
        self.tx.rollback().await?;
        Ok(())
    }
}
