//! Transfer Engine
//!
//! The only writer of balances. Each money-moving operation runs as one
//! store transaction:
//!
//! ```text
//! validate amount ─▶ begin ─▶ resolve recipient ─▶ lock (ascending id)
//!      ─▶ check invariant ─▶ debit/credit ─▶ save ─▶ append ─▶ commit
//! ```
//!
//! Any failure after `begin` rolls the transaction back, so no partial state
//! is ever observable. Everything up to `commit` is bounded by a timeout; on
//! expiry the transaction is dropped (rolled back) and the caller sees
//! `TransferFailed`. `commit` itself runs outside the timeout: once it has
//! been issued, its own outcome is what the caller sees. The engine never
//! retries.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use super::error::TransferError;
use super::invariant::can_debit;
use crate::account::{Account, AccountId, AccountNumber};
use crate::ledger::{Direction, TransactionRecord};
use crate::money::{Amount, Balance};
use crate::store::{AccountStore, StoreTx, TransactionalStore};

/// Default upper bound for one atomic unit.
pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_secs(10);

/// A ledger record as seen from one account's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub record: TransactionRecord,
    pub direction: Direction,
}

/// Funds transfer and ledger engine
pub struct TransferEngine {
    store: Arc<dyn TransactionalStore>,
    timeout: Duration,
}

impl TransferEngine {
    pub fn new(store: Arc<dyn TransactionalStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn store(&self) -> &Arc<dyn TransactionalStore> {
        &self.store
    }

    /// Move `amount` from `payer_id` to the account numbered `recipient`.
    ///
    /// Preconditions, in order: positive amount, existing recipient,
    /// recipient differs from payer, payer not locked, payer balance covers
    /// the amount.
    pub async fn transfer(
        &self,
        payer_id: AccountId,
        recipient: AccountNumber,
        amount: Decimal,
    ) -> Result<TransactionRecord, TransferError> {
        let result = self.transfer_inner(payer_id, recipient, amount).await;
        match &result {
            Ok(record) => info!(
                payer = %record.payer,
                recipient = %record.recipient,
                amount = %record.amount,
                "Transfer committed"
            ),
            Err(e) => warn!(
                payer_id = %payer_id,
                recipient = %recipient,
                amount = %amount,
                error = %e,
                "Transfer rejected"
            ),
        }
        result
    }

    async fn transfer_inner(
        &self,
        payer_id: AccountId,
        recipient: AccountNumber,
        amount: Decimal,
    ) -> Result<TransactionRecord, TransferError> {
        let amount = Amount::new(amount)?;

        let (tx, staged) = self
            .bounded(async {
                let mut tx = self.store.begin().await.map_err(TransferError::commit)?;
                let staged = stage_transfer(tx.as_mut(), payer_id, recipient, amount).await;
                Ok((tx, staged))
            })
            .await?;
        finish(tx, staged).await
    }

    /// Credit `amount` to `account_id`.
    ///
    /// No ledger record is written: the ledger holds transfers only.
    pub async fn add_funds(
        &self,
        account_id: AccountId,
        amount: Decimal,
    ) -> Result<Balance, TransferError> {
        let result = self.add_funds_inner(account_id, amount).await;
        match &result {
            Ok(balance) => info!(
                account_id = %account_id,
                amount = %amount,
                balance = %balance,
                "Funds added"
            ),
            Err(e) => warn!(
                account_id = %account_id,
                amount = %amount,
                error = %e,
                "Add funds rejected"
            ),
        }
        result
    }

    async fn add_funds_inner(
        &self,
        account_id: AccountId,
        amount: Decimal,
    ) -> Result<Balance, TransferError> {
        let amount = Amount::new(amount)?;

        let (tx, staged) = self
            .bounded(async {
                let mut tx = self.store.begin().await.map_err(TransferError::commit)?;
                let staged = stage_credit(tx.as_mut(), account_id, amount).await;
                Ok((tx, staged))
            })
            .await?;
        finish(tx, staged).await
    }

    /// Committed balance of `account_id`.
    pub async fn balance(&self, account_id: AccountId) -> Result<Balance, TransferError> {
        Ok(self.store.get_by_id(account_id).await?.balance())
    }

    /// Ledger records where `number` is payer or recipient, oldest first.
    pub async fn list_transactions(
        &self,
        number: AccountNumber,
    ) -> Result<Vec<TransactionRecord>, TransferError> {
        Ok(self.store.list_by_account_number(number).await?)
    }

    /// History of `account_id`, each record tagged debit/credit from its view.
    pub async fn history(&self, account_id: AccountId) -> Result<Vec<HistoryEntry>, TransferError> {
        let account = self.store.get_by_id(account_id).await?;
        let number = account.account_number;
        let records = self.list_transactions(number).await?;

        Ok(records
            .into_iter()
            .filter_map(|record| {
                record
                    .direction_for(number)
                    .map(|direction| HistoryEntry { record, direction })
            })
            .collect())
    }

    async fn bounded<T, F>(&self, unit: F) -> Result<T, TransferError>
    where
        F: Future<Output = Result<T, TransferError>>,
    {
        match tokio::time::timeout(self.timeout, unit).await {
            Ok(result) => result,
            Err(_) => Err(TransferError::TransferFailed(format!(
                "timed out after {}ms",
                self.timeout.as_millis()
            ))),
        }
    }
}

/// Commit on success, roll back on failure.
async fn finish<T>(
    tx: Box<dyn StoreTx>,
    staged: Result<T, TransferError>,
) -> Result<T, TransferError> {
    match staged {
        Ok(value) => {
            tx.commit().await.map_err(TransferError::commit)?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rb) = tx.rollback().await {
                warn!(error = %rb, "Rollback failed; transaction discarded on drop");
            }
            Err(e)
        }
    }
}

async fn stage_transfer(
    tx: &mut dyn StoreTx,
    payer_id: AccountId,
    recipient: AccountNumber,
    amount: Amount,
) -> Result<TransactionRecord, TransferError> {
    let recipient_id = tx
        .find_id_by_account_number(recipient)
        .await
        .map_err(TransferError::commit)?
        .ok_or(TransferError::RecipientNotFound)?;

    if recipient_id == payer_id {
        return Err(TransferError::SameAccount);
    }

    let locked = tx
        .lock_accounts(&[payer_id, recipient_id])
        .await
        .map_err(TransferError::commit)?;
    let [mut payer, mut payee]: [Account; 2] = locked.try_into().map_err(|_| {
        TransferError::TransferFailed("store returned unexpected lock set".to_string())
    })?;

    if payer.is_locked() {
        return Err(TransferError::AccountLocked);
    }
    if !can_debit(payer.balance(), amount) {
        return Err(TransferError::InsufficientFunds);
    }

    payer.balance.debit(amount)?;
    payee.balance.credit(amount)?;

    tx.save(&payer).await.map_err(TransferError::commit)?;
    tx.save(&payee).await.map_err(TransferError::commit)?;

    let record = TransactionRecord::transfer(
        payer.account_number,
        payee.account_number,
        amount,
        Utc::now(),
    );
    tx.append(&record).await.map_err(TransferError::commit)?;
    Ok(record)
}

async fn stage_credit(
    tx: &mut dyn StoreTx,
    account_id: AccountId,
    amount: Amount,
) -> Result<Balance, TransferError> {
    let mut account = tx
        .lock_accounts(&[account_id])
        .await
        .map_err(TransferError::commit)?
        .pop()
        .ok_or(TransferError::NotFound)?;

    if account.is_locked() {
        return Err(TransferError::AccountLocked);
    }

    account.balance.credit(amount)?;
    tx.save(&account).await.map_err(TransferError::commit)?;
    Ok(account.balance())
}
