//! Ledger - transfer audit log
//!
//! One immutable [`TransactionRecord`] per completed transfer. Records refer
//! to accounts by account number (denormalised at transfer time), never by
//! store identifier.
//!
//! A transfer is recorded exactly once. Whether it reads as a debit or a
//! credit depends on who is looking: [`TransactionRecord::direction_for`]
//! derives that from which side matches the viewer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::AccountNumber;
use crate::money::Amount;

/// Stored transfer type.
///
/// Every transfer is persisted as `Debit` from the payer's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Debit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Debit => "debit",
        }
    }

    /// Convert from PostgreSQL text column
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "debit" => Some(TransactionType::Debit),
            _ => None,
        }
    }
}

/// Side of a transfer as seen from one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Debit,
    Credit,
}

/// Immutable ledger record
///
/// # Invariant
/// `amount > 0`, enforced by [`Amount`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub payer: AccountNumber,
    pub recipient: AccountNumber,
    pub transaction_type: TransactionType,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
}

impl TransactionRecord {
    /// Record for a payer → recipient transfer committed at `timestamp`.
    pub fn transfer(
        payer: AccountNumber,
        recipient: AccountNumber,
        amount: Amount,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            payer,
            recipient,
            transaction_type: TransactionType::Debit,
            amount,
            timestamp,
        }
    }

    /// Whether `number` appears on either side.
    #[inline]
    pub fn involves(&self, number: AccountNumber) -> bool {
        self.payer == number || self.recipient == number
    }

    /// How this record reads from `viewer`'s history, or `None` if the
    /// viewer is not a party to it.
    pub fn direction_for(&self, viewer: AccountNumber) -> Option<Direction> {
        if self.payer == viewer {
            Some(Direction::Debit)
        } else if self.recipient == viewer {
            Some(Direction::Credit)
        } else {
            None
        }
    }
}
