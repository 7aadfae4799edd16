//! Transfer Error Types

use thiserror::Error;

use crate::money::MoneyError;
use crate::store::StoreError;

/// Transfer error types
///
/// Every precondition failure has its own variant; storage failures inside
/// the atomic unit collapse into `TransferFailed`, storage failures on plain
/// reads into `StorageError`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    // === Validation Errors ===
    #[error("Amount must be a positive quantity with at most 2 decimal places")]
    InvalidAmount,

    #[error("Recipient account not found")]
    RecipientNotFound,

    #[error("Payer and recipient account cannot be the same")]
    SameAccount,

    // === Account Errors ===
    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Account is locked")]
    AccountLocked,

    #[error("Account not found")]
    NotFound,

    // === System Errors ===
    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl TransferError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::InvalidAmount => "INVALID_AMOUNT",
            TransferError::RecipientNotFound => "RECIPIENT_NOT_FOUND",
            TransferError::SameAccount => "SAME_ACCOUNT",
            TransferError::InsufficientFunds => "INSUFFICIENT_FUNDS",
            TransferError::AccountLocked => "ACCOUNT_LOCKED",
            TransferError::NotFound => "NOT_FOUND",
            TransferError::TransferFailed(_) => "TRANSFER_FAILED",
            TransferError::StorageError(_) => "STORAGE_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            TransferError::InvalidAmount | TransferError::SameAccount => 400,
            TransferError::AccountLocked => 403,
            TransferError::RecipientNotFound | TransferError::NotFound => 404,
            TransferError::InsufficientFunds => 422,
            TransferError::TransferFailed(_) | TransferError::StorageError(_) => 500,
        }
    }

    /// Wrap a store failure raised inside the atomic unit.
    pub(crate) fn commit(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => TransferError::NotFound,
            other => TransferError::TransferFailed(other.to_string()),
        }
    }
}

/// Store failures outside the atomic unit
impl From<StoreError> for TransferError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => TransferError::NotFound,
            other => TransferError::StorageError(other.to_string()),
        }
    }
}

impl From<MoneyError> for TransferError {
    fn from(e: MoneyError) -> Self {
        match e {
            MoneyError::InvalidAmount
            | MoneyError::PrecisionOverflow { .. }
            | MoneyError::InvalidFormat(_) => TransferError::InvalidAmount,
            MoneyError::InsufficientFunds | MoneyError::NegativeBalance => {
                TransferError::InsufficientFunds
            }
            MoneyError::Overflow => TransferError::TransferFailed(e.to_string()),
        }
    }
}
