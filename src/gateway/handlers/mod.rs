//! Gateway HTTP handlers
//!
//! Auth handlers live in [`crate::user_auth::handlers`].

pub mod bank;
pub mod health;

pub use bank::{
    AddFundsRequest, BalanceResponse, TransactionView, TransferRequest, TransferResponse,
    add_funds, balance, transactions, transfer,
};
pub use health::{HealthResponse, health_check};
