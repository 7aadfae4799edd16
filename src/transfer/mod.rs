//! Funds Transfer & Ledger Engine
//!
//! Moves money between two accounts and appends the ledger record as one
//! atomic unit.
//!
//! # Safety Invariants
//!
//! 1. **Conservation**: a committed transfer changes the sum of the two
//!    balances by exactly zero
//! 2. **Non-negative balances**: checked against locked state, so no
//!    concurrent transfer can pass the check on a stale snapshot
//! 3. **Deadlock freedom**: both rows are locked in ascending id order,
//!    independent of transfer direction
//! 4. **All-or-nothing**: any failure after `begin` rolls back; a stalled
//!    unit times out as `TransferFailed`

pub mod engine;
pub mod error;
pub mod invariant;


pub use engine::{DEFAULT_TRANSFER_TIMEOUT, HistoryEntry, TransferEngine};
pub use error::TransferError;
pub use invariant::can_debit;
