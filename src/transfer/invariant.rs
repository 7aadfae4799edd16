//! Balance Invariant Checker
//!
//! Pure predicates evaluated against locked state before any mutation.

use crate::money::{Amount, Balance};

/// Whether a debit of `amount` may be taken from `balance`.
///
/// `Amount` is strictly positive by construction, so the only remaining
/// condition is `balance >= amount`.
#[inline]
pub fn can_debit(balance: Balance, amount: Amount) -> bool {
    balance.covers(amount)
}
