//! Login Attempt Guard
//!
//! Per-account state machine over `(failed_logins, locked)`:
//!
//! ```text
//!            failure, count+1 < threshold
//!          ┌───────────────┐
//!          ▼               │
//!      ┌────────┐──────────┘          ┌────────┐
//!      │ Active │─────────────────────▶│ Locked │ (terminal)
//!      └────────┘ failure, count+1     └────────┘
//!          ▲   │  reaches threshold
//!          └───┘
//!      success, count := 0
//! ```
//!
//! A locked account is rejected with `AccountLocked` before its credentials
//! are looked at. The counter counts consecutive failures: any success
//! resets it.
//!
//! The guard mutates the counter and flag through the same store transaction
//! discipline as the transfer engine: lock the row, decide, save, commit.

use tracing::{info, warn};

use super::error::AuthError;
use crate::account::{Account, AccountId};
use crate::store::TransactionalStore;

/// Failed attempts that lock an account unless configured otherwise.
pub const DEFAULT_MAX_FAILED_LOGINS: u32 = 3;

/// Result of applying one authentication attempt to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Credentials matched; counter reset.
    Granted,
    /// Credentials did not match; still active.
    Denied,
    /// Credentials did not match and this failure locked the account.
    LockedOut,
    /// Account was already locked; credentials were not consulted.
    AlreadyLocked,
}

#[derive(Debug, Clone, Copy)]
pub struct LoginAttemptGuard {
    threshold: u32,
}

impl LoginAttemptGuard {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Transition for one attempt. Pure; the caller persists the account.
    pub fn apply(&self, account: &mut Account, credentials_ok: bool) -> AttemptOutcome {
        if account.locked {
            return AttemptOutcome::AlreadyLocked;
        }
        if credentials_ok {
            account.failed_logins = 0;
            return AttemptOutcome::Granted;
        }
        account.failed_logins = account.failed_logins.saturating_add(1);
        if account.failed_logins >= self.threshold {
            account.locked = true;
            AttemptOutcome::LockedOut
        } else {
            AttemptOutcome::Denied
        }
    }

    /// Run one authentication attempt for `account_id` inside a store
    /// transaction.
    ///
    /// `check` is only invoked for an unlocked account, with the row held.
    pub async fn authenticate<S, F>(
        &self,
        store: &S,
        account_id: AccountId,
        check: F,
    ) -> Result<Account, AuthError>
    where
        S: TransactionalStore + ?Sized,
        F: FnOnce(&Account) -> Result<bool, AuthError> + Send,
    {
        let mut tx = store.begin().await?;
        let mut account = tx
            .lock_accounts(&[account_id])
            .await?
            .pop()
            .ok_or(AuthError::NotFound)?;

        if account.locked {
            tx.rollback().await?;
            warn!(account_id = %account_id, "Login attempt on locked account");
            return Err(AuthError::AccountLocked);
        }

        let credentials_ok = match check(&account) {
            Ok(ok) => ok,
            Err(e) => {
                tx.rollback().await?;
                return Err(e);
            }
        };

        let previous_failures = account.failed_logins;
        let outcome = self.apply(&mut account, credentials_ok);

        if account.failed_logins != previous_failures || account.locked {
            tx.save(&account).await?;
        }
        tx.commit().await?;

        match outcome {
            AttemptOutcome::Granted => Ok(account),
            AttemptOutcome::Denied => {
                warn!(
                    account_id = %account_id,
                    failed_logins = account.failed_logins,
                    "Login failed"
                );
                Err(AuthError::InvalidCredentials)
            }
            AttemptOutcome::LockedOut => {
                info!(
                    account_id = %account_id,
                    failed_logins = account.failed_logins,
                    "Account locked after repeated login failures"
                );
                Err(AuthError::InvalidCredentials)
            }
            AttemptOutcome::AlreadyLocked => Err(AuthError::AccountLocked),
        }
    }
}

impl Default for LoginAttemptGuard {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FAILED_LOGINS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{AccountNumber, NewAccount, Role};
    use crate::store::{AccountStore, MemoryStore};
    use chrono::Utc;

    fn account() -> Account {
        NewAccount {
            account_number: AccountNumber::new(33_333_333).unwrap(),
            email: "c@example.com".to_string(),
            password_hash: "unused".to_string(),
            first_name: "C".to_string(),
            last_name: "Guarded".to_string(),
            phone: None,
            role: Role::User,
        }
        .into_account(AccountId::new(1), Utc::now())
    }

    #[test]
    fn test_third_failure_locks() {
        let guard = LoginAttemptGuard::default();
        let mut acc = account();

        assert_eq!(guard.apply(&mut acc, false), AttemptOutcome::Denied);
        assert_eq!(guard.apply(&mut acc, false), AttemptOutcome::Denied);
        assert_eq!(guard.apply(&mut acc, false), AttemptOutcome::LockedOut);
        assert!(acc.is_locked());
        assert_eq!(guard.apply(&mut acc, true), AttemptOutcome::AlreadyLocked);
        assert_eq!(acc.failed_logins(), 3);
    }

    #[test]
    fn test_success_resets_counter() {
        let guard = LoginAttemptGuard::default();
        let mut acc = account();

        guard.apply(&mut acc, false);
        guard.apply(&mut acc, false);
        assert_eq!(guard.apply(&mut acc, true), AttemptOutcome::Granted);
        assert_eq!(acc.failed_logins(), 0);

        // Two more failures do not lock: the count restarted
        guard.apply(&mut acc, false);
        assert_eq!(guard.apply(&mut acc, false), AttemptOutcome::Denied);
        assert!(!acc.is_locked());
    }

    #[test]
    fn test_threshold_floor() {
        assert_eq!(LoginAttemptGuard::new(0).threshold(), 1);
    }

    async fn stored_account(store: &MemoryStore) -> Account {
        store
            .create(NewAccount {
                account_number: AccountNumber::new(33_333_333).unwrap(),
                email: "c@example.com".to_string(),
                password_hash: "unused".to_string(),
                first_name: "C".to_string(),
                last_name: "Guarded".to_string(),
                phone: None,
                role: Role::User,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_locked_account_rejects_correct_password() {
        let store = MemoryStore::new();
        let guard = LoginAttemptGuard::default();
        let acc = stored_account(&store).await;

        for _ in 0..3 {
            let err = guard.authenticate(&store, acc.id, |_| Ok(false)).await;
            assert_eq!(err.unwrap_err(), AuthError::InvalidCredentials);
        }

        let err = guard.authenticate(&store, acc.id, |_| Ok(true)).await;
        assert_eq!(err.unwrap_err(), AuthError::AccountLocked);

        let persisted = store.get_by_id(acc.id).await.unwrap();
        assert!(persisted.is_locked());
        assert_eq!(persisted.failed_logins(), 3);
    }

    #[tokio::test]
    async fn test_locked_account_skips_credential_check() {
        let store = MemoryStore::new();
        let guard = LoginAttemptGuard::new(1);
        let acc = stored_account(&store).await;

        let _ = guard.authenticate(&store, acc.id, |_| Ok(false)).await;
        let result = guard
            .authenticate(&store, acc.id, |_| panic!("credentials consulted"))
            .await;
        assert_eq!(result.unwrap_err(), AuthError::AccountLocked);
    }

    #[tokio::test]
    async fn test_success_persists_reset() {
        let store = MemoryStore::new();
        let guard = LoginAttemptGuard::default();
        let acc = stored_account(&store).await;

        let _ = guard.authenticate(&store, acc.id, |_| Ok(false)).await;
        assert_eq!(store.get_by_id(acc.id).await.unwrap().failed_logins(), 1);

        let ok = guard.authenticate(&store, acc.id, |_| Ok(true)).await.unwrap();
        assert_eq!(ok.failed_logins(), 0);
        assert_eq!(store.get_by_id(acc.id).await.unwrap().failed_logins(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_failures_are_all_counted() {
        let store = MemoryStore::new();
        let guard = LoginAttemptGuard::new(10);
        let acc = stored_account(&store).await;

        let attempts = (0..6).map(|_| guard.authenticate(&store, acc.id, |_| Ok(false)));
        futures::future::join_all(attempts).await;

        assert_eq!(store.get_by_id(acc.id).await.unwrap().failed_logins(), 6);
    }
}
