//! Data models for bank accounts

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Balance;

use super::number::{ACCOUNT_NUMBER_MAX, ACCOUNT_NUMBER_MIN};

// ============================================================================
// Identifiers
// ============================================================================

/// System-assigned account identifier.
///
/// Immutable for the account's lifetime. Its ordering is the global lock
/// order: any operation touching several accounts locks them in ascending
/// `AccountId` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(i64);

impl AccountId {
    #[inline]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Externally addressable 8-digit account number.
///
/// Permanent once issued. The ledger stores it by value, never as a
/// reference into the account table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct AccountNumber(pub(super) u32);

impl AccountNumber {
    /// Validate that `n` lies in the issued range.
    pub fn new(n: u32) -> Result<Self, InvalidAccountNumber> {
        if (ACCOUNT_NUMBER_MIN..=ACCOUNT_NUMBER_MAX).contains(&n) {
            Ok(Self(n))
        } else {
            Err(InvalidAccountNumber(n as i64))
        }
    }

    /// Convert from PostgreSQL BIGINT
    pub fn from_db(n: i64) -> Result<Self, InvalidAccountNumber> {
        u32::try_from(n)
            .map_err(|_| InvalidAccountNumber(n))
            .and_then(Self::new)
    }

    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Get numeric value for PostgreSQL storage
    #[inline]
    pub fn db_value(self) -> i64 {
        self.0 as i64
    }
}

impl TryFrom<u32> for AccountNumber {
    type Error = InvalidAccountNumber;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        Self::new(n)
    }
}

impl From<AccountNumber> for u32 {
    fn from(n: AccountNumber) -> Self {
        n.0
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Account number out of range: {0}")]
pub struct InvalidAccountNumber(pub i64);

// ============================================================================
// Role
// ============================================================================

/// Principal role.
///
/// Users and admins share one registration/login flow; the role only gates
/// the handful of admin capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum Role {
    User = 1,
    Admin = 2,
}

impl Role {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(Role::User),
            2 => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// Admins may look up other principals by email.
    pub fn can_lookup_principals(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Account
// ============================================================================

/// Bank account record
///
/// `balance`, `failed_logins` and `locked` are crate-private: they change
/// only inside a store transaction, driven by the transfer engine or the
/// login attempt guard.
#[derive(Clone)]
pub struct Account {
    pub id: AccountId,
    pub account_number: AccountNumber,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub(crate) password_hash: String,
    pub(crate) balance: Balance,
    pub(crate) failed_logins: u32,
    pub(crate) locked: bool,
}

impl Account {
    #[inline]
    pub fn balance(&self) -> Balance {
        self.balance
    }

    #[inline]
    pub fn failed_logins(&self) -> u32 {
        self.failed_logins
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

const REDACTED: &str = "<redacted>";

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("account_number", &self.account_number)
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("phone", &self.phone)
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .field("password_hash", &REDACTED)
            .field("balance", &self.balance)
            .field("failed_logins", &self.failed_logins)
            .field("locked", &self.locked)
            .finish()
    }
}

/// Insert payload for a freshly registered principal.
///
/// Balance and login counter always start at zero.
#[derive(Clone)]
pub struct NewAccount {
    pub account_number: AccountNumber,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
}

impl NewAccount {
    /// Materialise the record a store will hold for this payload.
    pub(crate) fn into_account(self, id: AccountId, created_at: DateTime<Utc>) -> Account {
        Account {
            id,
            account_number: self.account_number,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            role: self.role,
            created_at,
            password_hash: self.password_hash,
            balance: Balance::ZERO,
            failed_logins: 0,
            locked: false,
        }
    }
}

impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("account_number", &self.account_number)
            .field("email", &self.email)
            .field("password_hash", &REDACTED)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("phone", &self.phone)
            .field("role", &self.role)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password_hash() {
        let new = NewAccount {
            account_number: AccountNumber::new(12_345_678).unwrap(),
            email: "ada@example.com".to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone: None,
            role: Role::User,
        };
        let printed = format!("{:?}", new);
        assert!(!printed.contains("argon2id"));
        assert!(printed.contains("<redacted>"));

        let account = new.into_account(AccountId::new(1), Utc::now());
        let printed = format!("{:?}", account);
        assert!(!printed.contains("argon2id"));
        assert!(printed.contains("<redacted>"));
        assert!(printed.contains("ada@example.com"));
    }

    #[test]
    fn test_account_number_range() {
        assert!(AccountNumber::new(11_111_111).is_ok());
        assert!(AccountNumber::new(99_999_999).is_ok());
        assert!(AccountNumber::new(11_111_110).is_err());
        assert!(AccountNumber::new(100_000_000).is_err());
        assert!(AccountNumber::from_db(-5).is_err());
        assert_eq!(AccountNumber::from_db(12_345_678).unwrap().get(), 12_345_678);
    }

    #[test]
    fn test_account_number_serde() {
        let n = AccountNumber::new(12_345_678).unwrap();
        assert_eq!(serde_json::to_string(&n).unwrap(), "12345678");
        assert!(serde_json::from_str::<AccountNumber>("42").is_err());
    }

    #[test]
    fn test_role_from_id() {
        assert_eq!(Role::from_id(1), Some(Role::User));
        assert_eq!(Role::from_id(2), Some(Role::Admin));
        assert_eq!(Role::from_id(9), None);
        assert!(Role::Admin.can_lookup_principals());
        assert!(!Role::User.can_lookup_principals());
    }

    #[test]
    fn test_new_account_starts_empty() {
        let new = NewAccount {
            account_number: AccountNumber::new(22_222_222).unwrap(),
            email: "c@example.com".to_string(),
            password_hash: "hash".to_string(),
            first_name: "Chidi".to_string(),
            last_name: "Okeke".to_string(),
            phone: None,
            role: Role::User,
        };
        let account = new.into_account(AccountId::new(7), Utc::now());
        assert_eq!(account.balance(), Balance::ZERO);
        assert_eq!(account.failed_logins(), 0);
        assert!(!account.is_locked());
        assert_eq!(account.full_name(), "Chidi Okeke");
    }
}
