//! Authentication Error Types

use thiserror::Error;

use crate::account::ValidationError;
use crate::store::StoreError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    // === Input Errors ===
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Email already registered")]
    EmailTaken,

    // === Credential Errors ===
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is locked")]
    AccountLocked,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Token has been revoked")]
    TokenRevoked,

    #[error("Insufficient privileges")]
    Forbidden,

    #[error("Account not found")]
    NotFound,

    // === System Errors ===
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Token encoding failed: {0}")]
    Token(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Validation(_) => "INVALID_PARAMETER",
            AuthError::EmailTaken => "EMAIL_TAKEN",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::AccountLocked => "ACCOUNT_LOCKED",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::TokenRevoked => "TOKEN_REVOKED",
            AuthError::Forbidden => "FORBIDDEN",
            AuthError::NotFound => "NOT_FOUND",
            AuthError::Hashing(_) | AuthError::Token(_) => "INTERNAL_ERROR",
            AuthError::Storage(_) => "STORAGE_ERROR",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            AuthError::Validation(_) => 400,
            AuthError::InvalidCredentials | AuthError::InvalidToken | AuthError::TokenRevoked => {
                401
            }
            AuthError::AccountLocked | AuthError::Forbidden => 403,
            AuthError::NotFound => 404,
            AuthError::EmailTaken => 409,
            AuthError::Hashing(_) | AuthError::Token(_) | AuthError::Storage(_) => 500,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => AuthError::NotFound,
            StoreError::Conflict("email") => AuthError::EmailTaken,
            other => AuthError::Storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status() {
        assert_eq!(AuthError::InvalidCredentials.http_status(), 401);
        assert_eq!(AuthError::AccountLocked.http_status(), 403);
        assert_eq!(AuthError::EmailTaken.http_status(), 409);
        assert_eq!(
            AuthError::Validation(ValidationError::PasswordTooShort { min: 8 }).http_status(),
            400
        );
    }

    #[test]
    fn test_locked_is_distinct_from_bad_credentials() {
        assert_ne!(AuthError::AccountLocked.code(), AuthError::InvalidCredentials.code());
    }

    #[test]
    fn test_store_error_mapping() {
        assert_eq!(AuthError::from(StoreError::Conflict("email")), AuthError::EmailTaken);
        assert_eq!(AuthError::from(StoreError::NotFound), AuthError::NotFound);
        assert!(matches!(
            AuthError::from(StoreError::LockTimeout),
            AuthError::Storage(_)
        ));
    }
}
