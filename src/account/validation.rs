//! Registration input validation
//!
//! Email syntax is checked with the `validator` crate; everything else is a
//! plain length/emptiness rule.

use validator::ValidateEmail;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 8;

/// Validation errors for registration input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid email: '{0}'")]
    InvalidEmail(String),

    #[error("Password too short: expected at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

/// Canonical form used for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Validate and normalize an email address.
///
/// # Examples
/// ```
/// use payment_system::account::validation::validate_email;
///
/// assert_eq!(validate_email(" Ada@Example.com ").unwrap(), "ada@example.com");
/// assert!(validate_email("not-an-email").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<String, ValidationError> {
    let normalized = normalize_email(email);
    if normalized.is_empty() {
        return Err(ValidationError::MissingField("email"));
    }
    if !normalized.validate_email() {
        return Err(ValidationError::InvalidEmail(email.trim().to_string()));
    }
    Ok(normalized)
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::MissingField("password"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

/// Trimmed, non-empty text field.
pub fn require(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(value.to_string())
}
