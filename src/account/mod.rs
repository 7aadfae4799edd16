//! Account management module
//!
//! Account records, identifiers, account number assignment and registration
//! input validation. Persistence lives in [`crate::store`].

pub mod models;
pub mod number;
pub mod validation;

// Re-export commonly used types
pub use models::{Account, AccountId, AccountNumber, InvalidAccountNumber, NewAccount, Role};
pub use number::AccountNumberGenerator;
pub use validation::ValidationError;
