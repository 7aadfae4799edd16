//! User authentication
//!
//! Registration, login through the [`LoginAttemptGuard`], JWT issuance and
//! revocation. One flow serves every [`Role`](crate::account::Role).

pub mod blacklist;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod middleware;
pub mod password;
pub mod service;

pub use blacklist::TokenBlacklist;
pub use error::AuthError;
pub use guard::{AttemptOutcome, DEFAULT_MAX_FAILED_LOGINS, LoginAttemptGuard};
pub use middleware::{AuthContext, jwt_auth_middleware};
pub use service::{AuthResponse, Claims, LoginRequest, RegisterRequest, UserAuthService};
