use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use super::blacklist::TokenBlacklist;
use super::error::AuthError;
use super::guard::LoginAttemptGuard;
use super::password::{hash_password, verify_password};
use crate::account::validation::{normalize_email, require, validate_email, validate_password};
use crate::account::{Account, AccountId, AccountNumber, AccountNumberGenerator, NewAccount, Role};
use crate::store::{AccountStore, StoreError, TransactionalStore};

/// Registration attempts before an account number conflict is reported.
const MAX_REGISTER_ATTEMPTS: usize = 4;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Subject (account_id as string)
    pub role: Role,
    pub jti: String,
    pub exp: usize, // Expiration time (as UTC timestamp)
    pub iat: usize, // Issued at
}

impl Claims {
    pub fn account_id(&self) -> Result<AccountId, AuthError> {
        self.sub
            .parse::<i64>()
            .map(AccountId::new)
            .map_err(|_| AuthError::InvalidToken)
    }
}

/// Registration Request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "password123")]
    pub password: String,
    #[schema(example = "Ada")]
    pub first_name: String,
    #[schema(example = "Lovelace")]
    pub last_name: String,
    #[schema(example = "+2348012345678")]
    #[serde(default)]
    pub phone: Option<String>,
}

/// Login Request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "password123")]
    pub password: String,
}

/// Public view of a principal
#[derive(Debug, Serialize, ToSchema)]
pub struct AccountView {
    pub account_id: i64,
    #[schema(value_type = u32, example = 12345678)]
    pub account_number: AccountNumber,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub is_locked: bool,
    pub created_at: String,
}

impl From<&Account> for AccountView {
    fn from(a: &Account) -> Self {
        Self {
            account_id: a.id.get(),
            account_number: a.account_number,
            email: a.email.clone(),
            first_name: a.first_name.clone(),
            last_name: a.last_name.clone(),
            phone: a.phone.clone(),
            role: a.role,
            is_locked: a.is_locked(),
            created_at: a.created_at.to_rfc3339(),
        }
    }
}

/// Auth Response (JWT)
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: usize,
    pub account: AccountView,
}

/// Registration, login and token lifecycle for every [`Role`].
pub struct UserAuthService {
    store: Arc<dyn TransactionalStore>,
    numbers: Arc<AccountNumberGenerator>,
    guard: LoginAttemptGuard,
    blacklist: TokenBlacklist,
    jwt_secret: String,
    jwt_ttl: Duration,
}

impl UserAuthService {
    pub fn new(
        store: Arc<dyn TransactionalStore>,
        numbers: Arc<AccountNumberGenerator>,
        guard: LoginAttemptGuard,
        jwt_secret: String,
        jwt_ttl: Duration,
    ) -> Self {
        Self {
            store,
            numbers,
            guard,
            blacklist: TokenBlacklist::new(),
            jwt_secret,
            jwt_ttl,
        }
    }

    /// Register a new principal with `role`.
    pub async fn register(&self, role: Role, req: RegisterRequest) -> Result<Account, AuthError> {
        // 1. Validate input
        let email = validate_email(&req.email)?;
        validate_password(&req.password)?;
        let first_name = require("first_name", &req.first_name)?;
        let last_name = require("last_name", &req.last_name)?;
        let phone = req
            .phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        // 2. Reject duplicates early; the unique index still decides races
        match self.store.get_by_email(&email).await {
            Ok(_) => return Err(AuthError::EmailTaken),
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        // 3. Hash password
        let password_hash = hash_password(&req.password)?;

        // 4. Insert, redrawing the account number on collision
        for attempt in 1..=MAX_REGISTER_ATTEMPTS {
            let account_number = self.numbers.generate(self.store.as_ref()).await?;
            let new = NewAccount {
                account_number,
                email: email.clone(),
                password_hash: password_hash.clone(),
                first_name: first_name.clone(),
                last_name: last_name.clone(),
                phone: phone.clone(),
                role,
            };
            match self.store.create(new).await {
                Ok(account) => {
                    info!(
                        account_id = %account.id,
                        account_number = %account.account_number,
                        role = %role,
                        "Principal registered"
                    );
                    return Ok(account);
                }
                Err(StoreError::Conflict("account_number")) => {
                    warn!(attempt, account_number = %account_number, "Account number taken, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(StoreError::Conflict("account_number").into())
    }

    /// Authenticate a principal of `role` and issue a JWT.
    ///
    /// A principal of another role is reported as bad credentials and does
    /// not count against the login guard.
    pub async fn login(&self, role: Role, req: LoginRequest) -> Result<AuthResponse, AuthError> {
        // 1. Find principal by email
        let email = normalize_email(&req.email);
        let account = match self.store.get_by_email(&email).await {
            Ok(account) if account.role == role => account,
            Ok(_) | Err(StoreError::NotFound) => return Err(AuthError::InvalidCredentials),
            Err(e) => return Err(e.into()),
        };

        // 2. Verify password through the guard
        let password = req.password;
        let account = self
            .guard
            .authenticate(self.store.as_ref(), account.id, move |acc| {
                verify_password(&password, &acc.password_hash)
            })
            .await?;

        // 3. Generate JWT
        let (token, expires_at) = self.issue_token(&account)?;
        info!(account_id = %account.id, role = %role, "Login succeeded");

        Ok(AuthResponse {
            token,
            expires_at,
            account: AccountView::from(&account),
        })
    }

    fn issue_token(&self, account: &Account) -> Result<(String, usize), AuthError> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(self.jwt_ttl)
            .ok_or_else(|| AuthError::Token("expiry out of range".to_string()))?
            .timestamp();

        let claims = Claims {
            sub: account.id.to_string(),
            role: account.role,
            jti: format!("{:016x}", rand::random::<u64>()),
            exp: expiration as usize,
            iat: now.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::Token(e.to_string()))?;

        Ok((token, claims.exp))
    }

    /// Verify JWT token
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        if self.blacklist.is_revoked(token) {
            return Err(AuthError::TokenRevoked);
        }
        let decoding_key = DecodingKey::from_secret(self.jwt_secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);
        let token_data =
            decode::<Claims>(token, &decoding_key, &validation).map_err(|_| AuthError::InvalidToken)?;
        Ok(token_data.claims)
    }

    /// Revoke a token for the rest of its lifetime.
    pub fn logout(&self, token: &str) -> Result<(), AuthError> {
        let claims = self.verify_token(token)?;
        self.blacklist.revoke(token, claims.exp);
        info!(account_id = %claims.sub, "Logged out");
        Ok(())
    }

    /// Fetch the caller's own record.
    pub async fn profile(&self, account_id: AccountId) -> Result<Account, AuthError> {
        Ok(self.store.get_by_id(account_id).await?)
    }

    /// Look up any principal by email. Admin only.
    pub async fn lookup_by_email(
        &self,
        requester: AccountId,
        email: &str,
    ) -> Result<Account, AuthError> {
        let requester = self.store.get_by_id(requester).await?;
        if !requester.role.can_lookup_principals() {
            return Err(AuthError::Forbidden);
        }
        Ok(self.store.get_by_email(&normalize_email(email)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> UserAuthService {
        UserAuthService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(AccountNumberGenerator::from_seed(1)),
            LoginAttemptGuard::default(),
            "test-secret".to_string(),
            Duration::hours(1),
        )
    }

    fn register_req(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "password123".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone: None,
        }
    }

    fn login_req(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_starts_empty() {
        let svc = service();
        let account = svc.register(Role::User, register_req("Ada@Example.com")).await.unwrap();

        assert_eq!(account.email, "ada@example.com");
        assert_eq!(account.balance().value(), rust_decimal::Decimal::ZERO);
        assert_eq!(account.failed_logins(), 0);
        assert!(!account.is_locked());
        assert_ne!(account.password_hash, "password123");
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_and_bad_input() {
        let svc = service();
        svc.register(Role::User, register_req("ada@example.com")).await.unwrap();

        let dup = svc.register(Role::Admin, register_req("ADA@example.com")).await;
        assert_eq!(dup.unwrap_err(), AuthError::EmailTaken);

        let bad_email = svc.register(Role::User, register_req("nope")).await;
        assert!(matches!(bad_email.unwrap_err(), AuthError::Validation(_)));

        let mut short = register_req("b@example.com");
        short.password = "short".to_string();
        assert!(matches!(
            svc.register(Role::User, short).await.unwrap_err(),
            AuthError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_registered_numbers_are_unique() {
        let svc = service();
        let mut seen = std::collections::HashSet::new();
        for i in 0..5 {
            let account = svc
                .register(Role::User, register_req(&format!("u{}@example.com", i)))
                .await
                .unwrap();
            assert!(seen.insert(account.account_number));
        }
    }

    #[tokio::test]
    async fn test_login_issues_verifiable_token() {
        let svc = service();
        let account = svc.register(Role::User, register_req("ada@example.com")).await.unwrap();

        let resp = svc
            .login(Role::User, login_req("ada@example.com", "password123"))
            .await
            .unwrap();
        let claims = svc.verify_token(&resp.token).unwrap();
        assert_eq!(claims.account_id().unwrap(), account.id);
        assert_eq!(claims.role, Role::User);
    }

    #[tokio::test]
    async fn test_login_wrong_role_is_bad_credentials() {
        let svc = service();
        svc.register(Role::User, register_req("ada@example.com")).await.unwrap();

        let err = svc
            .login(Role::Admin, login_req("ada@example.com", "password123"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_fourth_attempt_with_correct_password_is_locked() {
        let svc = service();
        svc.register(Role::User, register_req("c@example.com")).await.unwrap();

        for _ in 0..3 {
            let err = svc
                .login(Role::User, login_req("c@example.com", "wrong-password"))
                .await
                .unwrap_err();
            assert_eq!(err, AuthError::InvalidCredentials);
        }
        let err = svc
            .login(Role::User, login_req("c@example.com", "password123"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::AccountLocked);
    }

    #[tokio::test]
    async fn test_logout_revokes_token() {
        let svc = service();
        svc.register(Role::User, register_req("ada@example.com")).await.unwrap();
        let resp = svc
            .login(Role::User, login_req("ada@example.com", "password123"))
            .await
            .unwrap();

        svc.logout(&resp.token).unwrap();
        assert_eq!(svc.verify_token(&resp.token).unwrap_err(), AuthError::TokenRevoked);
        assert_eq!(svc.logout(&resp.token).unwrap_err(), AuthError::TokenRevoked);
    }

    #[tokio::test]
    async fn test_tampered_token_rejected() {
        let svc = service();
        assert_eq!(svc.verify_token("not.a.jwt").unwrap_err(), AuthError::InvalidToken);
    }

    #[tokio::test]
    async fn test_lookup_requires_admin() {
        let svc = service();
        let user = svc.register(Role::User, register_req("u@example.com")).await.unwrap();
        let admin = svc.register(Role::Admin, register_req("a@example.com")).await.unwrap();

        assert_eq!(
            svc.lookup_by_email(user.id, "a@example.com").await.unwrap_err(),
            AuthError::Forbidden
        );
        let found = svc.lookup_by_email(admin.id, "U@example.com").await.unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(
            svc.lookup_by_email(admin.id, "ghost@example.com").await.unwrap_err(),
            AuthError::NotFound
        );
    }
}
