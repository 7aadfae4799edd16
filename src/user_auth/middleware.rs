use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::service::Claims;
use crate::account::AccountId;
use crate::gateway::{
    state::AppState,
    types::{ApiError, error_codes},
};

/// Authenticated caller, injected into request extensions.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub account_id: AccountId,
    /// Raw bearer token, needed for logout
    pub token: String,
    pub claims: Claims,
}

pub async fn jwt_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Extract Authorization header
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            ApiError::unauthorized(error_codes::MISSING_AUTH, "Missing Authorization header")
        })?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized(error_codes::AUTH_FAILED, "Invalid token format"))?
        .to_string();

    // 2. Verify token (signature, expiry, blacklist)
    let claims = state.user_auth.verify_token(&token)?;
    let account_id = claims.account_id()?;

    // 3. Inject caller
    request.extensions_mut().insert(AuthContext {
        account_id,
        token,
        claims,
    });
    Ok(next.run(request).await)
}
