use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

use super::middleware::AuthContext;
use super::service::{AccountView, AuthResponse, LoginRequest, RegisterRequest};
use crate::account::Role;
use crate::gateway::state::AppState;
use crate::gateway::types::{ApiResponse, ApiResult, created, ok};

/// Register a new user
///
/// POST /api/v1/auth/register
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = ApiResponse<AccountView>),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<AccountView> {
    register_as(&state, Role::User, req).await
}

/// Login user
///
/// POST /api/v1/auth/login
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account locked"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<AuthResponse> {
    ok(state.user_auth.login(Role::User, req).await?)
}

/// Register a new admin
///
/// POST /api/v1/admin/register
#[utoipa::path(
    post,
    path = "/api/v1/admin/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Admin registered successfully", body = ApiResponse<AccountView>),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered")
    ),
    tag = "Admin"
)]
pub async fn admin_register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<AccountView> {
    register_as(&state, Role::Admin, req).await
}

/// Login admin
///
/// POST /api/v1/admin/login
#[utoipa::path(
    post,
    path = "/api/v1/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account locked")
    ),
    tag = "Admin"
)]
pub async fn admin_login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<AuthResponse> {
    ok(state.user_auth.login(Role::Admin, req).await?)
}

async fn register_as(state: &AppState, role: Role, req: RegisterRequest) -> ApiResult<AccountView> {
    let account = state.user_auth.register(role, req).await?;
    created(AccountView::from(&account))
}

/// Logout: revoke the bearer token
///
/// POST /api/v1/user/logout
#[utoipa::path(
    post,
    path = "/api/v1/user/logout",
    responses(
        (status = 200, description = "Token revoked"),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt_auth" = [])),
    tag = "User"
)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<()> {
    state.user_auth.logout(&auth.token)?;
    ok(())
}

/// Current principal
///
/// GET /api/v1/user/profile
#[utoipa::path(
    get,
    path = "/api/v1/user/profile",
    responses(
        (status = 200, description = "Caller's account", body = ApiResponse<AccountView>),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt_auth" = [])),
    tag = "User"
)]
pub async fn profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<AccountView> {
    let account = state.user_auth.profile(auth.account_id).await?;
    ok(AccountView::from(&account))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LookupQuery {
    /// Email of the principal to fetch
    pub email: String,
}

/// Look up a principal by email (admin only)
///
/// GET /api/v1/admin/user?email=
#[utoipa::path(
    get,
    path = "/api/v1/admin/user",
    params(LookupQuery),
    responses(
        (status = 200, description = "Principal found", body = ApiResponse<AccountView>),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "No principal with that email")
    ),
    security(("jwt_auth" = [])),
    tag = "Admin"
)]
pub async fn lookup_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<LookupQuery>,
) -> ApiResult<AccountView> {
    let account = state
        .user_auth
        .lookup_by_email(auth.account_id, &query.email)
        .await?;
    ok(AccountView::from(&account))
}
