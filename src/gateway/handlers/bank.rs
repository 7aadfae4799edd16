//! Money movement and account queries (JWT)

use std::sync::Arc;

use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResponse, ApiResult, StrictDecimal, ok};
use crate::account::AccountNumber;
use crate::ledger::Direction;
use crate::money::Balance;
use crate::transfer::HistoryEntry;
use crate::user_auth::AuthContext;

/// Transfer request
#[derive(Debug, Deserialize, ToSchema)]
pub struct TransferRequest {
    /// Recipient 8-digit account number
    #[schema(example = 12345678)]
    pub recipient_account_number: u32,
    /// Decimal string, at most 2 decimal places
    #[schema(value_type = String, example = "40.00")]
    pub amount: StrictDecimal,
}

/// Add funds request
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddFundsRequest {
    #[schema(value_type = String, example = "100.00")]
    pub amount: StrictDecimal,
}

/// Committed transfer
#[derive(Debug, Serialize, ToSchema)]
pub struct TransferResponse {
    #[schema(value_type = u32)]
    pub payer: AccountNumber,
    #[schema(value_type = u32)]
    pub recipient: AccountNumber,
    #[schema(example = "40.00")]
    pub amount: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    #[schema(value_type = u32)]
    pub account_number: AccountNumber,
    #[schema(value_type = String, example = "60.00")]
    pub balance: Balance,
}

/// One ledger entry from the caller's point of view
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionView {
    #[schema(value_type = u32)]
    pub payer: AccountNumber,
    #[schema(value_type = u32)]
    pub recipient: AccountNumber,
    pub direction: Direction,
    #[schema(example = "40.00")]
    pub amount: String,
    pub timestamp: String,
}

impl From<HistoryEntry> for TransactionView {
    fn from(e: HistoryEntry) -> Self {
        Self {
            payer: e.record.payer,
            recipient: e.record.recipient,
            direction: e.direction,
            amount: e.record.amount.to_string(),
            timestamp: e.record.timestamp.to_rfc3339(),
        }
    }
}

/// Transfer funds to another account
///
/// POST /api/v1/user/transfer
#[utoipa::path(
    post,
    path = "/api/v1/user/transfer",
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Transfer committed", body = ApiResponse<TransferResponse>),
        (status = 400, description = "Invalid amount or self-transfer"),
        (status = 404, description = "Recipient not found"),
        (status = 422, description = "Insufficient funds"),
        (status = 500, description = "Transfer failed")
    ),
    security(("jwt_auth" = [])),
    tag = "Bank"
)]
pub async fn transfer(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<TransferRequest>,
) -> ApiResult<TransferResponse> {
    // An out-of-range number cannot name an account
    let recipient = AccountNumber::new(req.recipient_account_number).map_err(|_| {
        ApiError::from(crate::transfer::TransferError::RecipientNotFound)
    })?;

    let record = state
        .engine
        .transfer(auth.account_id, recipient, req.amount.inner())
        .await?;

    ok(TransferResponse {
        payer: record.payer,
        recipient: record.recipient,
        amount: record.amount.to_string(),
        timestamp: record.timestamp.to_rfc3339(),
    })
}

/// Credit the caller's own account
///
/// POST /api/v1/user/add_funds
#[utoipa::path(
    post,
    path = "/api/v1/user/add_funds",
    request_body = AddFundsRequest,
    responses(
        (status = 200, description = "Funds added", body = ApiResponse<BalanceResponse>),
        (status = 400, description = "Invalid amount")
    ),
    security(("jwt_auth" = [])),
    tag = "Bank"
)]
pub async fn add_funds(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<AddFundsRequest>,
) -> ApiResult<BalanceResponse> {
    let balance = state
        .engine
        .add_funds(auth.account_id, req.amount.inner())
        .await?;
    let account = state.user_auth.profile(auth.account_id).await?;

    ok(BalanceResponse {
        account_number: account.account_number,
        balance,
    })
}

/// Caller's balance
///
/// GET /api/v1/user/balance
#[utoipa::path(
    get,
    path = "/api/v1/user/balance",
    responses(
        (status = 200, description = "Current balance", body = ApiResponse<BalanceResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt_auth" = [])),
    tag = "Bank"
)]
pub async fn balance(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<BalanceResponse> {
    let account = state.user_auth.profile(auth.account_id).await?;
    ok(BalanceResponse {
        account_number: account.account_number,
        balance: account.balance(),
    })
}

/// Caller's transaction history, oldest first
///
/// GET /api/v1/user/transactions
#[utoipa::path(
    get,
    path = "/api/v1/user/transactions",
    responses(
        (status = 200, description = "Transactions", body = ApiResponse<Vec<TransactionView>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt_auth" = [])),
    tag = "Bank"
)]
pub async fn transactions(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Vec<TransactionView>> {
    let history = state.engine.history(auth.account_id).await?;
    ok(history.into_iter().map(TransactionView::from).collect())
}
