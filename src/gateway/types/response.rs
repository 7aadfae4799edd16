//! API Response types and error codes
//!
//! - `ApiResponse<T>`: Unified response wrapper
//! - `ApiError` / `ApiResult<T>`: handler error plumbing
//! - `error_codes`: Standard error code constants

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::transfer::TransferError;
use crate::user_auth::AuthError;

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// All API responses follow this structure:
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: actual data (success) or null (error)
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response code: 0 for success, non-zero for errors
    #[schema(example = 0)]
    pub code: i32,
    /// Response message
    #[schema(example = "ok")]
    pub msg: String,
    /// Response data (only present when code == 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create success response
    pub fn success(data: T) -> Self {
        Self {
            code: error_codes::SUCCESS,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    /// Create error response
    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

// ============================================================================
// Handler Errors
// ============================================================================

/// Error returned by handlers; renders as an `ApiResponse<()>` envelope.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

pub type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

/// 200 OK with `data`
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(ApiResponse::success(data))))
}

/// 201 Created with `data`
pub fn created<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(data))))
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn unauthorized(code: i32, msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, msg)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ApiResponse::<()>::error(self.code, self.msg)),
        )
            .into_response()
    }
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl From<TransferError> for ApiError {
    fn from(e: TransferError) -> Self {
        let code = match &e {
            TransferError::InvalidAmount => error_codes::INVALID_AMOUNT,
            TransferError::RecipientNotFound => error_codes::RECIPIENT_NOT_FOUND,
            TransferError::SameAccount => error_codes::SAME_ACCOUNT,
            TransferError::InsufficientFunds => error_codes::INSUFFICIENT_FUNDS,
            TransferError::AccountLocked => error_codes::ACCOUNT_LOCKED,
            TransferError::NotFound => error_codes::ACCOUNT_NOT_FOUND,
            TransferError::TransferFailed(_) => error_codes::TRANSFER_FAILED,
            TransferError::StorageError(_) => error_codes::INTERNAL_ERROR,
        };
        // Storage internals stay in the log
        let msg = match &e {
            TransferError::TransferFailed(detail) => {
                tracing::error!(error = %detail, "Transfer failed");
                "Transfer failed".to_string()
            }
            TransferError::StorageError(detail) => {
                tracing::error!(error = %detail, "Storage error");
                "Internal error".to_string()
            }
            _ => e.to_string(),
        };
        Self::new(status(e.http_status()), code, msg)
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        let code = match &e {
            AuthError::Validation(_) => error_codes::INVALID_PARAMETER,
            AuthError::EmailTaken => error_codes::EMAIL_TAKEN,
            AuthError::InvalidCredentials | AuthError::InvalidToken => error_codes::AUTH_FAILED,
            AuthError::AccountLocked => error_codes::ACCOUNT_LOCKED,
            AuthError::TokenRevoked => error_codes::TOKEN_REVOKED,
            AuthError::Forbidden => error_codes::FORBIDDEN,
            AuthError::NotFound => error_codes::ACCOUNT_NOT_FOUND,
            AuthError::Hashing(_) | AuthError::Token(_) | AuthError::Storage(_) => {
                error_codes::INTERNAL_ERROR
            }
        };
        let msg = match &e {
            AuthError::Hashing(detail) | AuthError::Token(detail) | AuthError::Storage(detail) => {
                tracing::error!(error = %detail, code = e.code(), "Auth operation failed");
                "Internal error".to_string()
            }
            _ => e.to_string(),
        };
        Self::new(status(e.http_status()), code, msg)
    }
}

// ============================================================================
// Error Codes
// ============================================================================

/// Standard API error codes
pub mod error_codes {
    // Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const INSUFFICIENT_FUNDS: i32 = 1002;
    pub const INVALID_AMOUNT: i32 = 1003;
    pub const SAME_ACCOUNT: i32 = 1004;

    // Auth errors (2xxx)
    pub const MISSING_AUTH: i32 = 2001;
    pub const AUTH_FAILED: i32 = 2002;
    pub const ACCOUNT_LOCKED: i32 = 2003;
    pub const TOKEN_REVOKED: i32 = 2004;
    pub const FORBIDDEN: i32 = 2005;

    // Resource errors (4xxx)
    pub const ACCOUNT_NOT_FOUND: i32 = 4001;
    pub const RECIPIENT_NOT_FOUND: i32 = 4002;
    pub const EMAIL_TAKEN: i32 = 4009;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;
    pub const TRANSFER_FAILED: i32 = 5002;
}
