//! Health check handler

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::{Json, extract::State, http::StatusCode};
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::{ApiResponse, error_codes};

/// Health check response data
#[derive(serde::Serialize, ToSchema)]
pub struct HealthResponse {
    /// Server timestamp in milliseconds
    #[schema(example = 1703494800000_u64)]
    pub timestamp_ms: u64,
}

/// Only ping the database once per interval
const CHECK_INTERVAL_MS: u64 = 5000;

/// Health check endpoint
///
/// Pings PostgreSQL when configured. Internal details are never exposed.
///
/// - Healthy: 200 OK + {code: 0, data: {timestamp_ms}}
/// - Unhealthy: 503 Service Unavailable + {code: 5001, msg: "unavailable"}
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse, content_type = "application/json"),
        (status = 503, description = "Service unavailable")
    ),
    tag = "System"
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    static LAST_CHECK_MS: AtomicU64 = AtomicU64::new(0);

    let now_ms = chrono::Utc::now().timestamp_millis().max(0) as u64;

    let last_check = LAST_CHECK_MS.load(Ordering::Relaxed);
    let healthy = match state.pg_db {
        Some(ref db) if now_ms.saturating_sub(last_check) > CHECK_INTERVAL_MS => {
            match db.health_check().await {
                Ok(()) => {
                    LAST_CHECK_MS.store(now_ms, Ordering::Relaxed);
                    true
                }
                Err(e) => {
                    tracing::error!("[HEALTH] PostgreSQL ping failed: {}", e);
                    false
                }
            }
        }
        // In-memory store, or checked recently
        _ => true,
    };

    if healthy {
        (
            StatusCode::OK,
            Json(ApiResponse::success(HealthResponse {
                timestamp_ms: now_ms,
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse {
                code: error_codes::SERVICE_UNAVAILABLE,
                msg: "unavailable".to_string(),
                data: None,
            }),
        )
    }
}
