//! Gateway types module
//!
//! ## Input Types
//! - [`StrictDecimal`]: Format-validated decimal for API input
//!
//! ## Output Types
//! - [`ApiResponse<T>`]: Unified API response wrapper
//! - [`ApiError`]: Handler error rendered as an `ApiResponse<()>`

pub mod money;
pub mod response;

// Re-export commonly used types at module root
pub use money::StrictDecimal;
pub use response::{ApiError, ApiResponse, ApiResult, created, error_codes, ok};
