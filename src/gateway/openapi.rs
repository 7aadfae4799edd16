//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::account::Role;
use crate::gateway::handlers::{
    AddFundsRequest, BalanceResponse, HealthResponse, TransactionView, TransferRequest,
    TransferResponse,
};
use crate::ledger::Direction;
use crate::user_auth::service::{AccountView, AuthResponse, LoginRequest, RegisterRequest};

/// JWT bearer authentication security scheme
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            let bearer = HttpBuilder::new()
                .scheme(HttpAuthScheme::Bearer)
                .bearer_format("JWT")
                .description(Some("Token from /api/v1/auth/login or /api/v1/admin/login"))
                .build();
            components.add_security_scheme("jwt_auth", SecurityScheme::Http(bearer));
        }
    }
}

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Payment System API",
        version = "1.0.0",
        description = "Accounts, authentication and atomic funds transfers.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health::health_check,
        crate::user_auth::handlers::register,
        crate::user_auth::handlers::login,
        crate::user_auth::handlers::admin_register,
        crate::user_auth::handlers::admin_login,
        crate::user_auth::handlers::lookup_user,
        crate::user_auth::handlers::profile,
        crate::user_auth::handlers::logout,
        crate::gateway::handlers::bank::transfer,
        crate::gateway::handlers::bank::add_funds,
        crate::gateway::handlers::bank::balance,
        crate::gateway::handlers::bank::transactions,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            AccountView,
            Role,
            TransferRequest,
            TransferResponse,
            AddFundsRequest,
            BalanceResponse,
            TransactionView,
            Direction,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "User registration and login"),
        (name = "Admin", description = "Admin registration, login and principal lookup"),
        (name = "User", description = "Session and profile (JWT required)"),
        (name = "Bank", description = "Transfers, deposits and history (JWT required)"),
        (name = "System", description = "Health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::OpenApi;

    #[test]
    fn test_openapi_document_generates() {
        let doc = ApiDoc::openapi();
        assert_eq!(doc.info.title, "Payment System API");
        assert_eq!(doc.info.version, "1.0.0");
    }

    #[test]
    fn test_openapi_json_serializable() {
        let doc = ApiDoc::openapi();
        let json_str = doc.to_json().expect("document should serialize");
        assert!(json_str.contains("Payment System API"));
    }

    #[test]
    fn test_endpoints_registered() {
        let doc = ApiDoc::openapi();
        let paths = doc.paths;
        assert!(paths.paths.contains_key("/api/v1/health"));
        assert!(paths.paths.contains_key("/api/v1/auth/register"));
        assert!(paths.paths.contains_key("/api/v1/user/transfer"));
        assert!(paths.paths.contains_key("/api/v1/user/transactions"));
        assert!(paths.paths.contains_key("/api/v1/admin/user"));
    }

    #[test]
    fn test_security_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("should have components");
        assert!(components.security_schemes.contains_key("jwt_auth"));
    }
}
