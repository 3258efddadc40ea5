use axum::Router;
use axum::routing::{get, post};

use crate::handlers;
use crate::state::AppState;

/// Cross-tenant routes; every handler verifies the platform principal itself.
pub(super) fn build_platform_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/platform/tenants",
            get(handlers::platform::list_tenants_handler)
                .post(handlers::platform::create_tenant_handler),
        )
        .route(
            "/api/platform/tenants/{tenant_id}/status",
            post(handlers::platform::set_tenant_status_handler),
        )
        .route(
            "/api/platform/tenants/{tenant_id}/users/{user_id}/effective-permissions",
            get(handlers::platform::platform_effective_permissions_handler),
        )
        .route(
            "/api/platform/audit-log",
            get(handlers::platform::platform_audit_log_handler),
        )
}
