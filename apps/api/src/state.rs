use corbel_application::{
    AssignmentService, AuditService, AuthorizationService, PermissionCatalogService, RoleService,
    TenantAdminService,
};
use sqlx::PgPool;

use crate::api_config::PermissionCacheBackend;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub authorization_service: AuthorizationService,
    pub catalog_service: PermissionCatalogService,
    pub role_service: RoleService,
    pub assignment_service: AssignmentService,
    pub audit_service: AuditService,
    pub tenant_admin_service: TenantAdminService,
    pub frontend_url: String,
    pub bootstrap_token: String,
    pub postgres_pool: PgPool,
    pub redis_client: Option<redis::Client>,
    pub redis_required: bool,
    pub permission_cache_backend: PermissionCacheBackend,
}
