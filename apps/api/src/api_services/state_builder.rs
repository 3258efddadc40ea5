use corbel_application::{
    AssignmentService, AuditService, AuthorizationService, EffectivePermissionResolver,
    PermissionCatalogService, RoleService, TenantAdminService, TenantIsolationGuard,
};
use corbel_core::AppError;
use sqlx::PgPool;
use tracing::info;

use crate::api_config::ApiConfig;
use crate::state::AppState;

use super::redis::build_redis_client;

mod caches;
mod repositories;

/// Wires services over PostgreSQL and seeds the permission catalog.
pub async fn build_app_state(pool: PgPool, config: &ApiConfig) -> Result<AppState, AppError> {
    let redis_client = config
        .redis_url
        .as_deref()
        .map(build_redis_client)
        .transpose()?;

    let repositories = repositories::build_repository_set(&pool);
    let cache = caches::build_effective_permission_cache(&pool, config, redis_client.clone())?;

    let catalog_service = PermissionCatalogService::new(repositories.catalog_repository.clone());
    let seeded = catalog_service.seed_defaults().await?;
    info!(
        permissions = seeded.permissions,
        templates = seeded.templates,
        "permission catalog ready"
    );

    let resolver = EffectivePermissionResolver::new(
        repositories.assignment_repository.clone(),
        cache,
        config.resolver,
    );
    let authorization_service = AuthorizationService::new(
        TenantIsolationGuard::new(repositories.tenant_repository.clone()),
        resolver,
        repositories.catalog_repository.clone(),
        repositories.audit_repository.clone(),
    );

    Ok(AppState {
        role_service: RoleService::new(
            authorization_service.clone(),
            repositories.role_repository.clone(),
            repositories.catalog_repository.clone(),
            repositories.assignment_repository.clone(),
        ),
        assignment_service: AssignmentService::new(
            authorization_service.clone(),
            repositories.assignment_repository,
            repositories.role_repository,
            repositories.tenant_repository.clone(),
        ),
        audit_service: AuditService::new(
            authorization_service.clone(),
            repositories.audit_repository,
            repositories.audit_log_repository,
        ),
        tenant_admin_service: TenantAdminService::new(
            authorization_service.clone(),
            repositories.tenant_repository,
        ),
        authorization_service,
        catalog_service,
        frontend_url: config.frontend_url.clone(),
        bootstrap_token: config.bootstrap_token.clone(),
        postgres_pool: pool,
        redis_client,
        redis_required: config.requires_redis(),
        permission_cache_backend: config.permission_cache_backend,
    })
}
