use std::sync::Arc;

use corbel_application::{
    AssignmentRepository, AuditLogRepository, AuditRepository, PermissionCatalogRepository,
    RoleRepository, TenantRepository,
};
use corbel_infrastructure::{
    PostgresAssignmentRepository, PostgresAuditLogRepository, PostgresAuditRepository,
    PostgresCatalogRepository, PostgresRoleRepository, PostgresTenantRepository,
};
use sqlx::PgPool;

pub(super) struct RepositorySet {
    pub(super) tenant_repository: Arc<dyn TenantRepository>,
    pub(super) catalog_repository: Arc<dyn PermissionCatalogRepository>,
    pub(super) role_repository: Arc<dyn RoleRepository>,
    pub(super) assignment_repository: Arc<dyn AssignmentRepository>,
    pub(super) audit_repository: Arc<dyn AuditRepository>,
    pub(super) audit_log_repository: Arc<dyn AuditLogRepository>,
}

pub(super) fn build_repository_set(pool: &PgPool) -> RepositorySet {
    RepositorySet {
        tenant_repository: Arc::new(PostgresTenantRepository::new(pool.clone())),
        catalog_repository: Arc::new(PostgresCatalogRepository::new(pool.clone())),
        role_repository: Arc::new(PostgresRoleRepository::new(pool.clone())),
        assignment_repository: Arc::new(PostgresAssignmentRepository::new(pool.clone())),
        audit_repository: Arc::new(PostgresAuditRepository::new(pool.clone())),
        audit_log_repository: Arc::new(PostgresAuditLogRepository::new(pool.clone())),
    }
}
