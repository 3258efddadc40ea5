use async_trait::async_trait;
use corbel_core::{AppResult, TenantId};
use corbel_domain::{NewRole, Role, RoleId, RoleUpdate};

use super::audit::AuditEvent;

/// Repository port for tenant roles.
///
/// Mutations persist the audit event in the same transaction as the change.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Creates a role. Duplicate names in tenant scope are a conflict.
    async fn create_role(
        &self,
        tenant_id: TenantId,
        role: NewRole,
        audit: AuditEvent,
    ) -> AppResult<Role>;

    /// Finds a role in tenant scope.
    async fn find_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Lists roles in tenant scope, active and inactive.
    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<Role>>;

    /// Applies an allow-listed update.
    async fn update_role(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
        update: RoleUpdate,
        audit: AuditEvent,
    ) -> AppResult<Role>;

    /// Soft-deactivates a role.
    async fn deactivate_role(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
        audit: AuditEvent,
    ) -> AppResult<Role>;
}
