use std::collections::BTreeSet;

use async_trait::async_trait;
use corbel_core::{AppResult, TenantId, UserId};
use corbel_domain::{
    AssignmentId, NewProjectAssignment, NewRoleAssignment, Permission, ProjectAssignment,
    ProjectAssignmentId, ProjectId, RoleAssignment, RoleId,
};

use super::audit::AuditEvent;

/// Permissions one active tenant assignment contributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRoleGrant {
    /// Contributing role.
    pub role_id: RoleId,
    /// Bundle of the role's template, empty without one.
    pub template_permissions: BTreeSet<Permission>,
    /// Role custom permissions.
    pub custom_permissions: BTreeSet<Permission>,
}

/// Permissions one active project assignment contributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveProjectGrant {
    /// Contributing assignment.
    pub assignment_id: ProjectAssignmentId,
    /// Contributing role.
    pub role_id: RoleId,
    /// Bundle of the role's template, empty without one.
    pub template_permissions: BTreeSet<Permission>,
    /// Role custom permissions.
    pub custom_permissions: BTreeSet<Permission>,
    /// Assignment-level additions.
    pub permission_overrides: BTreeSet<Permission>,
}

/// Listing filter for assignments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignmentQuery {
    /// Only assignments of this user.
    pub user_id: Option<UserId>,
    /// Only project assignments on this project.
    pub project_id: Option<ProjectId>,
    /// Include revoked and expired rows.
    pub include_inactive: bool,
}

/// Repository port for tenant and project role assignments.
///
/// Every read filters `is_active` and expiry at query time; mutations persist
/// the audit event in the same transaction as the change.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Creates a tenant-scope assignment. A duplicate active pair is a conflict.
    async fn create_role_assignment(
        &self,
        tenant_id: TenantId,
        assignment: NewRoleAssignment,
        audit: AuditEvent,
    ) -> AppResult<RoleAssignment>;

    /// Revokes an active tenant-scope assignment.
    async fn revoke_role_assignment(
        &self,
        tenant_id: TenantId,
        assignment_id: AssignmentId,
        revoked_by: UserId,
        audit: AuditEvent,
    ) -> AppResult<RoleAssignment>;

    /// Lists tenant-scope assignments.
    async fn list_role_assignments(
        &self,
        tenant_id: TenantId,
        query: AssignmentQuery,
    ) -> AppResult<Vec<RoleAssignment>>;

    /// Creates a project-scope assignment.
    async fn create_project_assignment(
        &self,
        tenant_id: TenantId,
        assignment: NewProjectAssignment,
        audit: AuditEvent,
    ) -> AppResult<ProjectAssignment>;

    /// Revokes an active project-scope assignment.
    async fn revoke_project_assignment(
        &self,
        tenant_id: TenantId,
        assignment_id: ProjectAssignmentId,
        revoked_by: UserId,
        audit: AuditEvent,
    ) -> AppResult<ProjectAssignment>;

    /// Lists project-scope assignments.
    async fn list_project_assignments(
        &self,
        tenant_id: TenantId,
        query: AssignmentQuery,
    ) -> AppResult<Vec<ProjectAssignment>>;

    /// Lists grants of the user's active tenant assignments on active roles.
    async fn list_active_role_grants(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Vec<ActiveRoleGrant>>;

    /// Lists grants of the user's active project assignments on active roles.
    async fn list_active_project_grants(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        project_id: ProjectId,
    ) -> AppResult<Vec<ActiveProjectGrant>>;

    /// Lists users holding any active tenant or project assignment of the role.
    async fn list_role_holders(&self, tenant_id: TenantId, role_id: RoleId)
    -> AppResult<Vec<UserId>>;
}
