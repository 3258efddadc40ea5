use async_trait::async_trait;
use chrono::{DateTime, Utc};
use corbel_application::{
    ActiveProjectGrant, ActiveRoleGrant, AssignmentQuery, AssignmentRepository, AuditEvent,
};
use corbel_core::{AppError, AppResult, TenantId, UserId};
use corbel_domain::{
    AssignmentId, NewProjectAssignment, NewRoleAssignment, ProjectAssignment,
    ProjectAssignmentId, ProjectId, RoleAssignment, RoleId,
};
use sqlx::{FromRow, PgPool};

use crate::postgres_audit_repository::insert_audit_event;
use crate::postgres_support::{
    begin, commit, decode_permissions, encode_permissions, map_sqlx_error,
};

mod grants;
mod project_assignments;
mod role_assignments;

#[cfg(test)]
mod tests;

/// PostgreSQL-backed repository for tenant and project role assignments.
#[derive(Clone)]
pub struct PostgresAssignmentRepository {
    pool: PgPool,
}

impl PostgresAssignmentRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleAssignmentRow {
    id: i64,
    tenant_id: i64,
    user_id: i64,
    role_id: i64,
    granted_by: i64,
    granted_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    is_active: bool,
    revoked_by: Option<i64>,
    revoked_at: Option<DateTime<Utc>>,
}

impl From<RoleAssignmentRow> for RoleAssignment {
    fn from(row: RoleAssignmentRow) -> Self {
        Self {
            assignment_id: AssignmentId::new(row.id),
            tenant_id: TenantId::new(row.tenant_id),
            user_id: UserId::new(row.user_id),
            role_id: RoleId::new(row.role_id),
            granted_by: UserId::new(row.granted_by),
            granted_at: row.granted_at,
            expires_at: row.expires_at,
            is_active: row.is_active,
            revoked_by: row.revoked_by.map(UserId::new),
            revoked_at: row.revoked_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ProjectAssignmentRow {
    id: i64,
    tenant_id: i64,
    project_id: i64,
    user_id: i64,
    role_id: i64,
    permission_overrides: Vec<i16>,
    granted_by: i64,
    granted_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    is_active: bool,
    revoked_by: Option<i64>,
    revoked_at: Option<DateTime<Utc>>,
}

impl TryFrom<ProjectAssignmentRow> for ProjectAssignment {
    type Error = AppError;

    fn try_from(row: ProjectAssignmentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            assignment_id: ProjectAssignmentId::new(row.id),
            tenant_id: TenantId::new(row.tenant_id),
            project_id: ProjectId::new(row.project_id),
            user_id: UserId::new(row.user_id),
            role_id: RoleId::new(row.role_id),
            permission_overrides: decode_permissions(&row.permission_overrides)?,
            granted_by: UserId::new(row.granted_by),
            granted_at: row.granted_at,
            expires_at: row.expires_at,
            is_active: row.is_active,
            revoked_by: row.revoked_by.map(UserId::new),
            revoked_at: row.revoked_at,
        })
    }
}

/// Maps a unique violation on the active-assignment index to a clear conflict.
fn duplicate_assignment(error: sqlx::Error, context: &str) -> AppError {
    match map_sqlx_error(error, context) {
        AppError::Conflict(_) => {
            AppError::Conflict("an active assignment of this role already exists".to_owned())
        }
        other => other,
    }
}

#[async_trait]
impl AssignmentRepository for PostgresAssignmentRepository {
    async fn create_role_assignment(
        &self,
        tenant_id: TenantId,
        assignment: NewRoleAssignment,
        audit: AuditEvent,
    ) -> AppResult<RoleAssignment> {
        self.create_role_assignment_impl(tenant_id, assignment, audit)
            .await
    }

    async fn revoke_role_assignment(
        &self,
        tenant_id: TenantId,
        assignment_id: AssignmentId,
        revoked_by: UserId,
        audit: AuditEvent,
    ) -> AppResult<RoleAssignment> {
        self.revoke_role_assignment_impl(tenant_id, assignment_id, revoked_by, audit)
            .await
    }

    async fn list_role_assignments(
        &self,
        tenant_id: TenantId,
        query: AssignmentQuery,
    ) -> AppResult<Vec<RoleAssignment>> {
        self.list_role_assignments_impl(tenant_id, query).await
    }

    async fn create_project_assignment(
        &self,
        tenant_id: TenantId,
        assignment: NewProjectAssignment,
        audit: AuditEvent,
    ) -> AppResult<ProjectAssignment> {
        self.create_project_assignment_impl(tenant_id, assignment, audit)
            .await
    }

    async fn revoke_project_assignment(
        &self,
        tenant_id: TenantId,
        assignment_id: ProjectAssignmentId,
        revoked_by: UserId,
        audit: AuditEvent,
    ) -> AppResult<ProjectAssignment> {
        self.revoke_project_assignment_impl(tenant_id, assignment_id, revoked_by, audit)
            .await
    }

    async fn list_project_assignments(
        &self,
        tenant_id: TenantId,
        query: AssignmentQuery,
    ) -> AppResult<Vec<ProjectAssignment>> {
        self.list_project_assignments_impl(tenant_id, query).await
    }

    async fn list_active_role_grants(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Vec<ActiveRoleGrant>> {
        self.list_active_role_grants_impl(tenant_id, user_id).await
    }

    async fn list_active_project_grants(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        project_id: ProjectId,
    ) -> AppResult<Vec<ActiveProjectGrant>> {
        self.list_active_project_grants_impl(tenant_id, user_id, project_id)
            .await
    }

    async fn list_role_holders(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
    ) -> AppResult<Vec<UserId>> {
        self.list_role_holders_impl(tenant_id, role_id).await
    }
}
