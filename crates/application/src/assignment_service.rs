use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use corbel_core::{AppError, AppResult, Principal, UserId};
use corbel_domain::{
    AssignmentId, AuditAction, NewProjectAssignment, NewRoleAssignment, Permission,
    ProjectAssignment, ProjectAssignmentId, ProjectId, Role, RoleAssignment, RoleId,
    ensure_tenant_may_hold,
};
use serde_json::json;
use tracing::info;

use crate::access_ports::{
    AssignmentQuery, AssignmentRepository, AuditEvent, RoleRepository, TenantRepository,
};
use crate::authorization_service::AuthorizationService;
use crate::tenant_guard::TenantScope;

/// Input payload for tenant-scope role assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignRoleInput {
    /// Assigned user.
    pub user_id: UserId,
    /// Granted role.
    pub role_id: RoleId,
    /// Optional expiry; must be in the future.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Input payload for project-scope role assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignProjectRoleInput {
    /// Project the grant is limited to.
    pub project_id: ProjectId,
    /// Assigned user.
    pub user_id: UserId,
    /// Granted role.
    pub role_id: RoleId,
    /// Additional permissions granted only within the project.
    pub permission_overrides: BTreeSet<Permission>,
    /// Optional expiry; must be in the future.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Application service binding users to roles at tenant and project scope.
#[derive(Clone)]
pub struct AssignmentService {
    authorization_service: AuthorizationService,
    assignment_repository: Arc<dyn AssignmentRepository>,
    role_repository: Arc<dyn RoleRepository>,
    tenant_repository: Arc<dyn TenantRepository>,
}

impl AssignmentService {
    /// Creates an assignment service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        assignment_repository: Arc<dyn AssignmentRepository>,
        role_repository: Arc<dyn RoleRepository>,
        tenant_repository: Arc<dyn TenantRepository>,
    ) -> Self {
        Self {
            authorization_service,
            assignment_repository,
            role_repository,
            tenant_repository,
        }
    }

    /// Assigns a role tenant-wide.
    pub async fn assign_role(
        &self,
        principal: &Principal,
        input: AssignRoleInput,
    ) -> AppResult<RoleAssignment> {
        let scope = self.authorized_scope(principal).await?;
        self.ensure_member(&scope, input.user_id).await?;
        let role = self.assignable_role(&scope, input.role_id).await?;

        let assignment = NewRoleAssignment::new(
            input.user_id,
            role.role_id,
            scope.user_id(),
            input.expires_at,
            Utc::now(),
        )?;
        let audit = audit_event(&scope, AuditAction::RoleAssigned, "role_assignment")
            .with_new_values(json!({
                "user_id": assignment.user_id,
                "role_id": assignment.role_id,
                "role_name": role.name,
                "expires_at": assignment.expires_at,
            }));

        let created = self
            .assignment_repository
            .create_role_assignment(scope.tenant_id(), assignment, audit)
            .await?;
        self.authorization_service
            .resolver()
            .invalidate(scope.tenant_id(), &[created.user_id])
            .await;

        info!(
            tenant_id = %scope.tenant_id(),
            user_id = %created.user_id,
            role_id = %created.role_id,
            "role assigned"
        );
        Ok(created)
    }

    /// Revokes a tenant-scope assignment.
    pub async fn revoke_assignment(
        &self,
        principal: &Principal,
        assignment_id: AssignmentId,
    ) -> AppResult<RoleAssignment> {
        let scope = self.authorized_scope(principal).await?;

        let audit = audit_event(&scope, AuditAction::RoleAssignmentRevoked, "role_assignment")
            .with_resource_id(assignment_id.to_string());
        let revoked = self
            .assignment_repository
            .revoke_role_assignment(scope.tenant_id(), assignment_id, scope.user_id(), audit)
            .await?;
        self.authorization_service
            .resolver()
            .invalidate(scope.tenant_id(), &[revoked.user_id])
            .await;

        info!(
            tenant_id = %scope.tenant_id(),
            assignment_id = %assignment_id,
            "role assignment revoked"
        );
        Ok(revoked)
    }

    /// Lists tenant-scope assignments.
    pub async fn list_assignments(
        &self,
        principal: &Principal,
        query: AssignmentQuery,
    ) -> AppResult<Vec<RoleAssignment>> {
        let scope = self.authorized_scope(principal).await?;
        self.assignment_repository
            .list_role_assignments(scope.tenant_id(), query)
            .await
    }

    /// Assigns a role within one project, with optional additive overrides.
    pub async fn assign_project_role(
        &self,
        principal: &Principal,
        input: AssignProjectRoleInput,
    ) -> AppResult<ProjectAssignment> {
        let scope = self.authorized_scope(principal).await?;
        self.ensure_member(&scope, input.user_id).await?;
        let role = self.assignable_role(&scope, input.role_id).await?;
        ensure_tenant_may_hold(scope.tenant_id(), &input.permission_overrides)?;

        let assignment = NewProjectAssignment::new(
            input.project_id,
            input.user_id,
            role.role_id,
            input.permission_overrides,
            scope.user_id(),
            input.expires_at,
            Utc::now(),
        )?;
        let audit = audit_event(&scope, AuditAction::ProjectRoleAssigned, "project_assignment")
            .with_new_values(json!({
                "project_id": assignment.project_id,
                "user_id": assignment.user_id,
                "role_id": assignment.role_id,
                "permission_overrides": assignment.permission_overrides,
                "expires_at": assignment.expires_at,
            }));

        let created = self
            .assignment_repository
            .create_project_assignment(scope.tenant_id(), assignment, audit)
            .await?;

        info!(
            tenant_id = %scope.tenant_id(),
            project_id = %created.project_id,
            user_id = %created.user_id,
            "project role assigned"
        );
        Ok(created)
    }

    /// Revokes a project-scope assignment.
    pub async fn revoke_project_assignment(
        &self,
        principal: &Principal,
        assignment_id: ProjectAssignmentId,
    ) -> AppResult<ProjectAssignment> {
        let scope = self.authorized_scope(principal).await?;

        let audit = audit_event(
            &scope,
            AuditAction::ProjectAssignmentRevoked,
            "project_assignment",
        )
        .with_resource_id(assignment_id.to_string());
        let revoked = self
            .assignment_repository
            .revoke_project_assignment(scope.tenant_id(), assignment_id, scope.user_id(), audit)
            .await?;

        info!(
            tenant_id = %scope.tenant_id(),
            assignment_id = %assignment_id,
            "project assignment revoked"
        );
        Ok(revoked)
    }

    /// Lists project-scope assignments.
    pub async fn list_project_assignments(
        &self,
        principal: &Principal,
        query: AssignmentQuery,
    ) -> AppResult<Vec<ProjectAssignment>> {
        let scope = self.authorized_scope(principal).await?;
        self.assignment_repository
            .list_project_assignments(scope.tenant_id(), query)
            .await
    }

    async fn authorized_scope(&self, principal: &Principal) -> AppResult<TenantScope> {
        let scope = self.authorization_service.scope(principal).await?;
        self.authorization_service
            .require_permission(&scope, Permission::RoleManage)
            .await?;
        Ok(scope)
    }

    async fn ensure_member(&self, scope: &TenantScope, user_id: UserId) -> AppResult<()> {
        if self
            .tenant_repository
            .is_member(scope.tenant_id(), user_id)
            .await?
        {
            return Ok(());
        }

        Err(AppError::NotFound(format!(
            "user '{user_id}' is not a member of tenant '{}'",
            scope.tenant_id()
        )))
    }

    async fn assignable_role(&self, scope: &TenantScope, role_id: RoleId) -> AppResult<Role> {
        let role = self
            .role_repository
            .find_role(scope.tenant_id(), role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;

        if !role.is_active {
            return Err(AppError::Validation(format!(
                "role '{role_id}' is inactive and cannot be assigned"
            )));
        }

        Ok(role)
    }
}

fn audit_event(scope: &TenantScope, action: AuditAction, resource_type: &str) -> AuditEvent {
    AuditEvent::new(
        scope.tenant_id(),
        scope.user_id(),
        action,
        resource_type,
        scope.request().clone(),
    )
}
