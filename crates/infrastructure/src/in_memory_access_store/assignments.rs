use async_trait::async_trait;
use corbel_application::{
    ActiveProjectGrant, ActiveRoleGrant, AssignmentQuery, AssignmentRepository,
};
use corbel_domain::{AssignmentState, NewProjectAssignment, NewRoleAssignment, ProjectId};

use super::*;

impl AccessState {
    fn ensure_assignable(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        role_id: RoleId,
    ) -> AppResult<()> {
        self.ensure_tenant(tenant_id)?;
        self.ensure_member(tenant_id, user_id)?;
        if self.tenant_role(tenant_id, role_id).is_none() {
            return Err(AppError::NotFound(format!("role '{role_id}' does not exist")));
        }

        Ok(())
    }

    fn active_role(&self, tenant_id: TenantId, role_id: RoleId) -> Option<&Role> {
        self.tenant_role(tenant_id, role_id)
            .filter(|role| role.is_active)
    }
}

fn duplicate_assignment() -> AppError {
    AppError::Conflict("an active assignment of this role already exists".to_owned())
}

#[async_trait]
impl AssignmentRepository for InMemoryAccessStore {
    async fn create_role_assignment(
        &self,
        tenant_id: TenantId,
        assignment: NewRoleAssignment,
        audit: AuditEvent,
    ) -> AppResult<RoleAssignment> {
        let mut state = self.state.write().await;
        state.ensure_assignable(tenant_id, assignment.user_id, assignment.role_id)?;
        let now = Utc::now();
        if state.assignments.values().any(|existing| {
            existing.tenant_id == tenant_id
                && existing.user_id == assignment.user_id
                && existing.role_id == assignment.role_id
                && existing.state_at(now) == AssignmentState::Active
        }) {
            return Err(duplicate_assignment());
        }
        state.check_audit(&audit)?;

        for existing in state.assignments.values_mut().filter(|existing| {
            existing.tenant_id == tenant_id
                && existing.user_id == assignment.user_id
                && existing.role_id == assignment.role_id
                && existing.state_at(now) == AssignmentState::Expired
        }) {
            existing.is_active = false;
            existing.revoked_at = existing.expires_at;
        }

        let created = RoleAssignment {
            assignment_id: AssignmentId::new(state.next_id()),
            tenant_id,
            user_id: assignment.user_id,
            role_id: assignment.role_id,
            granted_by: assignment.granted_by,
            granted_at: now,
            expires_at: assignment.expires_at,
            is_active: true,
            revoked_by: None,
            revoked_at: None,
        };
        state
            .assignments
            .insert(created.assignment_id, created.clone());
        state.append_audit(audit.stamp_resource_id(created.assignment_id.to_string()));

        Ok(created)
    }

    async fn revoke_role_assignment(
        &self,
        tenant_id: TenantId,
        assignment_id: AssignmentId,
        revoked_by: UserId,
        audit: AuditEvent,
    ) -> AppResult<RoleAssignment> {
        let mut state = self.state.write().await;
        state.check_audit(&audit)?;

        let assignment = state
            .assignments
            .get_mut(&assignment_id)
            .filter(|assignment| assignment.tenant_id == tenant_id && assignment.is_active)
            .ok_or_else(|| {
                AppError::NotFound(format!("active assignment '{assignment_id}' does not exist"))
            })?;
        assignment.is_active = false;
        assignment.revoked_by = Some(revoked_by);
        assignment.revoked_at = Some(Utc::now());
        let assignment = assignment.clone();
        state.append_audit(audit);

        Ok(assignment)
    }

    async fn list_role_assignments(
        &self,
        tenant_id: TenantId,
        query: AssignmentQuery,
    ) -> AppResult<Vec<RoleAssignment>> {
        let now = Utc::now();
        let mut assignments = self
            .state
            .read()
            .await
            .assignments
            .values()
            .filter(|assignment| assignment.tenant_id == tenant_id)
            .filter(|assignment| query.user_id.is_none_or(|user_id| assignment.user_id == user_id))
            .filter(|assignment| {
                query.include_inactive || assignment.state_at(now) == AssignmentState::Active
            })
            .cloned()
            .collect::<Vec<_>>();
        assignments.reverse();

        Ok(assignments)
    }

    async fn create_project_assignment(
        &self,
        tenant_id: TenantId,
        assignment: NewProjectAssignment,
        audit: AuditEvent,
    ) -> AppResult<ProjectAssignment> {
        let mut state = self.state.write().await;
        state.ensure_assignable(tenant_id, assignment.user_id, assignment.role_id)?;
        let now = Utc::now();
        let same_grant = |existing: &ProjectAssignment| {
            existing.tenant_id == tenant_id
                && existing.project_id == assignment.project_id
                && existing.user_id == assignment.user_id
                && existing.role_id == assignment.role_id
        };
        if state.project_assignments.values().any(|existing| {
            same_grant(existing) && existing.state_at(now) == AssignmentState::Active
        }) {
            return Err(duplicate_assignment());
        }
        state.check_audit(&audit)?;

        for existing in state.project_assignments.values_mut().filter(|existing| {
            same_grant(existing) && existing.state_at(now) == AssignmentState::Expired
        }) {
            existing.is_active = false;
            existing.revoked_at = existing.expires_at;
        }

        let created = ProjectAssignment {
            assignment_id: ProjectAssignmentId::new(state.next_id()),
            tenant_id,
            project_id: assignment.project_id,
            user_id: assignment.user_id,
            role_id: assignment.role_id,
            permission_overrides: assignment.permission_overrides,
            granted_by: assignment.granted_by,
            granted_at: now,
            expires_at: assignment.expires_at,
            is_active: true,
            revoked_by: None,
            revoked_at: None,
        };
        state
            .project_assignments
            .insert(created.assignment_id, created.clone());
        state.append_audit(audit.stamp_resource_id(created.assignment_id.to_string()));

        Ok(created)
    }

    async fn revoke_project_assignment(
        &self,
        tenant_id: TenantId,
        assignment_id: ProjectAssignmentId,
        revoked_by: UserId,
        audit: AuditEvent,
    ) -> AppResult<ProjectAssignment> {
        let mut state = self.state.write().await;
        state.check_audit(&audit)?;

        let assignment = state
            .project_assignments
            .get_mut(&assignment_id)
            .filter(|assignment| assignment.tenant_id == tenant_id && assignment.is_active)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "active project assignment '{assignment_id}' does not exist"
                ))
            })?;
        assignment.is_active = false;
        assignment.revoked_by = Some(revoked_by);
        assignment.revoked_at = Some(Utc::now());
        let assignment = assignment.clone();
        state.append_audit(audit);

        Ok(assignment)
    }

    async fn list_project_assignments(
        &self,
        tenant_id: TenantId,
        query: AssignmentQuery,
    ) -> AppResult<Vec<ProjectAssignment>> {
        let now = Utc::now();
        let mut assignments = self
            .state
            .read()
            .await
            .project_assignments
            .values()
            .filter(|assignment| assignment.tenant_id == tenant_id)
            .filter(|assignment| query.user_id.is_none_or(|user_id| assignment.user_id == user_id))
            .filter(|assignment| {
                query
                    .project_id
                    .is_none_or(|project_id| assignment.project_id == project_id)
            })
            .filter(|assignment| {
                query.include_inactive || assignment.state_at(now) == AssignmentState::Active
            })
            .cloned()
            .collect::<Vec<_>>();
        assignments.reverse();

        Ok(assignments)
    }

    async fn list_active_role_grants(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Vec<ActiveRoleGrant>> {
        let now = Utc::now();
        let state = self.state.read().await;

        Ok(state
            .assignments
            .values()
            .filter(|assignment| {
                assignment.tenant_id == tenant_id
                    && assignment.user_id == user_id
                    && assignment.state_at(now) == AssignmentState::Active
            })
            .filter_map(|assignment| state.active_role(tenant_id, assignment.role_id))
            .map(|role| ActiveRoleGrant {
                role_id: role.role_id,
                template_permissions: state.template_permissions(role.template_id),
                custom_permissions: role.custom_permissions.clone(),
            })
            .collect())
    }

    async fn list_active_project_grants(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        project_id: ProjectId,
    ) -> AppResult<Vec<ActiveProjectGrant>> {
        let now = Utc::now();
        let state = self.state.read().await;

        Ok(state
            .project_assignments
            .values()
            .filter(|assignment| {
                assignment.tenant_id == tenant_id
                    && assignment.user_id == user_id
                    && assignment.project_id == project_id
                    && assignment.state_at(now) == AssignmentState::Active
            })
            .filter_map(|assignment| {
                state
                    .active_role(tenant_id, assignment.role_id)
                    .map(|role| ActiveProjectGrant {
                        assignment_id: assignment.assignment_id,
                        role_id: role.role_id,
                        template_permissions: state.template_permissions(role.template_id),
                        custom_permissions: role.custom_permissions.clone(),
                        permission_overrides: assignment.permission_overrides.clone(),
                    })
            })
            .collect())
    }

    async fn list_role_holders(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
    ) -> AppResult<Vec<UserId>> {
        let state = self.state.read().await;
        let tenant_holders = state
            .assignments
            .values()
            .filter(|assignment| {
                assignment.tenant_id == tenant_id
                    && assignment.role_id == role_id
                    && assignment.is_active
            })
            .map(|assignment| assignment.user_id);
        let project_holders = state
            .project_assignments
            .values()
            .filter(|assignment| {
                assignment.tenant_id == tenant_id
                    && assignment.role_id == role_id
                    && assignment.is_active
            })
            .map(|assignment| assignment.user_id);

        Ok(tenant_holders
            .chain(project_holders)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect())
    }
}
