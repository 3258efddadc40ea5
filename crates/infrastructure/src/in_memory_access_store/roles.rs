use async_trait::async_trait;
use corbel_application::RoleRepository;
use corbel_domain::{NewRole, RoleUpdate};

use super::*;

impl AccessState {
    fn ensure_unique_role_name(
        &self,
        tenant_id: TenantId,
        name: &str,
        except: Option<RoleId>,
    ) -> AppResult<()> {
        let taken = self.roles.values().any(|role| {
            role.tenant_id == tenant_id && role.name == name && Some(role.role_id) != except
        });
        if taken {
            return Err(AppError::Conflict(format!("role '{name}' already exists")));
        }

        Ok(())
    }
}

#[async_trait]
impl RoleRepository for InMemoryAccessStore {
    async fn create_role(
        &self,
        tenant_id: TenantId,
        role: NewRole,
        audit: AuditEvent,
    ) -> AppResult<Role> {
        let mut state = self.state.write().await;
        state.ensure_tenant(tenant_id)?;
        state.ensure_unique_role_name(tenant_id, role.name.as_str(), None)?;
        if let Some(template_id) = role.template_id
            && !state.templates.contains_key(&template_id)
        {
            return Err(AppError::NotFound(format!(
                "role template '{template_id}' does not exist"
            )));
        }
        state.check_audit(&audit)?;

        let now = Utc::now();
        let created = Role {
            role_id: RoleId::new(state.next_id()),
            tenant_id,
            name: role.name.into(),
            description: role.description,
            template_id: role.template_id,
            custom_permissions: role.custom_permissions,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.roles.insert(created.role_id, created.clone());
        state.append_audit(audit.stamp_resource_id(created.role_id.to_string()));

        Ok(created)
    }

    async fn find_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self
            .state
            .read()
            .await
            .tenant_role(tenant_id, role_id)
            .cloned())
    }

    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<Role>> {
        let state = self.state.read().await;
        let mut roles = state
            .roles
            .values()
            .filter(|role| role.tenant_id == tenant_id)
            .cloned()
            .collect::<Vec<_>>();
        roles.sort_by(|left, right| left.name.cmp(&right.name));

        Ok(roles)
    }

    async fn update_role(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
        update: RoleUpdate,
        audit: AuditEvent,
    ) -> AppResult<Role> {
        let mut state = self.state.write().await;
        if state.tenant_role(tenant_id, role_id).is_none() {
            return Err(AppError::NotFound(format!("role '{role_id}' does not exist")));
        }
        if let Some(name) = &update.name {
            state.ensure_unique_role_name(tenant_id, name.as_str(), Some(role_id))?;
        }
        state.check_audit(&audit)?;

        let role = state
            .roles
            .get_mut(&role_id)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;
        role.apply_update(&update, Utc::now());
        let role = role.clone();
        state.append_audit(audit);

        Ok(role)
    }

    async fn deactivate_role(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
        audit: AuditEvent,
    ) -> AppResult<Role> {
        let mut state = self.state.write().await;
        if state.tenant_role(tenant_id, role_id).is_none() {
            return Err(AppError::NotFound(format!("role '{role_id}' does not exist")));
        }
        state.check_audit(&audit)?;

        let role = state
            .roles
            .get_mut(&role_id)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;
        role.is_active = false;
        role.updated_at = Utc::now();
        let role = role.clone();
        state.append_audit(audit);

        Ok(role)
    }
}
