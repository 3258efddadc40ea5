use async_trait::async_trait;
use corbel_application::{CreateTenantInput, PlatformBypass, TenantRepository};

use super::*;

#[async_trait]
impl TenantRepository for InMemoryAccessStore {
    async fn find_tenant(&self, tenant_id: TenantId) -> AppResult<Option<Tenant>> {
        Ok(self.state.read().await.tenants.get(&tenant_id).cloned())
    }

    async fn is_member(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<bool> {
        Ok(self
            .state
            .read()
            .await
            .memberships
            .contains(&(tenant_id, user_id)))
    }

    async fn add_member(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        audit: AuditEvent,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.ensure_tenant(tenant_id)?;
        if state.memberships.contains(&(tenant_id, user_id)) {
            return Err(AppError::Conflict(format!(
                "user '{user_id}' is already a member of tenant '{tenant_id}'"
            )));
        }
        state.check_audit(&audit)?;

        state.memberships.insert((tenant_id, user_id));
        state.append_audit(audit);
        Ok(())
    }

    async fn create_tenant(
        &self,
        input: CreateTenantInput,
        audit: AuditEvent,
    ) -> AppResult<Tenant> {
        let mut state = self.state.write().await;
        state.check_audit(&audit)?;

        let tenant = Tenant {
            tenant_id: TenantId::new(state.next_id()),
            name: input.name.into(),
            status: TenantStatus::Active,
            settings: input.settings,
        };
        state.tenants.insert(tenant.tenant_id, tenant.clone());
        state.append_audit(audit.stamp_resource_id(tenant.tenant_id.to_string()));

        Ok(tenant)
    }

    async fn list_tenants(&self, _bypass: &PlatformBypass) -> AppResult<Vec<Tenant>> {
        Ok(self.state.read().await.tenants.values().cloned().collect())
    }

    async fn set_tenant_status(
        &self,
        tenant_id: TenantId,
        status: TenantStatus,
        audit: AuditEvent,
    ) -> AppResult<Tenant> {
        let mut state = self.state.write().await;
        state.check_audit(&audit)?;

        let tenant = state
            .tenants
            .get_mut(&tenant_id)
            .ok_or_else(|| AppError::NotFound(format!("tenant '{tenant_id}' does not exist")))?;
        tenant.status = status;
        let tenant = tenant.clone();
        state.append_audit(audit);

        Ok(tenant)
    }
}
