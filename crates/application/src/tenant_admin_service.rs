use std::sync::Arc;

use corbel_core::{AppError, AppResult, NonEmptyString, Principal, TenantId, UserId};
use corbel_domain::{AuditAction, Permission, Tenant, TenantStatus};
use serde_json::{Value, json};
use tracing::info;

use crate::access_ports::{AuditEvent, CreateTenantInput, TenantRepository};
use crate::authorization_service::AuthorizationService;
use crate::tenant_guard::PlatformBypass;

/// Application service for tenant provisioning and membership.
#[derive(Clone)]
pub struct TenantAdminService {
    authorization_service: AuthorizationService,
    tenant_repository: Arc<dyn TenantRepository>,
}

impl TenantAdminService {
    /// Creates a tenant administration service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        tenant_repository: Arc<dyn TenantRepository>,
    ) -> Self {
        Self {
            authorization_service,
            tenant_repository,
        }
    }

    /// Provisions a new active tenant.
    pub async fn create_tenant(
        &self,
        principal: &Principal,
        name: String,
        settings: Option<Value>,
    ) -> AppResult<Tenant> {
        let bypass = self.provisioning_bypass(principal).await?;
        let settings = settings.unwrap_or_else(|| json!({}));
        if !settings.is_object() {
            return Err(AppError::Validation(
                "tenant settings must be a JSON object".to_owned(),
            ));
        }

        let input = CreateTenantInput {
            name: NonEmptyString::new(name)?,
            settings,
        };
        let audit = platform_event(&bypass, AuditAction::TenantCreated)
            .with_new_values(json!({ "name": input.name.as_str() }));

        let tenant = self.tenant_repository.create_tenant(input, audit).await?;
        info!(tenant_id = %tenant.tenant_id, "tenant created");
        Ok(tenant)
    }

    /// Lists every tenant for a platform principal.
    pub async fn list_tenants(&self, principal: &Principal) -> AppResult<Vec<Tenant>> {
        let bypass = self.authorization_service.platform_bypass(principal).await?;
        self.authorization_service
            .record_bypass_read(&bypass, "tenant", None)
            .await?;
        self.tenant_repository.list_tenants(&bypass).await
    }

    /// Activates or suspends a tenant. The platform tenant cannot be suspended.
    pub async fn set_tenant_status(
        &self,
        principal: &Principal,
        tenant_id: TenantId,
        status: TenantStatus,
    ) -> AppResult<Tenant> {
        let bypass = self.provisioning_bypass(principal).await?;
        if tenant_id.is_platform() && status != TenantStatus::Active {
            return Err(AppError::Validation(
                "the platform tenant cannot be suspended".to_owned(),
            ));
        }

        let existing = self
            .tenant_repository
            .find_tenant(tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("tenant '{tenant_id}' does not exist")))?;
        if existing.status == status {
            return Ok(existing);
        }

        let audit = platform_event(&bypass, AuditAction::TenantStatusChanged)
            .with_resource_id(tenant_id.to_string())
            .with_old_values(json!({ "status": existing.status.as_str() }))
            .with_new_values(json!({ "status": status.as_str() }));
        let tenant = self
            .tenant_repository
            .set_tenant_status(tenant_id, status, audit)
            .await?;

        info!(
            tenant_id = %tenant_id,
            status = status.as_str(),
            "tenant status changed"
        );
        Ok(tenant)
    }

    /// Adds a user to the principal's tenant.
    pub async fn add_member(&self, principal: &Principal, user_id: UserId) -> AppResult<()> {
        let scope = self.authorization_service.scope(principal).await?;
        self.authorization_service
            .require_permission(&scope, Permission::UserManage)
            .await?;

        let audit = AuditEvent::new(
            scope.tenant_id(),
            scope.user_id(),
            AuditAction::TenantMemberAdded,
            "tenant_member",
            scope.request().clone(),
        )
        .with_resource_id(user_id.to_string());
        self.tenant_repository
            .add_member(scope.tenant_id(), user_id, audit)
            .await
    }

    async fn provisioning_bypass(&self, principal: &Principal) -> AppResult<PlatformBypass> {
        let bypass = self.authorization_service.platform_bypass(principal).await?;
        self.authorization_service
            .require_permission(bypass.scope(), Permission::TenantProvision)
            .await?;
        Ok(bypass)
    }
}

fn platform_event(bypass: &PlatformBypass, action: AuditAction) -> AuditEvent {
    let scope = bypass.scope();
    AuditEvent::new(
        scope.tenant_id(),
        scope.user_id(),
        action,
        "tenant",
        scope.request().clone(),
    )
}
