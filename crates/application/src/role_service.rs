use std::collections::BTreeSet;
use std::sync::Arc;

use corbel_core::{AppError, AppResult, NonEmptyString, Principal};
use corbel_domain::{
    AuditAction, NewRole, Permission, Role, RoleId, RoleUpdate, TemplateId,
    contributed_permissions, ensure_tenant_may_hold,
};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::access_ports::{
    AssignmentRepository, AuditEvent, PermissionCatalogRepository, RoleRepository,
};
use crate::authorization_service::AuthorizationService;
use crate::tenant_guard::TenantScope;

/// Input payload for creating tenant roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Unique role name in tenant scope.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Template to instantiate.
    pub template_id: Option<TemplateId>,
    /// Permissions added on top of the template.
    pub custom_permissions: BTreeSet<Permission>,
}

/// Input payload for updating tenant roles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateRoleInput {
    /// New role name.
    pub name: Option<String>,
    /// New description; `Some(None)` clears it.
    pub description: Option<Option<String>>,
    /// Replacement custom permission set.
    pub custom_permissions: Option<BTreeSet<Permission>>,
}

/// Application service for tenant role administration.
#[derive(Clone)]
pub struct RoleService {
    authorization_service: AuthorizationService,
    role_repository: Arc<dyn RoleRepository>,
    catalog_repository: Arc<dyn PermissionCatalogRepository>,
    assignment_repository: Arc<dyn AssignmentRepository>,
}

impl RoleService {
    /// Creates a role service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        role_repository: Arc<dyn RoleRepository>,
        catalog_repository: Arc<dyn PermissionCatalogRepository>,
        assignment_repository: Arc<dyn AssignmentRepository>,
    ) -> Self {
        Self {
            authorization_service,
            role_repository,
            catalog_repository,
            assignment_repository,
        }
    }

    /// Creates a role in the principal's tenant.
    pub async fn create_role(
        &self,
        principal: &Principal,
        input: CreateRoleInput,
    ) -> AppResult<Role> {
        let scope = self.authorized_scope(principal).await?;
        let name = NonEmptyString::new(input.name)?;

        let template_permissions = self.template_permissions(input.template_id).await?;
        ensure_tenant_may_hold(
            scope.tenant_id(),
            &contributed_permissions(&template_permissions, &input.custom_permissions),
        )?;

        let role = NewRole {
            name,
            description: normalize_description(input.description),
            template_id: input.template_id,
            custom_permissions: input.custom_permissions,
        };
        let audit = audit_event(&scope, AuditAction::RoleCreated).with_new_values(json!({
            "name": role.name.as_str(),
            "description": role.description,
            "template_id": role.template_id,
            "custom_permissions": role.custom_permissions,
        }));

        let created = self
            .role_repository
            .create_role(scope.tenant_id(), role, audit)
            .await?;
        info!(
            tenant_id = %scope.tenant_id(),
            role_id = %created.role_id,
            "role created"
        );
        Ok(created)
    }

    /// Applies an allow-listed update to an active role.
    pub async fn update_role(
        &self,
        principal: &Principal,
        role_id: RoleId,
        input: UpdateRoleInput,
    ) -> AppResult<Role> {
        let scope = self.authorized_scope(principal).await?;
        let existing = self.active_role(&scope, role_id).await?;

        let update = RoleUpdate {
            name: input.name.map(NonEmptyString::new).transpose()?,
            description: input.description.map(normalize_description),
            custom_permissions: input.custom_permissions,
        };
        if update.is_empty() {
            return Err(AppError::Validation(
                "role update must change at least one field".to_owned(),
            ));
        }

        if let Some(custom_permissions) = &update.custom_permissions {
            let template_permissions = self.template_permissions(existing.template_id).await?;
            ensure_tenant_may_hold(
                scope.tenant_id(),
                &contributed_permissions(&template_permissions, custom_permissions),
            )?;
        }

        let mut preview = existing.clone();
        preview.apply_update(&update, existing.updated_at);
        let audit = audit_event(&scope, AuditAction::RoleUpdated)
            .with_resource_id(role_id.to_string())
            .with_old_values(snapshot(&existing))
            .with_new_values(snapshot(&preview));

        let updated = self
            .role_repository
            .update_role(scope.tenant_id(), role_id, update, audit)
            .await?;
        self.invalidate_holders(&scope, role_id).await;
        Ok(updated)
    }

    /// Soft-deactivates a role; its assignments stop contributing.
    pub async fn deactivate_role(
        &self,
        principal: &Principal,
        role_id: RoleId,
    ) -> AppResult<Role> {
        let scope = self.authorized_scope(principal).await?;
        let existing = self.active_role(&scope, role_id).await?;

        let audit = audit_event(&scope, AuditAction::RoleDeactivated)
            .with_resource_id(role_id.to_string())
            .with_old_values(snapshot(&existing));
        let deactivated = self
            .role_repository
            .deactivate_role(scope.tenant_id(), role_id, audit)
            .await?;
        self.invalidate_holders(&scope, role_id).await;

        info!(
            tenant_id = %scope.tenant_id(),
            role_id = %role_id,
            "role deactivated"
        );
        Ok(deactivated)
    }

    /// Lists roles in the principal's tenant.
    pub async fn list_roles(&self, principal: &Principal) -> AppResult<Vec<Role>> {
        let scope = self.authorized_scope(principal).await?;
        self.role_repository.list_roles(scope.tenant_id()).await
    }

    /// Returns one role in the principal's tenant.
    pub async fn role(&self, principal: &Principal, role_id: RoleId) -> AppResult<Role> {
        let scope = self.authorized_scope(principal).await?;
        self.role_repository
            .find_role(scope.tenant_id(), role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))
    }

    async fn authorized_scope(&self, principal: &Principal) -> AppResult<TenantScope> {
        let scope = self.authorization_service.scope(principal).await?;
        self.authorization_service
            .require_permission(&scope, Permission::RoleManage)
            .await?;
        Ok(scope)
    }

    async fn active_role(&self, scope: &TenantScope, role_id: RoleId) -> AppResult<Role> {
        let role = self
            .role_repository
            .find_role(scope.tenant_id(), role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;

        if !role.is_active {
            return Err(AppError::Conflict(format!("role '{role_id}' is inactive")));
        }

        Ok(role)
    }

    async fn template_permissions(
        &self,
        template_id: Option<TemplateId>,
    ) -> AppResult<BTreeSet<Permission>> {
        let Some(template_id) = template_id else {
            return Ok(BTreeSet::new());
        };

        self.catalog_repository
            .find_role_template(template_id)
            .await?
            .map(|template| template.permissions)
            .ok_or_else(|| {
                AppError::NotFound(format!("role template '{template_id}' does not exist"))
            })
    }

    /// Runs after commit; a failed holder lookup leaves staleness to the TTL.
    async fn invalidate_holders(&self, scope: &TenantScope, role_id: RoleId) {
        let holders = match self
            .assignment_repository
            .list_role_holders(scope.tenant_id(), role_id)
            .await
        {
            Ok(holders) => holders,
            Err(error) => {
                warn!(
                    tenant_id = %scope.tenant_id(),
                    role_id = %role_id,
                    error = %error,
                    "failed to list role holders for cache invalidation"
                );
                return;
            }
        };
        self.authorization_service
            .resolver()
            .invalidate(scope.tenant_id(), &holders)
            .await;
    }
}

fn audit_event(scope: &TenantScope, action: AuditAction) -> AuditEvent {
    AuditEvent::new(
        scope.tenant_id(),
        scope.user_id(),
        action,
        "role",
        scope.request().clone(),
    )
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

pub(crate) fn snapshot<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
