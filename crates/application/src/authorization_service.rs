use std::collections::BTreeSet;
use std::sync::Arc;

use corbel_core::{AppError, AppResult, Principal, TenantId, UserId};
use corbel_domain::{AuditAction, Permission, ProjectId};
use serde_json::json;
use tracing::{info, warn};

use crate::access_ports::{
    AuditEvent, AuditRepository, EffectivePermissions, PermissionCatalogRepository, grants,
};
use crate::permission_resolver::EffectivePermissionResolver;
use crate::tenant_guard::{PlatformBypass, TenantIsolationGuard, TenantScope};

/// Application service for tenant-scoped authorization checks.
#[derive(Clone)]
pub struct AuthorizationService {
    guard: TenantIsolationGuard,
    resolver: EffectivePermissionResolver,
    catalog_repository: Arc<dyn PermissionCatalogRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl AuthorizationService {
    /// Creates a new authorization service.
    #[must_use]
    pub fn new(
        guard: TenantIsolationGuard,
        resolver: EffectivePermissionResolver,
        catalog_repository: Arc<dyn PermissionCatalogRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            guard,
            resolver,
            catalog_repository,
            audit_repository,
        }
    }

    /// Returns the resolver used for checks.
    #[must_use]
    pub fn resolver(&self) -> &EffectivePermissionResolver {
        &self.resolver
    }

    /// Verifies the principal's tenant context.
    pub async fn scope(&self, principal: &Principal) -> AppResult<TenantScope> {
        self.guard.scope(principal).await
    }

    /// Returns whether the principal holds the requested permissions tenant-wide.
    ///
    /// Lacking permissions and unavailable stores both yield `false`.
    pub async fn check_permission(
        &self,
        principal: &Principal,
        permissions: &[Permission],
        require_all: bool,
    ) -> AppResult<bool> {
        let outcome = match self.guard.scope(principal).await {
            Ok(scope) => self.has_permission(&scope, permissions, require_all).await,
            Err(error) => Err(error),
        };

        deny_when_unavailable(outcome)
    }

    /// Returns whether the principal holds the requested permissions in a project.
    pub async fn check_project_permission(
        &self,
        principal: &Principal,
        project_id: ProjectId,
        permissions: &[Permission],
        require_all: bool,
    ) -> AppResult<bool> {
        deny_when_unavailable(
            self.project_check(principal, project_id, permissions, require_all)
                .await,
        )
    }

    /// Returns the principal's tenant-wide effective permissions.
    pub async fn effective_permissions(
        &self,
        principal: &Principal,
    ) -> AppResult<EffectivePermissions> {
        let scope = self.guard.scope(principal).await?;
        self.resolver
            .resolve(scope.tenant_id(), scope.user_id())
            .await
    }

    /// Ensures the scoped user holds a permission tenant-wide.
    pub async fn require_permission(
        &self,
        scope: &TenantScope,
        permission: Permission,
    ) -> AppResult<()> {
        if self.has_permission(scope, &[permission], true).await? {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "user '{}' is missing permission '{}' in tenant '{}'",
            scope.user_id(),
            permission.key(),
            scope.tenant_id()
        )))
    }

    /// Evaluates a tenant-wide check for an already verified scope.
    ///
    /// Store faults propagate; denials of elevated permissions are audited.
    pub async fn has_permission(
        &self,
        scope: &TenantScope,
        permissions: &[Permission],
        require_all: bool,
    ) -> AppResult<bool> {
        let effective = self
            .resolver
            .resolve(scope.tenant_id(), scope.user_id())
            .await?;
        Ok(self
            .decide(scope, &effective.permissions, permissions, require_all)
            .await)
    }

    /// Verifies a platform principal for cross-tenant reads.
    pub async fn platform_bypass(&self, principal: &Principal) -> AppResult<PlatformBypass> {
        let scope = self.guard.scope(principal).await?;
        if !scope.tenant_id().is_platform() {
            warn!(
                user_id = %scope.user_id(),
                tenant_id = %scope.tenant_id(),
                "platform bypass refused outside the platform tenant"
            );
            return Err(AppError::Forbidden(
                "platform bypass requires the platform tenant".to_owned(),
            ));
        }

        self.require_permission(&scope, Permission::SystemAdmin)
            .await?;
        Ok(PlatformBypass::new(scope))
    }

    /// Records a cross-tenant read before its rows are returned.
    ///
    /// A failed write aborts the read.
    pub async fn record_bypass_read(
        &self,
        bypass: &PlatformBypass,
        resource_type: &str,
        target_tenant: Option<TenantId>,
    ) -> AppResult<()> {
        let scope = bypass.scope();
        let event = AuditEvent::new(
            scope.tenant_id(),
            scope.user_id(),
            AuditAction::PlatformBypassRead,
            resource_type,
            scope.request().clone(),
        )
        .with_new_values(json!({
            "target_tenant_id": target_tenant.map(|tenant_id| tenant_id.as_i64()),
        }));
        let event = match target_tenant {
            Some(tenant_id) => event.with_resource_id(tenant_id.to_string()),
            None => event,
        };

        self.audit_repository.append_event(event).await?;
        info!(
            user_id = %scope.user_id(),
            resource_type,
            "platform bypass read"
        );
        Ok(())
    }

    /// Returns another tenant's user permissions for a platform principal.
    pub async fn platform_effective_permissions(
        &self,
        principal: &Principal,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<EffectivePermissions> {
        let bypass = self.platform_bypass(principal).await?;
        self.record_bypass_read(&bypass, "effective_permissions", Some(tenant_id))
            .await?;
        self.resolver.resolve(tenant_id, user_id).await
    }

    async fn project_check(
        &self,
        principal: &Principal,
        project_id: ProjectId,
        permissions: &[Permission],
        require_all: bool,
    ) -> AppResult<bool> {
        let scope = self.guard.scope(principal).await?;
        let held = self
            .resolver
            .project_permissions(scope.tenant_id(), scope.user_id(), project_id)
            .await?;
        Ok(self.decide(&scope, &held, permissions, require_all).await)
    }

    async fn decide(
        &self,
        scope: &TenantScope,
        held: &BTreeSet<Permission>,
        requested: &[Permission],
        require_all: bool,
    ) -> bool {
        if grants(held, requested, require_all) {
            return true;
        }

        let missing = requested
            .iter()
            .copied()
            .filter(|permission| !held.contains(permission))
            .collect::<BTreeSet<_>>();
        self.audit_elevated_denial(scope, &missing).await;
        false
    }

    async fn audit_elevated_denial(&self, scope: &TenantScope, missing: &BTreeSet<Permission>) {
        let mut elevated = Vec::new();
        for permission in missing {
            let descriptor = self.catalog_repository.find_permission(*permission).await;
            let requires_elevation = match descriptor {
                Ok(Some(descriptor)) => descriptor.requires_elevation,
                Ok(None) => permission.default_descriptor().requires_elevation,
                Err(error) => {
                    warn!(
                        permission = permission.id(),
                        error = %error,
                        "catalog lookup failed during denial audit"
                    );
                    permission.default_descriptor().requires_elevation
                }
            };
            if requires_elevation {
                elevated.push(*permission);
            }
        }

        if elevated.is_empty() {
            return;
        }

        let event = AuditEvent::new(
            scope.tenant_id(),
            scope.user_id(),
            AuditAction::ElevatedPermissionDenied,
            "permission",
            scope.request().clone(),
        )
        .with_resource_id(
            elevated
                .iter()
                .map(|permission| permission.id().to_string())
                .collect::<Vec<_>>()
                .join(","),
        )
        .with_new_values(json!({
            "permissions": elevated.iter().map(Permission::key).collect::<Vec<_>>(),
        }));

        if let Err(error) = self.audit_repository.append_event(event).await {
            warn!(
                user_id = %scope.user_id(),
                tenant_id = %scope.tenant_id(),
                error = %error,
                "failed to audit elevated permission denial"
            );
        }
    }
}

fn deny_when_unavailable(outcome: AppResult<bool>) -> AppResult<bool> {
    match outcome {
        Err(AppError::Unavailable(message)) => {
            warn!(reason = %message, "permission check denied while store is unavailable");
            Ok(false)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests;
