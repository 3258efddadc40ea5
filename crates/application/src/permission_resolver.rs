use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use corbel_core::{AppResult, TenantId, UserId};
use corbel_domain::{Permission, ProjectId, contributed_permissions};
use tracing::{debug, warn};

use crate::access_ports::{AssignmentRepository, EffectivePermissionCache, EffectivePermissions};

/// Resolver cache behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Lifetime of a cached tenant-wide set.
    pub ttl_seconds: u32,
    /// Drop affected cache entries as soon as a mutation commits.
    pub eager_invalidation: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 3600,
            eager_invalidation: true,
        }
    }
}

/// Computes and caches the effective permissions of a user in a tenant.
#[derive(Clone)]
pub struct EffectivePermissionResolver {
    assignment_repository: Arc<dyn AssignmentRepository>,
    cache: Arc<dyn EffectivePermissionCache>,
    config: ResolverConfig,
}

impl EffectivePermissionResolver {
    /// Creates a resolver from an assignment store and a cache.
    #[must_use]
    pub fn new(
        assignment_repository: Arc<dyn AssignmentRepository>,
        cache: Arc<dyn EffectivePermissionCache>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            assignment_repository,
            cache,
            config,
        }
    }

    /// Returns the resolver configuration.
    #[must_use]
    pub fn config(&self) -> ResolverConfig {
        self.config
    }

    /// Returns the tenant-wide set, served from cache while fresh.
    ///
    /// A failing cache read propagates so callers deny instead of
    /// recomputing against a store that may be in the same degraded state.
    pub async fn resolve(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<EffectivePermissions> {
        if let Some(entry) = self.cache.get(tenant_id, user_id).await?
            && entry.tenant_id == tenant_id
            && entry.user_id == user_id
            && entry.is_fresh_at(Utc::now())
        {
            return Ok(entry);
        }

        self.recompute(tenant_id, user_id).await
    }

    /// Rebuilds the tenant-wide set from the store and refreshes the cache.
    pub async fn recompute(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<EffectivePermissions> {
        let grants = self
            .assignment_repository
            .list_active_role_grants(tenant_id, user_id)
            .await?;

        let mut permissions = BTreeSet::new();
        let mut role_ids = Vec::with_capacity(grants.len());
        for grant in grants {
            permissions.extend(contributed_permissions(
                &grant.template_permissions,
                &grant.custom_permissions,
            ));
            if !role_ids.contains(&grant.role_id) {
                role_ids.push(grant.role_id);
            }
        }

        confine_to_tenant(tenant_id, &mut permissions);

        let computed_at = Utc::now();
        let entry = EffectivePermissions {
            tenant_id,
            user_id,
            permissions,
            role_ids,
            computed_at,
            expires_at: computed_at + Duration::seconds(i64::from(self.config.ttl_seconds)),
        };

        if let Err(error) = self.cache.put(entry.clone()).await {
            warn!(
                tenant_id = %tenant_id,
                user_id = %user_id,
                error = %error,
                "failed to store effective permissions"
            );
        }

        debug!(
            tenant_id = %tenant_id,
            user_id = %user_id,
            permission_count = entry.permissions.len(),
            "recomputed effective permissions"
        );
        Ok(entry)
    }

    /// Returns whether the tenant-wide set satisfies the request.
    pub async fn has_permission(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        permissions: &[Permission],
        require_all: bool,
    ) -> AppResult<bool> {
        Ok(self
            .resolve(tenant_id, user_id)
            .await?
            .grants(permissions, require_all))
    }

    /// Returns the tenant-wide set widened by active grants on one project.
    ///
    /// Project contributions are computed on demand and never cached, so
    /// they cannot leak into the tenant-wide entry.
    pub async fn project_permissions(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        project_id: ProjectId,
    ) -> AppResult<BTreeSet<Permission>> {
        let mut permissions = self.resolve(tenant_id, user_id).await?.permissions;

        let grants = self
            .assignment_repository
            .list_active_project_grants(tenant_id, user_id, project_id)
            .await?;
        for grant in grants {
            permissions.extend(contributed_permissions(
                &grant.template_permissions,
                &grant.custom_permissions,
            ));
            permissions.extend(grant.permission_overrides);
        }
        confine_to_tenant(tenant_id, &mut permissions);

        Ok(permissions)
    }

    /// Drops cached sets after a committed mutation when eager invalidation is on.
    ///
    /// Failures are logged; the entries still expire by TTL.
    pub async fn invalidate(&self, tenant_id: TenantId, user_ids: &[UserId]) {
        if !self.config.eager_invalidation || user_ids.is_empty() {
            return;
        }

        if let Err(error) = self.cache.invalidate(tenant_id, user_ids).await {
            warn!(
                tenant_id = %tenant_id,
                user_count = user_ids.len(),
                error = %error,
                "failed to invalidate effective permissions"
            );
        }
    }
}

/// Platform permissions only ever resolve inside the platform tenant.
fn confine_to_tenant(tenant_id: TenantId, permissions: &mut BTreeSet<Permission>) {
    if tenant_id.is_platform() {
        return;
    }

    let before = permissions.len();
    permissions.retain(|permission| !permission.is_platform());
    if permissions.len() != before {
        warn!(
            tenant_id = %tenant_id,
            dropped = before - permissions.len(),
            "dropped platform permissions outside the platform tenant"
        );
    }
}
