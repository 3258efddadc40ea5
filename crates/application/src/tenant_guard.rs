use std::sync::Arc;

use corbel_core::{AppError, AppResult, Principal, RequestMetadata, TenantId, UserId};
use tracing::warn;

use crate::access_ports::TenantRepository;

/// Verified tenant context for one request.
///
/// Only [`TenantIsolationGuard::scope`] builds this value, so holding one
/// proves the tenant exists, is active, and has the user as a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantScope {
    tenant_id: TenantId,
    user_id: UserId,
    request: RequestMetadata,
}

impl TenantScope {
    /// Returns the verified tenant.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the acting user.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the request context of the acting user.
    #[must_use]
    pub fn request(&self) -> &RequestMetadata {
        &self.request
    }

    #[cfg(test)]
    pub(crate) fn for_tests(tenant_id: TenantId, user_id: UserId) -> Self {
        Self {
            tenant_id,
            user_id,
            request: RequestMetadata::default(),
        }
    }
}

/// Proof that a platform-tenant principal holds `SystemAdmin`.
///
/// Built only by [`crate::AuthorizationService::platform_bypass`]; required by
/// every port method that reads across tenants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformBypass {
    scope: TenantScope,
}

impl PlatformBypass {
    pub(crate) fn new(scope: TenantScope) -> Self {
        Self { scope }
    }

    /// Returns the platform scope of the acting principal.
    #[must_use]
    pub fn scope(&self) -> &TenantScope {
        &self.scope
    }
}

/// Resolves and verifies the tenant of every request before any scoped read.
#[derive(Clone)]
pub struct TenantIsolationGuard {
    tenant_repository: Arc<dyn TenantRepository>,
}

impl TenantIsolationGuard {
    /// Creates a guard from a tenant repository implementation.
    #[must_use]
    pub fn new(tenant_repository: Arc<dyn TenantRepository>) -> Self {
        Self { tenant_repository }
    }

    /// Verifies the principal's tenant and membership.
    ///
    /// A principal without a tenant is refused before any store access.
    pub async fn scope(&self, principal: &Principal) -> AppResult<TenantScope> {
        let Some(tenant_id) = principal.tenant_id() else {
            warn!(user_id = %principal.user_id(), "request refused without tenant context");
            return Err(AppError::Forbidden(
                "tenant context is required for this operation".to_owned(),
            ));
        };

        let tenant = self
            .tenant_repository
            .find_tenant(tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("tenant '{tenant_id}' does not exist")))?;

        if !tenant.is_active() {
            return Err(AppError::Forbidden(format!(
                "tenant '{tenant_id}' is {}",
                tenant.status.as_str()
            )));
        }

        if !self
            .tenant_repository
            .is_member(tenant_id, principal.user_id())
            .await?
        {
            warn!(
                user_id = %principal.user_id(),
                tenant_id = %tenant_id,
                "request refused for non-member"
            );
            return Err(AppError::Forbidden(format!(
                "user '{}' is not a member of tenant '{tenant_id}'",
                principal.user_id()
            )));
        }

        Ok(TenantScope {
            tenant_id,
            user_id: principal.user_id(),
            request: principal.request().clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use corbel_core::{AppError, Principal, TenantId, UserId};
    use corbel_domain::TenantStatus;

    use super::TenantIsolationGuard;
    use crate::test_fakes::FakeStore;

    #[tokio::test]
    async fn missing_tenant_is_refused() {
        let store = Arc::new(FakeStore::default());
        let guard = TenantIsolationGuard::new(store);

        let result = guard.scope(&Principal::without_tenant(UserId::new(1))).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn unknown_suspended_and_foreign_tenants_are_refused() {
        let store = Arc::new(FakeStore::default());
        store.seed_tenant(TenantId::new(1), TenantStatus::Active).await;
        store.seed_tenant(TenantId::new(2), TenantStatus::Suspended).await;
        store.seed_member(TenantId::new(2), UserId::new(5)).await;
        let guard = TenantIsolationGuard::new(store);

        let unknown = guard
            .scope(&Principal::new(UserId::new(5), TenantId::new(9)))
            .await;
        assert!(matches!(unknown, Err(AppError::NotFound(_))));

        let suspended = guard
            .scope(&Principal::new(UserId::new(5), TenantId::new(2)))
            .await;
        assert!(matches!(suspended, Err(AppError::Forbidden(_))));

        let foreign = guard
            .scope(&Principal::new(UserId::new(5), TenantId::new(1)))
            .await;
        assert!(matches!(foreign, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn members_of_active_tenants_get_a_scope() {
        let store = Arc::new(FakeStore::default());
        store.seed_tenant(TenantId::new(1), TenantStatus::Active).await;
        store.seed_member(TenantId::new(1), UserId::new(5)).await;
        let guard = TenantIsolationGuard::new(store);

        let scope = guard
            .scope(&Principal::new(UserId::new(5), TenantId::new(1)))
            .await;
        assert!(scope.is_ok());
        let scope = scope.unwrap_or_else(|_| unreachable!());
        assert_eq!(scope.tenant_id(), TenantId::new(1));
        assert_eq!(scope.user_id(), UserId::new(5));
    }
}
