use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use corbel_core::{AppResult, TenantId, UserId};
use corbel_domain::{Permission, RoleId};
use serde::{Deserialize, Serialize};

/// Tenant-wide permission set resolved for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePermissions {
    /// Tenant the set applies to.
    pub tenant_id: TenantId,
    /// User the set applies to.
    pub user_id: UserId,
    /// Union of every active assignment's contribution.
    pub permissions: BTreeSet<Permission>,
    /// Roles that contributed.
    pub role_ids: Vec<RoleId>,
    /// Computation timestamp.
    pub computed_at: DateTime<Utc>,
    /// Time after which the entry must be recomputed.
    pub expires_at: DateTime<Utc>,
}

impl EffectivePermissions {
    /// Returns whether the entry may still be served at `now`.
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    /// Evaluates a permission check against this set.
    ///
    /// An empty request is never granted.
    #[must_use]
    pub fn grants(&self, requested: &[Permission], require_all: bool) -> bool {
        grants(&self.permissions, requested, require_all)
    }
}

pub(crate) fn grants(
    held: &BTreeSet<Permission>,
    requested: &[Permission],
    require_all: bool,
) -> bool {
    if requested.is_empty() {
        return false;
    }

    if require_all {
        requested.iter().all(|permission| held.contains(permission))
    } else {
        requested.iter().any(|permission| held.contains(permission))
    }
}

/// Cache port for resolved tenant-wide permission sets.
#[async_trait]
pub trait EffectivePermissionCache: Send + Sync {
    /// Returns the cached entry if one exists, fresh or not.
    async fn get(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Option<EffectivePermissions>>;

    /// Stores or replaces an entry.
    async fn put(&self, entry: EffectivePermissions) -> AppResult<()>;

    /// Drops entries for the given users in tenant scope.
    async fn invalidate(&self, tenant_id: TenantId, user_ids: &[UserId]) -> AppResult<()>;
}
