use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use corbel_application::{EffectivePermissionCache, EffectivePermissions};
use corbel_core::{AppResult, TenantId, UserId};
use tokio::sync::RwLock;

/// In-memory cache adapter for effective permission sets.
///
/// Suited to single-process deployments and tests; entries are dropped once
/// read past their expiry.
#[derive(Default)]
pub struct InMemoryEffectivePermissionCache {
    entries: RwLock<HashMap<(TenantId, UserId), EffectivePermissions>>,
}

impl InMemoryEffectivePermissionCache {
    /// Creates an empty in-memory permission cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EffectivePermissionCache for InMemoryEffectivePermissionCache {
    async fn get(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Option<EffectivePermissions>> {
        let key = (tenant_id, user_id);
        {
            let entries = self.entries.read().await;
            match entries.get(&key) {
                Some(entry) if entry.is_fresh_at(Utc::now()) => return Ok(Some(entry.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        let mut entries = self.entries.write().await;
        if entries
            .get(&key)
            .is_some_and(|entry| !entry.is_fresh_at(Utc::now()))
        {
            entries.remove(&key);
        }

        Ok(None)
    }

    async fn put(&self, entry: EffectivePermissions) -> AppResult<()> {
        if !entry.is_fresh_at(Utc::now()) {
            return Ok(());
        }

        self.entries
            .write()
            .await
            .insert((entry.tenant_id, entry.user_id), entry);

        Ok(())
    }

    async fn invalidate(&self, tenant_id: TenantId, user_ids: &[UserId]) -> AppResult<()> {
        let mut entries = self.entries.write().await;
        for user_id in user_ids {
            entries.remove(&(tenant_id, *user_id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{Duration, Utc};
    use corbel_application::{EffectivePermissionCache, EffectivePermissions};
    use corbel_core::{TenantId, UserId};
    use corbel_domain::Permission;

    use super::InMemoryEffectivePermissionCache;

    fn entry(tenant_id: TenantId, user_id: UserId, ttl: Duration) -> EffectivePermissions {
        let computed_at = Utc::now();
        EffectivePermissions {
            tenant_id,
            user_id,
            permissions: BTreeSet::from([Permission::ProjectRead]),
            role_ids: Vec::new(),
            computed_at,
            expires_at: computed_at + ttl,
        }
    }

    #[tokio::test]
    async fn entries_are_keyed_by_tenant_and_user() {
        let cache = InMemoryEffectivePermissionCache::new();
        let stored = cache
            .put(entry(TenantId::new(1), UserId::new(1), Duration::minutes(5)))
            .await;
        assert!(stored.is_ok());

        assert!(matches!(
            cache.get(TenantId::new(1), UserId::new(1)).await,
            Ok(Some(_))
        ));
        assert!(matches!(
            cache.get(TenantId::new(2), UserId::new(1)).await,
            Ok(None)
        ));
    }

    #[tokio::test]
    async fn expired_entries_are_not_served() {
        let cache = InMemoryEffectivePermissionCache::new();
        let stored = cache
            .put(entry(TenantId::new(1), UserId::new(1), Duration::seconds(-1)))
            .await;
        assert!(stored.is_ok());

        assert!(matches!(
            cache.get(TenantId::new(1), UserId::new(1)).await,
            Ok(None)
        ));
    }

    #[tokio::test]
    async fn invalidation_only_drops_listed_users() {
        let cache = InMemoryEffectivePermissionCache::new();
        for user in [1, 2] {
            let stored = cache
                .put(entry(TenantId::new(1), UserId::new(user), Duration::minutes(5)))
                .await;
            assert!(stored.is_ok());
        }

        let invalidated = cache.invalidate(TenantId::new(1), &[UserId::new(1)]).await;
        assert!(invalidated.is_ok());

        assert!(matches!(
            cache.get(TenantId::new(1), UserId::new(1)).await,
            Ok(None)
        ));
        assert!(matches!(
            cache.get(TenantId::new(1), UserId::new(2)).await,
            Ok(Some(_))
        ));
    }
}
