//! Redis-backed effective permission cache.

use async_trait::async_trait;
use chrono::Utc;
use corbel_application::{EffectivePermissionCache, EffectivePermissions};
use corbel_core::{AppError, AppResult, TenantId, UserId};
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use tracing::debug;

/// Redis implementation of the effective permission cache port.
///
/// Entries are stored as JSON with a server-side TTL matching their expiry.
#[derive(Clone)]
pub struct RedisEffectivePermissionCache {
    client: redis::Client,
    key_prefix: String,
}

impl RedisEffectivePermissionCache {
    /// Creates a cache adapter with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
        }
    }

    fn key_for(&self, tenant_id: TenantId, user_id: UserId) -> String {
        format!("{}:tenant={tenant_id}:user={user_id}", self.key_prefix)
    }

    async fn connection(&self) -> AppResult<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Unavailable(format!("failed to connect to redis: {error}")))
    }
}

#[async_trait]
impl EffectivePermissionCache for RedisEffectivePermissionCache {
    async fn get(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Option<EffectivePermissions>> {
        let key = self.key_for(tenant_id, user_id);
        let mut connection = self.connection().await?;

        let encoded: Option<String> = connection.get(key).await.map_err(|error| {
            AppError::Unavailable(format!(
                "failed to read effective permission cache entry: {error}"
            ))
        })?;

        encoded
            .as_deref()
            .map(|value| {
                serde_json::from_str::<EffectivePermissions>(value).map_err(|error| {
                    AppError::Internal(format!(
                        "invalid effective permission cache value for user '{user_id}': {error}"
                    ))
                })
            })
            .transpose()
    }

    async fn put(&self, entry: EffectivePermissions) -> AppResult<()> {
        let ttl_seconds = (entry.expires_at - Utc::now()).num_seconds();
        let Ok(ttl_seconds) = u64::try_from(ttl_seconds) else {
            return Ok(());
        };
        if ttl_seconds == 0 {
            return Ok(());
        }

        let key = self.key_for(entry.tenant_id, entry.user_id);
        let value = serde_json::to_string(&entry).map_err(|error| {
            AppError::Internal(format!(
                "failed to encode effective permission cache entry: {error}"
            ))
        })?;
        let mut connection = self.connection().await?;

        connection
            .set_ex(key, value, ttl_seconds)
            .await
            .map_err(|error| {
                AppError::Unavailable(format!(
                    "failed to write effective permission cache entry: {error}"
                ))
            })
    }

    async fn invalidate(&self, tenant_id: TenantId, user_ids: &[UserId]) -> AppResult<()> {
        if user_ids.is_empty() {
            return Ok(());
        }

        let keys = user_ids
            .iter()
            .map(|user_id| self.key_for(tenant_id, *user_id))
            .collect::<Vec<_>>();
        let mut connection = self.connection().await?;

        let removed: u64 = connection.del(keys).await.map_err(|error| {
            AppError::Unavailable(format!(
                "failed to invalidate effective permission cache entries: {error}"
            ))
        })?;

        debug!(
            tenant_id = %tenant_id,
            requested = user_ids.len(),
            removed,
            "effective permission cache entries invalidated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::RedisEffectivePermissionCache;
    use corbel_core::{TenantId, UserId};

    #[test]
    fn keys_are_scoped_by_tenant_and_user() {
        let client = redis::Client::open("redis://127.0.0.1/").unwrap_or_else(|_| unreachable!());
        let cache = RedisEffectivePermissionCache::new(client, "corbel:permissions");

        assert_eq!(
            cache.key_for(TenantId::new(3), UserId::new(7)),
            "corbel:permissions:tenant=3:user=7"
        );
        assert_ne!(
            cache.key_for(TenantId::new(3), UserId::new(7)),
            cache.key_for(TenantId::new(4), UserId::new(7))
        );
    }
}
