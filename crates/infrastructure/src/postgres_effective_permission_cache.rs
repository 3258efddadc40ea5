use async_trait::async_trait;
use chrono::{DateTime, Utc};
use corbel_application::{EffectivePermissionCache, EffectivePermissions};
use corbel_core::{AppResult, TenantId, UserId};
use corbel_domain::RoleId;
use sqlx::{FromRow, PgPool};
use tracing::debug;

use crate::postgres_support::{decode_permissions, encode_permissions, map_sqlx_error};

/// PostgreSQL-backed effective permission cache.
///
/// Used when no Redis endpoint is configured so every API instance shares one
/// cache table.
#[derive(Clone)]
pub struct PostgresEffectivePermissionCache {
    pool: PgPool,
}

impl PostgresEffectivePermissionCache {
    /// Creates a cache with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CacheRow {
    tenant_id: i64,
    user_id: i64,
    permissions: Vec<i16>,
    role_ids: Vec<i64>,
    computed_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

#[async_trait]
impl EffectivePermissionCache for PostgresEffectivePermissionCache {
    async fn get(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Option<EffectivePermissions>> {
        let row = sqlx::query_as::<_, CacheRow>(
            r#"
            SELECT tenant_id, user_id, permissions, role_ids, computed_at, expires_at
            FROM effective_permission_cache
            WHERE tenant_id = $1 AND user_id = $2
            "#,
        )
        .bind(tenant_id.as_i64())
        .bind(user_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "failed to read effective permission cache"))?;

        row.map(|row| {
            Ok(EffectivePermissions {
                tenant_id: TenantId::new(row.tenant_id),
                user_id: UserId::new(row.user_id),
                permissions: decode_permissions(&row.permissions)?,
                role_ids: row.role_ids.into_iter().map(RoleId::new).collect(),
                computed_at: row.computed_at,
                expires_at: row.expires_at,
            })
        })
        .transpose()
    }

    async fn put(&self, entry: EffectivePermissions) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO effective_permission_cache (
                tenant_id,
                user_id,
                permissions,
                role_ids,
                computed_at,
                expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (tenant_id, user_id) DO UPDATE
            SET permissions = EXCLUDED.permissions,
                role_ids = EXCLUDED.role_ids,
                computed_at = EXCLUDED.computed_at,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(entry.tenant_id.as_i64())
        .bind(entry.user_id.as_i64())
        .bind(encode_permissions(&entry.permissions))
        .bind(
            entry
                .role_ids
                .iter()
                .map(|role_id| role_id.as_i64())
                .collect::<Vec<_>>(),
        )
        .bind(entry.computed_at)
        .bind(entry.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "failed to write effective permission cache"))?;

        Ok(())
    }

    async fn invalidate(&self, tenant_id: TenantId, user_ids: &[UserId]) -> AppResult<()> {
        if user_ids.is_empty() {
            return Ok(());
        }

        let removed = sqlx::query(
            r#"
            DELETE FROM effective_permission_cache
            WHERE tenant_id = $1 AND user_id = ANY($2)
            "#,
        )
        .bind(tenant_id.as_i64())
        .bind(
            user_ids
                .iter()
                .map(|user_id| user_id.as_i64())
                .collect::<Vec<_>>(),
        )
        .execute(&self.pool)
        .await
        .map_err(|error| {
            map_sqlx_error(error, "failed to invalidate effective permission cache")
        })?
        .rows_affected();

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
    use std::collections::BTreeSet;

    use chrono::{Duration, Utc};
    use corbel_application::{EffectivePermissionCache, EffectivePermissions};
    use corbel_core::UserId;
    use corbel_domain::{Permission, RoleId};

    use super::PostgresEffectivePermissionCache;
    use crate::postgres_test_support::{fresh_tenant, test_pool};

    #[tokio::test]
    async fn entries_replace_and_invalidate_per_user() {
        let Some(pool) = test_pool().await else {
            return;
        };

        let cache = PostgresEffectivePermissionCache::new(pool.clone());
        let tenant_id = fresh_tenant(&pool, &[]).await;
        let computed_at = Utc::now();

        for permissions in [
            BTreeSet::from([Permission::ProjectRead]),
            BTreeSet::from([Permission::ProjectRead, Permission::TaskManage]),
        ] {
            let stored = cache
                .put(EffectivePermissions {
                    tenant_id,
                    user_id: UserId::new(1),
                    permissions,
                    role_ids: vec![RoleId::new(4)],
                    computed_at,
                    expires_at: computed_at + Duration::hours(1),
                })
                .await;
            assert!(stored.is_ok());
        }

        let cached = cache
            .get(tenant_id, UserId::new(1))
            .await
            .unwrap_or_default()
            .map(|entry| entry.permissions.len());
        assert_eq!(cached, Some(2));

        assert!(cache.invalidate(tenant_id, &[UserId::new(1)]).await.is_ok());
        assert!(matches!(cache.get(tenant_id, UserId::new(1)).await, Ok(None)));
    }
}
