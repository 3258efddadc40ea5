use std::sync::Arc;

use corbel_application::EffectivePermissionCache;
use corbel_core::{AppError, AppResult};
use corbel_infrastructure::{
    InMemoryEffectivePermissionCache, PostgresEffectivePermissionCache,
    RedisEffectivePermissionCache,
};
use sqlx::PgPool;

use crate::api_config::{ApiConfig, PermissionCacheBackend};

pub(super) fn build_effective_permission_cache(
    pool: &PgPool,
    config: &ApiConfig,
    redis_client: Option<redis::Client>,
) -> AppResult<Arc<dyn EffectivePermissionCache>> {
    match config.permission_cache_backend {
        PermissionCacheBackend::Postgres => {
            Ok(Arc::new(PostgresEffectivePermissionCache::new(pool.clone())))
        }
        PermissionCacheBackend::InMemory => Ok(Arc::new(InMemoryEffectivePermissionCache::new())),
        PermissionCacheBackend::Redis => {
            let redis_client = redis_client.ok_or_else(|| {
                AppError::Validation(
                    "REDIS_URL is required when PERMISSION_CACHE_BACKEND=redis".to_owned(),
                )
            })?;
            Ok(Arc::new(RedisEffectivePermissionCache::new(
                redis_client,
                "corbel:effective_permissions",
            )))
        }
    }
}
