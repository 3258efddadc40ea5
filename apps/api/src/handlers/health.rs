use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::warn;

use crate::api_config::PermissionCacheBackend;
use crate::dto::{HealthDependencyStatus, HealthResponse};
use crate::state::AppState;

mod checks;

use checks::{check_postgres, check_redis};

/// Readiness of the stores that back permission checks.
///
/// Redis only gates readiness when sessions or the permission cache live there.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let postgres = check_postgres(&state.postgres_pool).await;
    let redis = check_redis(state.redis_client.as_ref(), state.redis_required).await;

    let ready = postgres.is_ok() && (redis.is_ok() || !state.redis_required);
    let response = HealthResponse {
        status: if ready { "ok" } else { "degraded" },
        ready,
        permission_cache: state.permission_cache_backend.as_str(),
        postgres,
        redis,
    };

    if ready {
        return (StatusCode::OK, Json(response));
    }

    if state.permission_cache_backend == PermissionCacheBackend::Redis && !response.redis.is_ok() {
        warn!("permission cache backend is unreachable; checks will deny");
    }
    (StatusCode::SERVICE_UNAVAILABLE, Json(response))
}
