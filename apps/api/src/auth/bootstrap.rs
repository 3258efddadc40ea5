use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use corbel_core::{AppError, Principal, TenantId, UserId};
use tower_sessions::Session;
use tracing::{info, warn};

use crate::dto::BootstrapRequest;
use crate::error::ApiResult;
use crate::state::AppState;

use super::request_metadata;
use super::{SESSION_CREATED_AT_KEY, SESSION_PRINCIPAL_KEY};

/// Stores an already-authenticated principal in the session.
///
/// Stands in for the identity provider during development.
pub async fn bootstrap_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    session: Session,
    Json(payload): Json<BootstrapRequest>,
) -> ApiResult<StatusCode> {
    if payload.token != state.bootstrap_token {
        warn!(user_id = payload.user_id, "bootstrap refused: invalid token");
        return Err(AppError::Unauthorized("invalid bootstrap token".to_owned()).into());
    }

    let user_id = UserId::new(payload.user_id);
    let principal = match payload.tenant_id {
        Some(tenant_id) => {
            let principal = Principal::new(user_id, TenantId::new(tenant_id))
                .with_request_metadata(request_metadata(&headers));
            state.authorization_service.scope(&principal).await?;
            principal
        }
        None => Principal::without_tenant(user_id),
    };

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    session
        .insert(SESSION_PRINCIPAL_KEY, &principal)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session principal: {error}"))
        })?;

    session
        .insert(SESSION_CREATED_AT_KEY, chrono::Utc::now().timestamp())
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session creation time: {error}"))
        })?;

    info!(
        user_id = %user_id,
        tenant_id = ?principal.tenant_id(),
        "session bootstrapped"
    );
    Ok(StatusCode::NO_CONTENT)
}
