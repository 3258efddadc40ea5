use axum::Json;
use axum::extract::Extension;
use axum::http::StatusCode;
use corbel_core::{AppError, Principal};
use tower_sessions::Session;
use tracing::info;

use crate::dto::PrincipalResponse;
use crate::error::ApiResult;

use super::SESSION_PRINCIPAL_KEY;

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    let principal = session
        .get::<Principal>(SESSION_PRINCIPAL_KEY)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to read session principal: {error}"))
        })?;

    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    if let Some(principal) = principal {
        info!(user_id = %principal.user_id(), "session ended");
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(Extension(principal): Extension<Principal>) -> Json<PrincipalResponse> {
    Json(PrincipalResponse::from(principal))
}
