use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use corbel_core::{Principal, UserId};

use crate::dto::AddMemberRequest;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn add_member_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<AddMemberRequest>,
) -> ApiResult<StatusCode> {
    state
        .tenant_admin_service
        .add_member(&principal, UserId::new(payload.user_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
