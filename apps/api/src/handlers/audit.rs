use axum::Json;
use axum::extract::{Extension, Query, State};
use corbel_core::Principal;

use crate::dto::{AuditLogPageResponse, AuditLogQuery};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_audit_log_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<AuditLogQuery>,
) -> ApiResult<Json<AuditLogPageResponse>> {
    let (filter, pagination) = query.into_parts()?;
    let page = state
        .audit_service
        .list_audit_logs(&principal, filter, pagination)
        .await?;

    Ok(Json(AuditLogPageResponse::from(page)))
}
