use axum::Json;
use axum::extract::{Extension, Path, State};
use corbel_core::Principal;
use corbel_domain::ProjectId;

use crate::dto::{
    EffectivePermissionsResponse, PermissionCheckRequest, PermissionCheckResponse,
    parse_permissions,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn check_permission_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<PermissionCheckRequest>,
) -> ApiResult<Json<PermissionCheckResponse>> {
    let permissions = parse_permissions(&payload.permissions)?;
    let permissions = permissions.into_iter().collect::<Vec<_>>();

    let allowed = state
        .authorization_service
        .check_permission(&principal, &permissions, payload.require_all.unwrap_or(true))
        .await?;

    Ok(Json(PermissionCheckResponse { allowed }))
}

pub async fn check_project_permission_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(project_id): Path<i64>,
    Json(payload): Json<PermissionCheckRequest>,
) -> ApiResult<Json<PermissionCheckResponse>> {
    let permissions = parse_permissions(&payload.permissions)?
        .into_iter()
        .collect::<Vec<_>>();

    let allowed = state
        .authorization_service
        .check_project_permission(
            &principal,
            ProjectId::new(project_id),
            &permissions,
            payload.require_all.unwrap_or(true),
        )
        .await?;

    Ok(Json(PermissionCheckResponse { allowed }))
}

pub async fn effective_permissions_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<EffectivePermissionsResponse>> {
    let effective = state
        .authorization_service
        .effective_permissions(&principal)
        .await?;

    Ok(Json(EffectivePermissionsResponse::from(effective)))
}
