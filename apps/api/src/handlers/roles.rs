use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use corbel_application::{CreateRoleInput, UpdateRoleInput};
use corbel_core::Principal;
use corbel_domain::{RoleId, TemplateId};

use crate::dto::{CreateRoleRequest, RoleResponse, UpdateRoleRequest, parse_permissions};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .role_service
        .list_roles(&principal)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let input = CreateRoleInput {
        name: payload.name,
        description: payload.description,
        template_id: payload.template_id.map(TemplateId::new),
        custom_permissions: parse_permissions(&payload.custom_permissions)?,
    };

    let role = state.role_service.create_role(&principal, input).await?;
    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn get_role_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(role_id): Path<i64>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state
        .role_service
        .role(&principal, RoleId::new(role_id))
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn update_role_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(role_id): Path<i64>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let custom_permissions = payload
        .custom_permissions
        .as_deref()
        .map(parse_permissions)
        .transpose()?;
    let input = UpdateRoleInput {
        name: payload.name,
        description: payload.description,
        custom_permissions,
    };

    let role = state
        .role_service
        .update_role(&principal, RoleId::new(role_id), input)
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn deactivate_role_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(role_id): Path<i64>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state
        .role_service
        .deactivate_role(&principal, RoleId::new(role_id))
        .await?;

    Ok(Json(RoleResponse::from(role)))
}
