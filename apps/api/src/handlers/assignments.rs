use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use corbel_application::{AssignProjectRoleInput, AssignRoleInput};
use corbel_core::{Principal, UserId};
use corbel_domain::{AssignmentId, ProjectAssignmentId, ProjectId, RoleId};

use crate::dto::{
    AssignProjectRoleRequest, AssignRoleRequest, AssignmentListQuery, ProjectAssignmentResponse,
    RoleAssignmentResponse, parse_permissions, parse_timestamp,
};
use crate::error::ApiResult;
use crate::state::AppState;

mod project;

pub use project::{
    assign_project_role_handler, list_project_assignments_handler,
    revoke_project_assignment_handler,
};

pub async fn list_role_assignments_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<AssignmentListQuery>,
) -> ApiResult<Json<Vec<RoleAssignmentResponse>>> {
    let assignments = state
        .assignment_service
        .list_assignments(&principal, query.into())
        .await?
        .into_iter()
        .map(RoleAssignmentResponse::from)
        .collect();

    Ok(Json(assignments))
}

pub async fn assign_role_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<AssignRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleAssignmentResponse>)> {
    let input = AssignRoleInput {
        user_id: UserId::new(payload.user_id),
        role_id: RoleId::new(payload.role_id),
        expires_at: parse_timestamp("expires_at", payload.expires_at.as_deref())?,
    };

    let assignment = state
        .assignment_service
        .assign_role(&principal, input)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RoleAssignmentResponse::from(assignment)),
    ))
}

pub async fn revoke_role_assignment_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(assignment_id): Path<i64>,
) -> ApiResult<Json<RoleAssignmentResponse>> {
    let assignment = state
        .assignment_service
        .revoke_assignment(&principal, AssignmentId::new(assignment_id))
        .await?;

    Ok(Json(RoleAssignmentResponse::from(assignment)))
}
