use super::*;

pub async fn list_project_assignments_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<AssignmentListQuery>,
) -> ApiResult<Json<Vec<ProjectAssignmentResponse>>> {
    let assignments = state
        .assignment_service
        .list_project_assignments(&principal, query.into())
        .await?
        .into_iter()
        .map(ProjectAssignmentResponse::from)
        .collect();

    Ok(Json(assignments))
}

pub async fn assign_project_role_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<AssignProjectRoleRequest>,
) -> ApiResult<(StatusCode, Json<ProjectAssignmentResponse>)> {
    let input = AssignProjectRoleInput {
        project_id: ProjectId::new(payload.project_id),
        user_id: UserId::new(payload.user_id),
        role_id: RoleId::new(payload.role_id),
        permission_overrides: parse_permissions(&payload.permission_overrides)?,
        expires_at: parse_timestamp("expires_at", payload.expires_at.as_deref())?,
    };

    let assignment = state
        .assignment_service
        .assign_project_role(&principal, input)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ProjectAssignmentResponse::from(assignment)),
    ))
}

pub async fn revoke_project_assignment_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(assignment_id): Path<i64>,
) -> ApiResult<Json<ProjectAssignmentResponse>> {
    let assignment = state
        .assignment_service
        .revoke_project_assignment(&principal, ProjectAssignmentId::new(assignment_id))
        .await?;

    Ok(Json(ProjectAssignmentResponse::from(assignment)))
}
