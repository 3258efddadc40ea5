use corbel_application::AssignmentQuery;
use corbel_core::UserId;
use corbel_domain::{ProjectAssignment, ProjectId, RoleAssignment};

use super::{AssignmentListQuery, ProjectAssignmentResponse, RoleAssignmentResponse};

impl From<AssignmentListQuery> for AssignmentQuery {
    fn from(value: AssignmentListQuery) -> Self {
        Self {
            user_id: value.user_id.map(UserId::new),
            project_id: value.project_id.map(ProjectId::new),
            include_inactive: value.include_inactive,
        }
    }
}

impl From<RoleAssignment> for RoleAssignmentResponse {
    fn from(value: RoleAssignment) -> Self {
        let state = value.state_at(chrono::Utc::now());
        Self {
            assignment_id: value.assignment_id.as_i64(),
            user_id: value.user_id.as_i64(),
            role_id: value.role_id.as_i64(),
            state: state.as_str().to_owned(),
            granted_by: value.granted_by.as_i64(),
            granted_at: value.granted_at.to_rfc3339(),
            expires_at: value.expires_at.map(|expires_at| expires_at.to_rfc3339()),
            revoked_by: value.revoked_by.map(|user_id| user_id.as_i64()),
            revoked_at: value.revoked_at.map(|revoked_at| revoked_at.to_rfc3339()),
        }
    }
}

impl From<ProjectAssignment> for ProjectAssignmentResponse {
    fn from(value: ProjectAssignment) -> Self {
        let state = value.state_at(chrono::Utc::now());
        Self {
            assignment_id: value.assignment_id.as_i64(),
            project_id: value.project_id.as_i64(),
            user_id: value.user_id.as_i64(),
            role_id: value.role_id.as_i64(),
            permission_overrides: value
                .permission_overrides
                .iter()
                .map(|permission| permission.id())
                .collect(),
            state: state.as_str().to_owned(),
            granted_by: value.granted_by.as_i64(),
            granted_at: value.granted_at.to_rfc3339(),
            expires_at: value.expires_at.map(|expires_at| expires_at.to_rfc3339()),
            revoked_by: value.revoked_by.map(|user_id| user_id.as_i64()),
            revoked_at: value.revoked_at.map(|revoked_at| revoked_at.to_rfc3339()),
        }
    }
}
