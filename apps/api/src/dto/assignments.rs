use serde::{Deserialize, Serialize};
use ts_rs::TS;

mod conversions;

/// Incoming payload for tenant-wide role assignment.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/assign-role-request.ts"
)]
pub struct AssignRoleRequest {
    pub user_id: i64,
    pub role_id: i64,
    /// RFC 3339 expiry.
    pub expires_at: Option<String>,
}

/// Incoming payload for project-scope role assignment.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/assign-project-role-request.ts"
)]
pub struct AssignProjectRoleRequest {
    pub project_id: i64,
    pub user_id: i64,
    pub role_id: i64,
    #[serde(default)]
    pub permission_overrides: Vec<String>,
    /// RFC 3339 expiry.
    pub expires_at: Option<String>,
}

/// Listing filters shared by both assignment scopes.
#[derive(Debug, Default, Deserialize)]
pub struct AssignmentListQuery {
    pub user_id: Option<i64>,
    pub project_id: Option<i64>,
    #[serde(default)]
    pub include_inactive: bool,
}

/// API representation of a tenant-wide assignment.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-assignment-response.ts"
)]
pub struct RoleAssignmentResponse {
    pub assignment_id: i64,
    pub user_id: i64,
    pub role_id: i64,
    pub state: String,
    pub granted_by: i64,
    pub granted_at: String,
    pub expires_at: Option<String>,
    pub revoked_by: Option<i64>,
    pub revoked_at: Option<String>,
}

/// API representation of a project-scope assignment.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/project-assignment-response.ts"
)]
pub struct ProjectAssignmentResponse {
    pub assignment_id: i64,
    pub project_id: i64,
    pub user_id: i64,
    pub role_id: i64,
    pub permission_overrides: Vec<i16>,
    pub state: String,
    pub granted_by: i64,
    pub granted_at: String,
    pub expires_at: Option<String>,
    pub revoked_by: Option<i64>,
    pub revoked_at: Option<String>,
}
