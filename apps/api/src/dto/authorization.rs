use corbel_application::EffectivePermissions;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming permission check.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-check-request.ts"
)]
pub struct PermissionCheckRequest {
    /// Permission ids or `resource.action` keys.
    pub permissions: Vec<String>,
    /// Defaults to requiring every listed permission.
    #[serde(default)]
    #[ts(optional)]
    pub require_all: Option<bool>,
}

/// Outcome of a permission check.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-check-response.ts"
)]
pub struct PermissionCheckResponse {
    pub allowed: bool,
}

/// Tenant-wide effective permissions of one user.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/effective-permissions-response.ts"
)]
pub struct EffectivePermissionsResponse {
    pub tenant_id: i64,
    pub user_id: i64,
    pub permissions: Vec<i16>,
    pub permission_keys: Vec<String>,
    pub role_ids: Vec<i64>,
    pub computed_at: String,
    pub expires_at: String,
}

impl From<EffectivePermissions> for EffectivePermissionsResponse {
    fn from(value: EffectivePermissions) -> Self {
        Self {
            tenant_id: value.tenant_id.as_i64(),
            user_id: value.user_id.as_i64(),
            permissions: value
                .permissions
                .iter()
                .map(|permission| permission.id())
                .collect(),
            permission_keys: value
                .permissions
                .iter()
                .map(|permission| permission.key())
                .collect(),
            role_ids: value
                .role_ids
                .iter()
                .map(|role_id| role_id.as_i64())
                .collect(),
            computed_at: value.computed_at.to_rfc3339(),
            expires_at: value.expires_at.to_rfc3339(),
        }
    }
}
