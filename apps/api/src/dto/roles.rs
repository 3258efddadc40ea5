use corbel_domain::Role;
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

/// Incoming payload for tenant role creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-role-request.ts"
)]
pub struct CreateRoleRequest {
    pub name: String,
    pub description: Option<String>,
    pub template_id: Option<i64>,
    #[serde(default)]
    pub custom_permissions: Vec<String>,
}

/// Incoming payload for role updates. Absent fields stay unchanged.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-role-request.ts"
)]
pub struct UpdateRoleRequest {
    #[serde(default)]
    #[ts(optional)]
    pub name: Option<String>,
    /// `null` clears the description.
    #[serde(default, deserialize_with = "present")]
    #[ts(type = "string | null")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    #[ts(optional)]
    pub custom_permissions: Option<Vec<String>>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// API representation of a tenant role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-response.ts"
)]
pub struct RoleResponse {
    pub role_id: i64,
    pub tenant_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub template_id: Option<i64>,
    pub custom_permissions: Vec<i16>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Role> for RoleResponse {
    fn from(value: Role) -> Self {
        Self {
            role_id: value.role_id.as_i64(),
            tenant_id: value.tenant_id.as_i64(),
            name: value.name,
            description: value.description,
            template_id: value.template_id.map(|template_id| template_id.as_i64()),
            custom_permissions: value
                .custom_permissions
                .iter()
                .map(|permission| permission.id())
                .collect(),
            is_active: value.is_active,
            created_at: value.created_at.to_rfc3339(),
            updated_at: value.updated_at.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::UpdateRoleRequest;

    #[test]
    fn null_description_differs_from_absent() {
        let cleared = serde_json::from_str::<UpdateRoleRequest>(r#"{"description":null}"#);
        assert!(matches!(
            cleared.map(|request| request.description),
            Ok(Some(None))
        ));

        let untouched = serde_json::from_str::<UpdateRoleRequest>(r#"{"name":"Foreman"}"#);
        assert!(matches!(
            untouched.map(|request| request.description),
            Ok(None)
        ));
    }
}
