use corbel_domain::{PermissionDescriptor, RoleTemplate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Optional category narrowing for catalog listings.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
}

/// API representation of a catalog permission.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-descriptor-response.ts"
)]
pub struct PermissionDescriptorResponse {
    pub id: i16,
    pub key: String,
    pub name: String,
    pub resource: String,
    pub action: String,
    pub category: String,
    pub requires_elevation: bool,
}

impl From<PermissionDescriptor> for PermissionDescriptorResponse {
    fn from(value: PermissionDescriptor) -> Self {
        Self {
            id: value.permission.id(),
            key: format!("{}.{}", value.resource, value.action),
            name: value.name,
            resource: value.resource,
            action: value.action,
            category: value.category.as_str().to_owned(),
            requires_elevation: value.requires_elevation,
        }
    }
}

/// API representation of a role template.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-template-response.ts"
)]
pub struct RoleTemplateResponse {
    pub template_id: i64,
    pub name: String,
    pub category: String,
    pub permissions: Vec<i16>,
    pub is_system_template: bool,
}

impl From<RoleTemplate> for RoleTemplateResponse {
    fn from(value: RoleTemplate) -> Self {
        Self {
            template_id: value.template_id.as_i64(),
            name: value.name,
            category: value.category.as_str().to_owned(),
            permissions: value
                .permissions
                .iter()
                .map(|permission| permission.id())
                .collect(),
            is_system_template: value.is_system_template,
        }
    }
}
