use corbel_core::TenantId;
use corbel_domain::Tenant;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use super::audit::AuditLogQuery;

/// Incoming payload for tenant provisioning.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-tenant-request.ts"
)]
pub struct CreateTenantRequest {
    pub name: String,
    #[ts(type = "Record<string, unknown> | null")]
    pub settings: Option<Value>,
}

/// Incoming payload for tenant activation or suspension.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/set-tenant-status-request.ts"
)]
pub struct SetTenantStatusRequest {
    /// `active` or `suspended`.
    pub status: String,
}

/// Incoming payload for adding a user to the caller's tenant.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/add-member-request.ts"
)]
pub struct AddMemberRequest {
    pub user_id: i64,
}

/// Cross-tenant audit query; `tenant_id` narrows to one tenant.
#[derive(Debug, Default, Deserialize)]
pub struct PlatformAuditLogQuery {
    pub tenant_id: Option<i64>,
    pub action: Option<String>,
    pub user_id: Option<i64>,
    pub resource_type: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl PlatformAuditLogQuery {
    /// Splits the target tenant from the shared audit filters.
    pub fn split(self) -> (Option<TenantId>, AuditLogQuery) {
        (
            self.tenant_id.map(TenantId::new),
            AuditLogQuery {
                action: self.action,
                user_id: self.user_id,
                resource_type: self.resource_type,
                from: self.from,
                to: self.to,
                limit: self.limit,
                offset: self.offset,
            },
        )
    }
}

/// API representation of a tenant.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/tenant-response.ts"
)]
pub struct TenantResponse {
    pub tenant_id: i64,
    pub name: String,
    pub status: String,
    #[ts(type = "Record<string, unknown>")]
    pub settings: Value,
}

impl From<Tenant> for TenantResponse {
    fn from(value: Tenant) -> Self {
        Self {
            tenant_id: value.tenant_id.as_i64(),
            name: value.name,
            status: value.status.as_str().to_owned(),
            settings: value.settings,
        }
    }
}
