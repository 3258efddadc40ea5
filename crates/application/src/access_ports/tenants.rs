use async_trait::async_trait;
use corbel_core::{AppResult, NonEmptyString, TenantId, UserId};
use corbel_domain::{Tenant, TenantStatus};
use serde_json::Value;

use super::audit::AuditEvent;
use crate::tenant_guard::PlatformBypass;

/// Input payload for tenant provisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTenantInput {
    /// Display name.
    pub name: NonEmptyString,
    /// Initial settings object.
    pub settings: Value,
}

/// Repository port for tenants and their memberships.
#[async_trait]
pub trait TenantRepository: Send + Sync {
    /// Finds a tenant by identifier.
    async fn find_tenant(&self, tenant_id: TenantId) -> AppResult<Option<Tenant>>;

    /// Returns whether the user belongs to the tenant.
    async fn is_member(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<bool>;

    /// Adds a membership. Existing memberships are a conflict.
    async fn add_member(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        audit: AuditEvent,
    ) -> AppResult<()>;

    /// Creates a tenant in active status.
    async fn create_tenant(&self, input: CreateTenantInput, audit: AuditEvent)
    -> AppResult<Tenant>;

    /// Lists every tenant. Requires a verified platform bypass.
    async fn list_tenants(&self, bypass: &PlatformBypass) -> AppResult<Vec<Tenant>>;

    /// Changes a tenant's status.
    async fn set_tenant_status(
        &self,
        tenant_id: TenantId,
        status: TenantStatus,
        audit: AuditEvent,
    ) -> AppResult<Tenant>;
}
