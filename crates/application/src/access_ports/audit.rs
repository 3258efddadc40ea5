use async_trait::async_trait;
use chrono::{DateTime, Utc};
use corbel_core::{AppResult, RequestMetadata, TenantId, UserId};
use corbel_domain::AuditAction;
use serde_json::Value;

use crate::tenant_guard::PlatformBypass;

/// Immutable audit event payload emitted by application services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Tenant scope for the event.
    pub tenant_id: TenantId,
    /// User that performed the action.
    pub user_id: UserId,
    /// Stable audit action identifier.
    pub action: AuditAction,
    /// Resource type label.
    pub resource_type: String,
    /// Resource identifier, stamped by the store when the resource is created
    /// in the same transaction.
    pub resource_id: Option<String>,
    /// State before the change.
    pub old_values: Option<Value>,
    /// State after the change.
    pub new_values: Option<Value>,
    /// Request context of the acting principal.
    pub request: RequestMetadata,
}

impl AuditEvent {
    /// Creates an event without value snapshots.
    #[must_use]
    pub fn new(
        tenant_id: TenantId,
        user_id: UserId,
        action: AuditAction,
        resource_type: impl Into<String>,
        request: RequestMetadata,
    ) -> Self {
        Self {
            tenant_id,
            user_id,
            action,
            resource_type: resource_type.into(),
            resource_id: None,
            old_values: None,
            new_values: None,
            request,
        }
    }

    /// Sets the resource identifier.
    #[must_use]
    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Sets the resource identifier only when none was provided yet.
    #[must_use]
    pub fn stamp_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        if self.resource_id.is_none() {
            self.resource_id = Some(resource_id.into());
        }
        self
    }

    /// Sets the pre-change snapshot.
    #[must_use]
    pub fn with_old_values(mut self, old_values: Value) -> Self {
        self.old_values = Some(old_values);
        self
    }

    /// Sets the post-change snapshot.
    #[must_use]
    pub fn with_new_values(mut self, new_values: Value) -> Self {
        self.new_values = Some(new_values);
        self
    }
}

/// Persisted audit log row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogEntry {
    /// Stable entry identifier.
    pub entry_id: String,
    /// Tenant the entry belongs to.
    pub tenant_id: TenantId,
    /// Acting user.
    pub user_id: UserId,
    /// Stable action identifier.
    pub action: AuditAction,
    /// Resource type label.
    pub resource_type: String,
    /// Resource identifier.
    pub resource_id: Option<String>,
    /// State before the change.
    pub old_values: Option<Value>,
    /// State after the change.
    pub new_values: Option<Value>,
    /// Originating address.
    pub ip_address: Option<String>,
    /// Originating user agent.
    pub user_agent: Option<String>,
    /// Append timestamp.
    pub created_at: DateTime<Utc>,
}

/// Optional narrowing filters for audit listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditLogFilter {
    /// Only entries with this action.
    pub action: Option<AuditAction>,
    /// Only entries by this actor.
    pub user_id: Option<UserId>,
    /// Only entries for this resource type.
    pub resource_type: Option<String>,
    /// Inclusive lower bound on `created_at`.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`.
    pub to: Option<DateTime<Utc>>,
}

/// Offset pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    limit: usize,
    offset: usize,
}

impl Pagination {
    /// Default page size.
    pub const DEFAULT_LIMIT: usize = 50;
    /// Largest page size a caller may request.
    pub const MAX_LIMIT: usize = 200;

    /// Builds a window, clamping the limit into `1..=MAX_LIMIT`.
    #[must_use]
    pub fn new(limit: Option<usize>, offset: Option<usize>) -> Self {
        Self {
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
            offset: offset.unwrap_or(0),
        }
    }

    /// Returns the clamped page size.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns the number of rows skipped.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of audit entries, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogPage {
    /// Entries in this page.
    pub entries: Vec<AuditLogEntry>,
    /// Total entries matching the filter.
    pub total: u64,
    /// Applied window.
    pub pagination: Pagination,
}

/// Tenant restriction for reads that may span tenants.
///
/// The cross-tenant form can only be built from a [`PlatformBypass`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantFilter(Option<TenantId>);

impl TenantFilter {
    /// Restricts a read to one tenant.
    #[must_use]
    pub fn only(tenant_id: TenantId) -> Self {
        Self(Some(tenant_id))
    }

    /// Lifts the tenant restriction for a verified platform principal.
    #[must_use]
    pub fn across_tenants(_bypass: &PlatformBypass) -> Self {
        Self(None)
    }

    /// Returns the tenant restriction, if any.
    #[must_use]
    pub fn tenant_id(&self) -> Option<TenantId> {
        self.0
    }
}

/// Port for persisting append-only audit events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persists one audit event.
    async fn append_event(&self, event: AuditEvent) -> AppResult<AuditLogEntry>;
}

/// Port for audit log reads.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Lists entries newest first.
    async fn list_entries(
        &self,
        tenants: TenantFilter,
        filter: AuditLogFilter,
        pagination: Pagination,
    ) -> AppResult<AuditLogPage>;
}
