use std::sync::Arc;

use corbel_core::{AppError, AppResult, Principal, TenantId};
use corbel_domain::{AuditAction, Permission};
use serde_json::Value;

use crate::access_ports::{
    AuditEvent, AuditLogEntry, AuditLogFilter, AuditLogPage, AuditLogRepository,
    AuditRepository, Pagination, TenantFilter,
};
use crate::authorization_service::AuthorizationService;
use crate::tenant_guard::TenantScope;

/// Application service for the append-only audit trail.
#[derive(Clone)]
pub struct AuditService {
    authorization_service: AuthorizationService,
    audit_repository: Arc<dyn AuditRepository>,
    audit_log_repository: Arc<dyn AuditLogRepository>,
}

impl AuditService {
    /// Creates an audit service.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        audit_repository: Arc<dyn AuditRepository>,
        audit_log_repository: Arc<dyn AuditLogRepository>,
    ) -> Self {
        Self {
            authorization_service,
            audit_repository,
            audit_log_repository,
        }
    }

    /// Appends one entry for the scoped user.
    pub async fn record(
        &self,
        scope: &TenantScope,
        action: AuditAction,
        resource_type: &str,
        resource_id: Option<String>,
        old_values: Option<Value>,
        new_values: Option<Value>,
    ) -> AppResult<AuditLogEntry> {
        if resource_type.trim().is_empty() {
            return Err(AppError::Validation(
                "audit resource type must not be empty".to_owned(),
            ));
        }

        let mut event = AuditEvent::new(
            scope.tenant_id(),
            scope.user_id(),
            action,
            resource_type.trim(),
            scope.request().clone(),
        );
        event.resource_id = resource_id;
        event.old_values = old_values;
        event.new_values = new_values;

        self.audit_repository.append_event(event).await
    }

    /// Lists entries of the principal's own tenant, newest first.
    pub async fn list_audit_logs(
        &self,
        principal: &Principal,
        filter: AuditLogFilter,
        pagination: Pagination,
    ) -> AppResult<AuditLogPage> {
        let scope = self.authorization_service.scope(principal).await?;
        self.authorization_service
            .require_permission(&scope, Permission::AuditLogRead)
            .await?;
        ensure_window(&filter)?;

        self.audit_log_repository
            .list_entries(TenantFilter::only(scope.tenant_id()), filter, pagination)
            .await
    }

    /// Lists entries of one or every tenant for a platform principal.
    ///
    /// The read is recorded before any row is returned.
    pub async fn list_platform_audit_logs(
        &self,
        principal: &Principal,
        target_tenant: Option<TenantId>,
        filter: AuditLogFilter,
        pagination: Pagination,
    ) -> AppResult<AuditLogPage> {
        let bypass = self.authorization_service.platform_bypass(principal).await?;
        ensure_window(&filter)?;

        self.authorization_service
            .record_bypass_read(&bypass, "audit_log", target_tenant)
            .await?;

        let tenants = match target_tenant {
            Some(tenant_id) => TenantFilter::only(tenant_id),
            None => TenantFilter::across_tenants(&bypass),
        };
        self.audit_log_repository
            .list_entries(tenants, filter, pagination)
            .await
    }
}

fn ensure_window(filter: &AuditLogFilter) -> AppResult<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from >= to
    {
        return Err(AppError::Validation(
            "audit window 'from' must be earlier than 'to'".to_owned(),
        ));
    }

    Ok(())
}
