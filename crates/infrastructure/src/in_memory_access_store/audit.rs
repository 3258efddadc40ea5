use async_trait::async_trait;
use corbel_application::{
    AuditLogFilter, AuditLogPage, AuditLogRepository, AuditRepository, Pagination, TenantFilter,
};

use super::*;

fn matches_filter(entry: &AuditLogEntry, tenants: TenantFilter, filter: &AuditLogFilter) -> bool {
    tenants
        .tenant_id()
        .is_none_or(|tenant_id| entry.tenant_id == tenant_id)
        && filter.action.is_none_or(|action| entry.action == action)
        && filter.user_id.is_none_or(|user_id| entry.user_id == user_id)
        && filter
            .resource_type
            .as_deref()
            .is_none_or(|resource_type| entry.resource_type == resource_type)
        && filter.from.is_none_or(|from| entry.created_at >= from)
        && filter.to.is_none_or(|to| entry.created_at < to)
}

#[async_trait]
impl AuditRepository for InMemoryAccessStore {
    async fn append_event(&self, event: AuditEvent) -> AppResult<AuditLogEntry> {
        let mut state = self.state.write().await;
        state.check_audit(&event)?;
        Ok(state.append_audit(event))
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAccessStore {
    async fn list_entries(
        &self,
        tenants: TenantFilter,
        filter: AuditLogFilter,
        pagination: Pagination,
    ) -> AppResult<AuditLogPage> {
        let state = self.state.read().await;
        let matching = state
            .audit_log
            .iter()
            .rev()
            .filter(|entry| matches_filter(entry, tenants, &filter))
            .collect::<Vec<_>>();

        Ok(AuditLogPage {
            total: u64::try_from(matching.len()).unwrap_or(u64::MAX),
            entries: matching
                .into_iter()
                .skip(pagination.offset())
                .take(pagination.limit())
                .cloned()
                .collect(),
            pagination,
        })
    }
}
