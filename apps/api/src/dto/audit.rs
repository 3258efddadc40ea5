use std::str::FromStr;

use corbel_application::{AuditLogEntry, AuditLogFilter, AuditLogPage, Pagination};
use corbel_core::{AppResult, UserId};
use corbel_domain::AuditAction;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use super::common::parse_timestamp;

/// Audit log filters and pagination.
#[derive(Debug, Default, Deserialize)]
pub struct AuditLogQuery {
    pub action: Option<String>,
    pub user_id: Option<i64>,
    pub resource_type: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl AuditLogQuery {
    /// Validates the query into repository filters.
    pub fn into_parts(self) -> AppResult<(AuditLogFilter, Pagination)> {
        let action = self
            .action
            .as_deref()
            .map(AuditAction::from_str)
            .transpose()?;
        let filter = AuditLogFilter {
            action,
            user_id: self.user_id.map(UserId::new),
            resource_type: self
                .resource_type
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty()),
            from: parse_timestamp("from", self.from.as_deref())?,
            to: parse_timestamp("to", self.to.as_deref())?,
        };

        Ok((filter, Pagination::new(self.limit, self.offset)))
    }
}

/// API representation of an audit log entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/audit-log-entry-response.ts"
)]
pub struct AuditLogEntryResponse {
    pub entry_id: String,
    pub tenant_id: i64,
    pub user_id: i64,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    #[ts(type = "unknown")]
    pub old_values: Option<Value>,
    #[ts(type = "unknown")]
    pub new_values: Option<Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: String,
}

impl From<AuditLogEntry> for AuditLogEntryResponse {
    fn from(value: AuditLogEntry) -> Self {
        Self {
            entry_id: value.entry_id,
            tenant_id: value.tenant_id.as_i64(),
            user_id: value.user_id.as_i64(),
            action: value.action.as_str().to_owned(),
            resource_type: value.resource_type,
            resource_id: value.resource_id,
            old_values: value.old_values,
            new_values: value.new_values,
            ip_address: value.ip_address,
            user_agent: value.user_agent,
            created_at: value.created_at.to_rfc3339(),
        }
    }
}

/// One page of audit entries, newest first.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/audit-log-page-response.ts"
)]
pub struct AuditLogPageResponse {
    pub entries: Vec<AuditLogEntryResponse>,
    #[ts(type = "number")]
    pub total: u64,
    #[ts(type = "number")]
    pub limit: usize,
    #[ts(type = "number")]
    pub offset: usize,
}

impl From<AuditLogPage> for AuditLogPageResponse {
    fn from(value: AuditLogPage) -> Self {
        Self {
            limit: value.pagination.limit(),
            offset: value.pagination.offset(),
            total: value.total,
            entries: value
                .entries
                .into_iter()
                .map(AuditLogEntryResponse::from)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use corbel_application::Pagination;
    use corbel_core::AppError;
    use corbel_domain::AuditAction;

    use super::AuditLogQuery;

    #[test]
    fn query_parses_actions_and_clamps_pagination() {
        let parts = AuditLogQuery {
            action: Some(AuditAction::RoleCreated.as_str().to_owned()),
            resource_type: Some("  ".to_owned()),
            limit: Some(10_000),
            ..AuditLogQuery::default()
        }
        .into_parts();
        assert!(parts.is_ok());

        let (filter, pagination) = parts.unwrap_or_else(|_| unreachable!());
        assert_eq!(filter.action, Some(AuditAction::RoleCreated));
        assert!(filter.resource_type.is_none());
        assert_eq!(pagination.limit(), Pagination::MAX_LIMIT);
    }

    #[test]
    fn unknown_actions_are_rejected() {
        let parts = AuditLogQuery {
            action: Some("security.role.exploded".to_owned()),
            ..AuditLogQuery::default()
        }
        .into_parts();
        assert!(matches!(parts, Err(AppError::Validation(_))));
    }
}
