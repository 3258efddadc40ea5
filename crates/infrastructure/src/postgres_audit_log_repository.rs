use async_trait::async_trait;
use corbel_application::{
    AuditLogEntry, AuditLogFilter, AuditLogPage, AuditLogRepository, Pagination, TenantFilter,
};
use corbel_core::{AppError, AppResult};
use sqlx::PgPool;

use crate::postgres_audit_repository::AuditLogRow;
use crate::postgres_support::map_sqlx_error;

/// PostgreSQL-backed repository for audit log reads.
#[derive(Clone)]
pub struct PostgresAuditLogRepository {
    pool: PgPool,
}

impl PostgresAuditLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
    async fn list_entries(
        &self,
        tenants: TenantFilter,
        filter: AuditLogFilter,
        pagination: Pagination,
    ) -> AppResult<AuditLogPage> {
        let tenant_id = tenants.tenant_id().map(|tenant_id| tenant_id.as_i64());
        let action = filter.action.map(|action| action.as_str());
        let user_id = filter.user_id.map(|user_id| user_id.as_i64());
        let limit = i64::try_from(pagination.limit()).unwrap_or(i64::MAX);
        let offset = i64::try_from(pagination.offset()).unwrap_or(i64::MAX);

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT count(*)
            FROM audit_logs
            WHERE ($1::BIGINT IS NULL OR tenant_id = $1)
              AND ($2::TEXT IS NULL OR action = $2)
              AND ($3::BIGINT IS NULL OR user_id = $3)
              AND ($4::TEXT IS NULL OR resource_type = $4)
              AND ($5::TIMESTAMPTZ IS NULL OR created_at >= $5)
              AND ($6::TIMESTAMPTZ IS NULL OR created_at < $6)
            "#,
        )
        .bind(tenant_id)
        .bind(action)
        .bind(user_id)
        .bind(filter.resource_type.as_deref())
        .bind(filter.from)
        .bind(filter.to)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "failed to count audit log entries"))?;

        let rows = sqlx::query_as::<_, AuditLogRow>(
            r#"
            SELECT
                id,
                tenant_id,
                user_id,
                action,
                resource_type,
                resource_id,
                old_values,
                new_values,
                ip_address,
                user_agent,
                created_at
            FROM audit_logs
            WHERE ($1::BIGINT IS NULL OR tenant_id = $1)
              AND ($2::TEXT IS NULL OR action = $2)
              AND ($3::BIGINT IS NULL OR user_id = $3)
              AND ($4::TEXT IS NULL OR resource_type = $4)
              AND ($5::TIMESTAMPTZ IS NULL OR created_at >= $5)
              AND ($6::TIMESTAMPTZ IS NULL OR created_at < $6)
            ORDER BY created_at DESC, id DESC
            LIMIT $7
            OFFSET $8
            "#,
        )
        .bind(tenant_id)
        .bind(action)
        .bind(user_id)
        .bind(filter.resource_type.as_deref())
        .bind(filter.from)
        .bind(filter.to)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "failed to list audit log entries"))?;

        let entries = rows
            .into_iter()
            .map(AuditLogEntry::try_from)
            .collect::<AppResult<Vec<_>>>()?;
        let total = u64::try_from(total).map_err(|error| {
            AppError::Internal(format!("audit log count is invalid: {error}"))
        })?;

        Ok(AuditLogPage {
            entries,
            total,
            pagination,
        })
    }
}
