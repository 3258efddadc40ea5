use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use corbel_application::{AuditEvent, AuditLogEntry, AuditRepository};
use corbel_core::{AppError, AppResult, TenantId, UserId};
use corbel_domain::AuditAction;
use serde_json::Value;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::postgres_support::map_sqlx_error;

/// PostgreSQL-backed append-only audit repository.
#[derive(Clone)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PostgresAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<AuditLogEntry> {
        let mut connection = self
            .pool
            .acquire()
            .await
            .map_err(|error| map_sqlx_error(error, "failed to acquire audit connection"))?;

        insert_audit_event(&mut connection, event).await
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct AuditLogRow {
    pub(crate) id: Uuid,
    pub(crate) tenant_id: i64,
    pub(crate) user_id: i64,
    pub(crate) action: String,
    pub(crate) resource_type: String,
    pub(crate) resource_id: Option<String>,
    pub(crate) old_values: Option<Value>,
    pub(crate) new_values: Option<Value>,
    pub(crate) ip_address: Option<String>,
    pub(crate) user_agent: Option<String>,
    pub(crate) created_at: DateTime<Utc>,
}

impl TryFrom<AuditLogRow> for AuditLogEntry {
    type Error = AppError;

    fn try_from(row: AuditLogRow) -> Result<Self, Self::Error> {
        let action = AuditAction::from_str(row.action.as_str()).map_err(|error| {
            AppError::Internal(format!("stored audit action is invalid: {error}"))
        })?;

        Ok(Self {
            entry_id: row.id.to_string(),
            tenant_id: TenantId::new(row.tenant_id),
            user_id: UserId::new(row.user_id),
            action,
            resource_type: row.resource_type,
            resource_id: row.resource_id,
            old_values: row.old_values,
            new_values: row.new_values,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            created_at: row.created_at,
        })
    }
}

/// Appends one audit row on an existing connection or transaction.
pub(crate) async fn insert_audit_event(
    connection: &mut PgConnection,
    event: AuditEvent,
) -> AppResult<AuditLogEntry> {
    let row = sqlx::query_as::<_, AuditLogRow>(
        r#"
        INSERT INTO audit_logs (
            id,
            tenant_id,
            user_id,
            action,
            resource_type,
            resource_id,
            old_values,
            new_values,
            ip_address,
            user_agent
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING
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
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(event.tenant_id.as_i64())
    .bind(event.user_id.as_i64())
    .bind(event.action.as_str())
    .bind(event.resource_type)
    .bind(event.resource_id)
    .bind(event.old_values)
    .bind(event.new_values)
    .bind(event.request.ip_address)
    .bind(event.request.user_agent)
    .fetch_one(connection)
    .await
    .map_err(|error| map_sqlx_error(error, "failed to append audit event"))?;

    AuditLogEntry::try_from(row)
}
