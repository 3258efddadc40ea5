use std::str::FromStr;

use async_trait::async_trait;
use corbel_application::{AuditEvent, CreateTenantInput, PlatformBypass, TenantRepository};
use corbel_core::{AppError, AppResult, TenantId, UserId};
use corbel_domain::{Tenant, TenantStatus};
use serde_json::Value;
use sqlx::{FromRow, PgPool};

use crate::postgres_audit_repository::insert_audit_event;
use crate::postgres_support::{begin, commit, map_sqlx_error};

/// PostgreSQL-backed tenant and membership repository.
#[derive(Clone)]
pub struct PostgresTenantRepository {
    pool: PgPool,
}

impl PostgresTenantRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct TenantRow {
    id: i64,
    name: String,
    status: String,
    settings: Value,
}

impl TryFrom<TenantRow> for Tenant {
    type Error = AppError;

    fn try_from(row: TenantRow) -> Result<Self, Self::Error> {
        let status = TenantStatus::from_str(row.status.as_str()).map_err(|error| {
            AppError::Internal(format!("stored tenant status is invalid: {error}"))
        })?;

        Ok(Self {
            tenant_id: TenantId::new(row.id),
            name: row.name,
            status,
            settings: row.settings,
        })
    }
}

#[async_trait]
impl TenantRepository for PostgresTenantRepository {
    async fn find_tenant(&self, tenant_id: TenantId) -> AppResult<Option<Tenant>> {
        sqlx::query_as::<_, TenantRow>(
            r#"
            SELECT id, name, status, settings
            FROM tenants
            WHERE id = $1
            "#,
        )
        .bind(tenant_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "failed to find tenant"))?
        .map(Tenant::try_from)
        .transpose()
    }

    async fn is_member(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM tenant_memberships
                WHERE tenant_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(tenant_id.as_i64())
        .bind(user_id.as_i64())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "failed to resolve tenant membership"))
    }

    async fn add_member(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        audit: AuditEvent,
    ) -> AppResult<()> {
        let mut transaction = begin(&self.pool).await?;

        sqlx::query(
            r#"
            INSERT INTO tenant_memberships (tenant_id, user_id)
            VALUES ($1, $2)
            "#,
        )
        .bind(tenant_id.as_i64())
        .bind(user_id.as_i64())
        .execute(&mut *transaction)
        .await
        .map_err(|error| match map_sqlx_error(error, "failed to add tenant member") {
            AppError::Conflict(_) => AppError::Conflict(format!(
                "user '{user_id}' is already a member of tenant '{tenant_id}'"
            )),
            other => other,
        })?;

        insert_audit_event(&mut transaction, audit).await?;
        commit(transaction).await
    }

    async fn create_tenant(
        &self,
        input: CreateTenantInput,
        audit: AuditEvent,
    ) -> AppResult<Tenant> {
        let mut transaction = begin(&self.pool).await?;

        let row = sqlx::query_as::<_, TenantRow>(
            r#"
            INSERT INTO tenants (name, status, settings)
            VALUES ($1, 'active', $2)
            RETURNING id, name, status, settings
            "#,
        )
        .bind(input.name.as_str())
        .bind(input.settings)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| map_sqlx_error(error, "failed to create tenant"))?;
        let tenant = Tenant::try_from(row)?;

        insert_audit_event(
            &mut transaction,
            audit.stamp_resource_id(tenant.tenant_id.to_string()),
        )
        .await?;
        commit(transaction).await?;

        Ok(tenant)
    }

    async fn list_tenants(&self, _bypass: &PlatformBypass) -> AppResult<Vec<Tenant>> {
        sqlx::query_as::<_, TenantRow>(
            r#"
            SELECT id, name, status, settings
            FROM tenants
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "failed to list tenants"))?
        .into_iter()
        .map(Tenant::try_from)
        .collect()
    }

    async fn set_tenant_status(
        &self,
        tenant_id: TenantId,
        status: TenantStatus,
        audit: AuditEvent,
    ) -> AppResult<Tenant> {
        let mut transaction = begin(&self.pool).await?;

        let row = sqlx::query_as::<_, TenantRow>(
            r#"
            UPDATE tenants
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, name, status, settings
            "#,
        )
        .bind(tenant_id.as_i64())
        .bind(status.as_str())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| map_sqlx_error(error, "failed to change tenant status"))?
        .ok_or_else(|| AppError::NotFound(format!("tenant '{tenant_id}' does not exist")))?;
        let tenant = Tenant::try_from(row)?;

        insert_audit_event(&mut transaction, audit).await?;
        commit(transaction).await?;

        Ok(tenant)
    }
}
