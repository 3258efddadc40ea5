use async_trait::async_trait;
use chrono::{DateTime, Utc};
use corbel_application::{AuditEvent, RoleRepository};
use corbel_core::{AppError, AppResult, TenantId};
use corbel_domain::{NewRole, Role, RoleId, RoleUpdate, TemplateId};
use sqlx::{FromRow, PgConnection, PgPool};

use crate::postgres_audit_repository::insert_audit_event;
use crate::postgres_support::{
    begin, commit, decode_permissions, encode_permissions, map_sqlx_error,
};

/// PostgreSQL-backed tenant role repository.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: i64,
    tenant_id: i64,
    name: String,
    description: Option<String>,
    template_id: Option<i64>,
    custom_permissions: Vec<i16>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RoleRow> for Role {
    type Error = AppError;

    fn try_from(row: RoleRow) -> Result<Self, Self::Error> {
        Ok(Self {
            role_id: RoleId::new(row.id),
            tenant_id: TenantId::new(row.tenant_id),
            name: row.name,
            description: row.description,
            template_id: row.template_id.map(TemplateId::new),
            custom_permissions: decode_permissions(&row.custom_permissions)?,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn duplicate_name(error: sqlx::Error, name: &str) -> AppError {
    match map_sqlx_error(error, "failed to save role") {
        AppError::Conflict(_) => AppError::Conflict(format!("role '{name}' already exists")),
        other => other,
    }
}

async fn lock_role(
    connection: &mut PgConnection,
    tenant_id: TenantId,
    role_id: RoleId,
) -> AppResult<Role> {
    let row = sqlx::query_as::<_, RoleRow>(
        r#"
        SELECT
            id,
            tenant_id,
            name,
            description,
            template_id,
            custom_permissions,
            is_active,
            created_at,
            updated_at
        FROM roles
        WHERE tenant_id = $1 AND id = $2
        FOR UPDATE
        "#,
    )
    .bind(tenant_id.as_i64())
    .bind(role_id.as_i64())
    .fetch_optional(connection)
    .await
    .map_err(|error| map_sqlx_error(error, "failed to load role"))?
    .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;

    Role::try_from(row)
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn create_role(
        &self,
        tenant_id: TenantId,
        role: NewRole,
        audit: AuditEvent,
    ) -> AppResult<Role> {
        let mut transaction = begin(&self.pool).await?;

        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            INSERT INTO roles (tenant_id, name, description, template_id, custom_permissions)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING
                id,
                tenant_id,
                name,
                description,
                template_id,
                custom_permissions,
                is_active,
                created_at,
                updated_at
            "#,
        )
        .bind(tenant_id.as_i64())
        .bind(role.name.as_str())
        .bind(role.description.as_deref())
        .bind(role.template_id.map(|template_id| template_id.as_i64()))
        .bind(encode_permissions(&role.custom_permissions))
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| duplicate_name(error, role.name.as_str()))?;
        let created = Role::try_from(row)?;

        insert_audit_event(
            &mut transaction,
            audit.stamp_resource_id(created.role_id.to_string()),
        )
        .await?;
        commit(transaction).await?;

        Ok(created)
    }

    async fn find_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT
                id,
                tenant_id,
                name,
                description,
                template_id,
                custom_permissions,
                is_active,
                created_at,
                updated_at
            FROM roles
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_i64())
        .bind(role_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "failed to find role"))?
        .map(Role::try_from)
        .transpose()
    }

    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<Role>> {
        sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT
                id,
                tenant_id,
                name,
                description,
                template_id,
                custom_permissions,
                is_active,
                created_at,
                updated_at
            FROM roles
            WHERE tenant_id = $1
            ORDER BY name
            "#,
        )
        .bind(tenant_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "failed to list roles"))?
        .into_iter()
        .map(Role::try_from)
        .collect()
    }

    async fn update_role(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
        update: RoleUpdate,
        audit: AuditEvent,
    ) -> AppResult<Role> {
        let mut transaction = begin(&self.pool).await?;

        let mut role = lock_role(&mut transaction, tenant_id, role_id).await?;
        role.apply_update(&update, Utc::now());

        sqlx::query(
            r#"
            UPDATE roles
            SET name = $3,
                description = $4,
                custom_permissions = $5,
                updated_at = $6
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_i64())
        .bind(role_id.as_i64())
        .bind(role.name.as_str())
        .bind(role.description.as_deref())
        .bind(encode_permissions(&role.custom_permissions))
        .bind(role.updated_at)
        .execute(&mut *transaction)
        .await
        .map_err(|error| duplicate_name(error, role.name.as_str()))?;

        insert_audit_event(&mut transaction, audit).await?;
        commit(transaction).await?;

        Ok(role)
    }

    async fn deactivate_role(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
        audit: AuditEvent,
    ) -> AppResult<Role> {
        let mut transaction = begin(&self.pool).await?;

        let mut role = lock_role(&mut transaction, tenant_id, role_id).await?;
        role.is_active = false;
        role.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE roles
            SET is_active = false, updated_at = $3
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_i64())
        .bind(role_id.as_i64())
        .bind(role.updated_at)
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_sqlx_error(error, "failed to deactivate role"))?;

        insert_audit_event(&mut transaction, audit).await?;
        commit(transaction).await?;

        Ok(role)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use corbel_application::RoleRepository;
    use corbel_core::{AppError, NonEmptyString, TenantId};
    use corbel_domain::{AuditAction, NewRole, Permission, RoleUpdate};

    use super::PostgresRoleRepository;
    use crate::postgres_test_support::{audit, fresh_tenant, test_pool};

    fn new_role(name: &str) -> NewRole {
        NewRole {
            name: NonEmptyString::new(name).unwrap_or_else(|_| unreachable!()),
            description: None,
            template_id: None,
            custom_permissions: BTreeSet::from([Permission::ProjectRead]),
        }
    }

    fn role_event(tenant_id: TenantId, action: AuditAction) -> corbel_application::AuditEvent {
        audit(tenant_id, action, "role")
    }

    #[tokio::test]
    async fn roles_are_tenant_scoped_and_uniquely_named() {
        let Some(pool) = test_pool().await else {
            return;
        };

        let repository = PostgresRoleRepository::new(pool.clone());
        let tenant_a = fresh_tenant(&pool, &[]).await;
        let tenant_b = fresh_tenant(&pool, &[]).await;

        let created = repository
            .create_role(
                tenant_a,
                new_role("Foreman"),
                role_event(tenant_a, AuditAction::RoleCreated),
            )
            .await
            .unwrap_or_else(|_| unreachable!());

        let duplicate = repository
            .create_role(
                tenant_a,
                new_role("Foreman"),
                role_event(tenant_a, AuditAction::RoleCreated),
            )
            .await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));

        assert!(
            repository
                .create_role(
                    tenant_b,
                    new_role("Foreman"),
                    role_event(tenant_b, AuditAction::RoleCreated),
                )
                .await
                .is_ok()
        );

        assert!(matches!(
            repository.find_role(tenant_b, created.role_id).await,
            Ok(None)
        ));
        assert!(matches!(
            repository
                .update_role(
                    tenant_b,
                    created.role_id,
                    RoleUpdate::default(),
                    role_event(tenant_b, AuditAction::RoleUpdated),
                )
                .await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn updates_and_deactivation_are_audited_atomically() {
        let Some(pool) = test_pool().await else {
            return;
        };

        let repository = PostgresRoleRepository::new(pool.clone());
        let tenant_id = fresh_tenant(&pool, &[]).await;
        let created = repository
            .create_role(
                tenant_id,
                new_role("Inspector"),
                role_event(tenant_id, AuditAction::RoleCreated),
            )
            .await
            .unwrap_or_else(|_| unreachable!());

        let updated = repository
            .update_role(
                tenant_id,
                created.role_id,
                RoleUpdate {
                    custom_permissions: Some(BTreeSet::from([
                        Permission::ProjectRead,
                        Permission::PhotoView,
                    ])),
                    ..RoleUpdate::default()
                },
                role_event(tenant_id, AuditAction::RoleUpdated)
                    .with_resource_id(created.role_id.to_string()),
            )
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(updated.custom_permissions.len(), 2);

        let deactivated = repository
            .deactivate_role(
                tenant_id,
                created.role_id,
                role_event(tenant_id, AuditAction::RoleDeactivated)
                    .with_resource_id(created.role_id.to_string()),
            )
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(!deactivated.is_active);

        let entries = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT count(*)
            FROM audit_logs
            WHERE tenant_id = $1 AND resource_type = 'role' AND resource_id = $2
            "#,
        )
        .bind(tenant_id.as_i64())
        .bind(created.role_id.to_string())
        .fetch_one(&pool)
        .await
        .unwrap_or_default();
        assert_eq!(entries, 3);
    }
}
