use std::str::FromStr;

use async_trait::async_trait;
use corbel_application::PermissionCatalogRepository;
use corbel_core::{AppError, AppResult};
use corbel_domain::{
    Permission, PermissionCategory, PermissionDescriptor, RoleTemplate, RoleTemplateDefinition,
    TemplateId,
};
use sqlx::{FromRow, PgPool};

use crate::postgres_support::{decode_permissions, encode_permissions, map_sqlx_error};

/// PostgreSQL-backed permission catalog and role template repository.
#[derive(Clone)]
pub struct PostgresCatalogRepository {
    pool: PgPool,
}

impl PostgresCatalogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    id: i16,
    name: String,
    resource: String,
    action: String,
    category: String,
    requires_elevation: bool,
}

impl TryFrom<PermissionRow> for PermissionDescriptor {
    type Error = AppError;

    fn try_from(row: PermissionRow) -> Result<Self, Self::Error> {
        let category = parse_category(row.category.as_str())?;
        PermissionDescriptor::new(
            row.id,
            row.name,
            row.resource,
            row.action,
            category,
            row.requires_elevation,
        )
        .map_err(|error| AppError::Internal(format!("stored permission is invalid: {error}")))
    }
}

#[derive(Debug, FromRow)]
struct RoleTemplateRow {
    id: i64,
    name: String,
    category: String,
    permissions: Vec<i16>,
    is_system_template: bool,
}

impl TryFrom<RoleTemplateRow> for RoleTemplate {
    type Error = AppError;

    fn try_from(row: RoleTemplateRow) -> Result<Self, Self::Error> {
        Ok(Self {
            template_id: TemplateId::new(row.id),
            name: row.name,
            category: parse_category(row.category.as_str())?,
            permissions: decode_permissions(&row.permissions)?,
            is_system_template: row.is_system_template,
        })
    }
}

fn parse_category(value: &str) -> AppResult<PermissionCategory> {
    PermissionCategory::from_str(value).map_err(|error| {
        AppError::Internal(format!("stored permission category is invalid: {error}"))
    })
}

#[async_trait]
impl PermissionCatalogRepository for PostgresCatalogRepository {
    async fn upsert_permission(
        &self,
        descriptor: PermissionDescriptor,
    ) -> AppResult<PermissionDescriptor> {
        sqlx::query(
            r#"
            INSERT INTO permissions (id, name, resource, action, category, requires_elevation)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                resource = EXCLUDED.resource,
                action = EXCLUDED.action,
                category = EXCLUDED.category,
                requires_elevation = EXCLUDED.requires_elevation
            "#,
        )
        .bind(descriptor.permission.id())
        .bind(descriptor.name.as_str())
        .bind(descriptor.resource.as_str())
        .bind(descriptor.action.as_str())
        .bind(descriptor.category.as_str())
        .bind(descriptor.requires_elevation)
        .execute(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "failed to save permission descriptor"))?;

        Ok(descriptor)
    }

    async fn list_permissions(
        &self,
        category: Option<PermissionCategory>,
    ) -> AppResult<Vec<PermissionDescriptor>> {
        sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, name, resource, action, category, requires_elevation
            FROM permissions
            WHERE ($1::TEXT IS NULL OR category = $1)
            ORDER BY id
            "#,
        )
        .bind(category.map(|category| category.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "failed to list permissions"))?
        .into_iter()
        .map(PermissionDescriptor::try_from)
        .collect()
    }

    async fn find_permission(
        &self,
        permission: Permission,
    ) -> AppResult<Option<PermissionDescriptor>> {
        sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, name, resource, action, category, requires_elevation
            FROM permissions
            WHERE id = $1
            "#,
        )
        .bind(permission.id())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "failed to find permission"))?
        .map(PermissionDescriptor::try_from)
        .transpose()
    }

    async fn upsert_role_template(
        &self,
        definition: RoleTemplateDefinition,
    ) -> AppResult<RoleTemplate> {
        let row = sqlx::query_as::<_, RoleTemplateRow>(
            r#"
            INSERT INTO role_templates (name, category, permissions, is_system_template)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO UPDATE
            SET category = EXCLUDED.category,
                permissions = EXCLUDED.permissions,
                is_system_template = EXCLUDED.is_system_template,
                updated_at = now()
            RETURNING id, name, category, permissions, is_system_template
            "#,
        )
        .bind(definition.name.as_str())
        .bind(definition.category.as_str())
        .bind(encode_permissions(&definition.permissions))
        .bind(definition.is_system_template)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "failed to save role template"))?;

        RoleTemplate::try_from(row)
    }

    async fn list_role_templates(
        &self,
        category: Option<PermissionCategory>,
    ) -> AppResult<Vec<RoleTemplate>> {
        sqlx::query_as::<_, RoleTemplateRow>(
            r#"
            SELECT id, name, category, permissions, is_system_template
            FROM role_templates
            WHERE ($1::TEXT IS NULL OR category = $1)
            ORDER BY id
            "#,
        )
        .bind(category.map(|category| category.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "failed to list role templates"))?
        .into_iter()
        .map(RoleTemplate::try_from)
        .collect()
    }

    async fn find_role_template(
        &self,
        template_id: TemplateId,
    ) -> AppResult<Option<RoleTemplate>> {
        sqlx::query_as::<_, RoleTemplateRow>(
            r#"
            SELECT id, name, category, permissions, is_system_template
            FROM role_templates
            WHERE id = $1
            "#,
        )
        .bind(template_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "failed to find role template"))?
        .map(RoleTemplate::try_from)
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use corbel_application::PermissionCatalogRepository;
    use corbel_domain::{Permission, PermissionCategory, RoleTemplateDefinition};

    use super::PostgresCatalogRepository;
    use crate::postgres_test_support::test_pool;

    #[tokio::test]
    async fn descriptors_and_templates_upsert_idempotently() {
        let Some(pool) = test_pool().await else {
            return;
        };

        let repository = PostgresCatalogRepository::new(pool);
        for _ in 0..2 {
            for permission in Permission::all() {
                let saved = repository
                    .upsert_permission(permission.default_descriptor())
                    .await;
                assert!(saved.is_ok());
            }
        }

        let platform = repository
            .list_permissions(Some(PermissionCategory::Platform))
            .await
            .unwrap_or_default();
        assert!(
            platform
                .iter()
                .all(|descriptor| descriptor.permission.is_platform())
        );
        assert!(matches!(
            repository.find_permission(Permission::SystemAdmin).await,
            Ok(Some(descriptor)) if descriptor.requires_elevation
        ));

        let name = format!("Site Lead {}", uuid::Uuid::new_v4());
        let first = repository
            .upsert_role_template(
                RoleTemplateDefinition::new(
                    name.as_str(),
                    PermissionCategory::ProjectManager,
                    [Permission::ProjectRead],
                    false,
                )
                .unwrap_or_else(|_| unreachable!()),
            )
            .await
            .unwrap_or_else(|_| unreachable!());
        let second = repository
            .upsert_role_template(
                RoleTemplateDefinition::new(
                    name.as_str(),
                    PermissionCategory::ProjectManager,
                    [Permission::ProjectRead, Permission::TaskManage],
                    false,
                )
                .unwrap_or_else(|_| unreachable!()),
            )
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(first.template_id, second.template_id);
        let stored = repository
            .find_role_template(first.template_id)
            .await
            .unwrap_or_default()
            .map(|template| template.permissions.len());
        assert_eq!(stored, Some(2));
    }
}
