use super::*;

#[derive(Debug, FromRow)]
struct RoleGrantRow {
    role_id: i64,
    template_permissions: Vec<i16>,
    custom_permissions: Vec<i16>,
}

#[derive(Debug, FromRow)]
struct ProjectGrantRow {
    assignment_id: i64,
    role_id: i64,
    template_permissions: Vec<i16>,
    custom_permissions: Vec<i16>,
    permission_overrides: Vec<i16>,
}

impl PostgresAssignmentRepository {
    pub(super) async fn list_active_role_grants_impl(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Vec<ActiveRoleGrant>> {
        let rows = sqlx::query_as::<_, RoleGrantRow>(
            r#"
            SELECT
                roles.id AS role_id,
                COALESCE(templates.permissions, '{}'::SMALLINT[]) AS template_permissions,
                roles.custom_permissions
            FROM tenant_role_assignments AS assignments
            INNER JOIN roles
                ON roles.tenant_id = assignments.tenant_id
               AND roles.id = assignments.role_id
            LEFT JOIN role_templates AS templates
                ON templates.id = roles.template_id
            WHERE assignments.tenant_id = $1
              AND assignments.user_id = $2
              AND assignments.is_active
              AND (assignments.expires_at IS NULL OR assignments.expires_at > now())
              AND roles.is_active
            ORDER BY roles.id
            "#,
        )
        .bind(tenant_id.as_i64())
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            map_sqlx_error(
                error,
                &format!("failed to load role grants for user '{user_id}' in tenant '{tenant_id}'"),
            )
        })?;

        rows.into_iter()
            .map(|row| {
                Ok(ActiveRoleGrant {
                    role_id: RoleId::new(row.role_id),
                    template_permissions: decode_permissions(&row.template_permissions)?,
                    custom_permissions: decode_permissions(&row.custom_permissions)?,
                })
            })
            .collect()
    }

    pub(super) async fn list_active_project_grants_impl(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        project_id: ProjectId,
    ) -> AppResult<Vec<ActiveProjectGrant>> {
        let rows = sqlx::query_as::<_, ProjectGrantRow>(
            r#"
            SELECT
                assignments.id AS assignment_id,
                roles.id AS role_id,
                COALESCE(templates.permissions, '{}'::SMALLINT[]) AS template_permissions,
                roles.custom_permissions,
                assignments.permission_overrides
            FROM project_assignments AS assignments
            INNER JOIN roles
                ON roles.tenant_id = assignments.tenant_id
               AND roles.id = assignments.role_id
            LEFT JOIN role_templates AS templates
                ON templates.id = roles.template_id
            WHERE assignments.tenant_id = $1
              AND assignments.user_id = $2
              AND assignments.project_id = $3
              AND assignments.is_active
              AND (assignments.expires_at IS NULL OR assignments.expires_at > now())
              AND roles.is_active
            ORDER BY assignments.id
            "#,
        )
        .bind(tenant_id.as_i64())
        .bind(user_id.as_i64())
        .bind(project_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            map_sqlx_error(
                error,
                &format!(
                    "failed to load project grants for user '{user_id}' on project '{project_id}'"
                ),
            )
        })?;

        rows.into_iter()
            .map(|row| {
                Ok(ActiveProjectGrant {
                    assignment_id: ProjectAssignmentId::new(row.assignment_id),
                    role_id: RoleId::new(row.role_id),
                    template_permissions: decode_permissions(&row.template_permissions)?,
                    custom_permissions: decode_permissions(&row.custom_permissions)?,
                    permission_overrides: decode_permissions(&row.permission_overrides)?,
                })
            })
            .collect()
    }

    pub(super) async fn list_role_holders_impl(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
    ) -> AppResult<Vec<UserId>> {
        let user_ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT user_id
            FROM tenant_role_assignments
            WHERE tenant_id = $1 AND role_id = $2 AND is_active
            UNION
            SELECT user_id
            FROM project_assignments
            WHERE tenant_id = $1 AND role_id = $2 AND is_active
            ORDER BY user_id
            "#,
        )
        .bind(tenant_id.as_i64())
        .bind(role_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "failed to list role holders"))?;

        Ok(user_ids.into_iter().map(UserId::new).collect())
    }
}
