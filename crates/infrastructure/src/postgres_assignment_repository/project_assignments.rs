use super::*;

impl PostgresAssignmentRepository {
    pub(super) async fn create_project_assignment_impl(
        &self,
        tenant_id: TenantId,
        assignment: NewProjectAssignment,
        audit: AuditEvent,
    ) -> AppResult<ProjectAssignment> {
        let mut transaction = begin(&self.pool).await?;

        sqlx::query(
            r#"
            UPDATE project_assignments
            SET is_active = false, revoked_at = expires_at
            WHERE tenant_id = $1
              AND project_id = $2
              AND user_id = $3
              AND role_id = $4
              AND is_active
              AND expires_at <= now()
            "#,
        )
        .bind(tenant_id.as_i64())
        .bind(assignment.project_id.as_i64())
        .bind(assignment.user_id.as_i64())
        .bind(assignment.role_id.as_i64())
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_sqlx_error(error, "failed to retire expired project assignment"))?;

        let row = sqlx::query_as::<_, ProjectAssignmentRow>(
            r#"
            INSERT INTO project_assignments (
                tenant_id,
                project_id,
                user_id,
                role_id,
                permission_overrides,
                granted_by,
                expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING
                id,
                tenant_id,
                project_id,
                user_id,
                role_id,
                permission_overrides,
                granted_by,
                granted_at,
                expires_at,
                is_active,
                revoked_by,
                revoked_at
            "#,
        )
        .bind(tenant_id.as_i64())
        .bind(assignment.project_id.as_i64())
        .bind(assignment.user_id.as_i64())
        .bind(assignment.role_id.as_i64())
        .bind(encode_permissions(&assignment.permission_overrides))
        .bind(assignment.granted_by.as_i64())
        .bind(assignment.expires_at)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| duplicate_assignment(error, "failed to create project assignment"))?;
        let created = ProjectAssignment::try_from(row)?;

        insert_audit_event(
            &mut transaction,
            audit.stamp_resource_id(created.assignment_id.to_string()),
        )
        .await?;
        commit(transaction).await?;

        Ok(created)
    }

    pub(super) async fn revoke_project_assignment_impl(
        &self,
        tenant_id: TenantId,
        assignment_id: ProjectAssignmentId,
        revoked_by: UserId,
        audit: AuditEvent,
    ) -> AppResult<ProjectAssignment> {
        let mut transaction = begin(&self.pool).await?;

        let row = sqlx::query_as::<_, ProjectAssignmentRow>(
            r#"
            UPDATE project_assignments
            SET is_active = false, revoked_by = $3, revoked_at = now()
            WHERE tenant_id = $1 AND id = $2 AND is_active
            RETURNING
                id,
                tenant_id,
                project_id,
                user_id,
                role_id,
                permission_overrides,
                granted_by,
                granted_at,
                expires_at,
                is_active,
                revoked_by,
                revoked_at
            "#,
        )
        .bind(tenant_id.as_i64())
        .bind(assignment_id.as_i64())
        .bind(revoked_by.as_i64())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| map_sqlx_error(error, "failed to revoke project assignment"))?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "active project assignment '{assignment_id}' does not exist"
            ))
        })?;
        let revoked = ProjectAssignment::try_from(row)?;

        insert_audit_event(&mut transaction, audit).await?;
        commit(transaction).await?;

        Ok(revoked)
    }

    pub(super) async fn list_project_assignments_impl(
        &self,
        tenant_id: TenantId,
        query: AssignmentQuery,
    ) -> AppResult<Vec<ProjectAssignment>> {
        sqlx::query_as::<_, ProjectAssignmentRow>(
            r#"
            SELECT
                id,
                tenant_id,
                project_id,
                user_id,
                role_id,
                permission_overrides,
                granted_by,
                granted_at,
                expires_at,
                is_active,
                revoked_by,
                revoked_at
            FROM project_assignments
            WHERE tenant_id = $1
              AND ($2::BIGINT IS NULL OR user_id = $2)
              AND ($3::BIGINT IS NULL OR project_id = $3)
              AND (
                  $4
                  OR (is_active AND (expires_at IS NULL OR expires_at > now()))
              )
            ORDER BY granted_at DESC, id DESC
            "#,
        )
        .bind(tenant_id.as_i64())
        .bind(query.user_id.map(|user_id| user_id.as_i64()))
        .bind(query.project_id.map(|project_id| project_id.as_i64()))
        .bind(query.include_inactive)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "failed to list project assignments"))?
        .into_iter()
        .map(ProjectAssignment::try_from)
        .collect()
    }
}
