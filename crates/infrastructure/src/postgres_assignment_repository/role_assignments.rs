use super::*;

impl PostgresAssignmentRepository {
    pub(super) async fn create_role_assignment_impl(
        &self,
        tenant_id: TenantId,
        assignment: NewRoleAssignment,
        audit: AuditEvent,
    ) -> AppResult<RoleAssignment> {
        let mut transaction = begin(&self.pool).await?;

        sqlx::query(
            r#"
            UPDATE tenant_role_assignments
            SET is_active = false, revoked_at = expires_at
            WHERE tenant_id = $1
              AND user_id = $2
              AND role_id = $3
              AND is_active
              AND expires_at <= now()
            "#,
        )
        .bind(tenant_id.as_i64())
        .bind(assignment.user_id.as_i64())
        .bind(assignment.role_id.as_i64())
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_sqlx_error(error, "failed to retire expired assignment"))?;

        let row = sqlx::query_as::<_, RoleAssignmentRow>(
            r#"
            INSERT INTO tenant_role_assignments (
                tenant_id,
                user_id,
                role_id,
                granted_by,
                expires_at
            )
            VALUES ($1, $2, $3, $4, $5)
            RETURNING
                id,
                tenant_id,
                user_id,
                role_id,
                granted_by,
                granted_at,
                expires_at,
                is_active,
                revoked_by,
                revoked_at
            "#,
        )
        .bind(tenant_id.as_i64())
        .bind(assignment.user_id.as_i64())
        .bind(assignment.role_id.as_i64())
        .bind(assignment.granted_by.as_i64())
        .bind(assignment.expires_at)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| duplicate_assignment(error, "failed to create role assignment"))?;
        let created = RoleAssignment::from(row);

        insert_audit_event(
            &mut transaction,
            audit.stamp_resource_id(created.assignment_id.to_string()),
        )
        .await?;
        commit(transaction).await?;

        Ok(created)
    }

    pub(super) async fn revoke_role_assignment_impl(
        &self,
        tenant_id: TenantId,
        assignment_id: AssignmentId,
        revoked_by: UserId,
        audit: AuditEvent,
    ) -> AppResult<RoleAssignment> {
        let mut transaction = begin(&self.pool).await?;

        let row = sqlx::query_as::<_, RoleAssignmentRow>(
            r#"
            UPDATE tenant_role_assignments
            SET is_active = false, revoked_by = $3, revoked_at = now()
            WHERE tenant_id = $1 AND id = $2 AND is_active
            RETURNING
                id,
                tenant_id,
                user_id,
                role_id,
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
        .map_err(|error| map_sqlx_error(error, "failed to revoke role assignment"))?
        .ok_or_else(|| {
            AppError::NotFound(format!("active assignment '{assignment_id}' does not exist"))
        })?;

        insert_audit_event(&mut transaction, audit).await?;
        commit(transaction).await?;

        Ok(RoleAssignment::from(row))
    }

    pub(super) async fn list_role_assignments_impl(
        &self,
        tenant_id: TenantId,
        query: AssignmentQuery,
    ) -> AppResult<Vec<RoleAssignment>> {
        let rows = sqlx::query_as::<_, RoleAssignmentRow>(
            r#"
            SELECT
                id,
                tenant_id,
                user_id,
                role_id,
                granted_by,
                granted_at,
                expires_at,
                is_active,
                revoked_by,
                revoked_at
            FROM tenant_role_assignments
            WHERE tenant_id = $1
              AND ($2::BIGINT IS NULL OR user_id = $2)
              AND (
                  $3
                  OR (is_active AND (expires_at IS NULL OR expires_at > now()))
              )
            ORDER BY granted_at DESC, id DESC
            "#,
        )
        .bind(tenant_id.as_i64())
        .bind(query.user_id.map(|user_id| user_id.as_i64()))
        .bind(query.include_inactive)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "failed to list role assignments"))?;

        Ok(rows.into_iter().map(RoleAssignment::from).collect())
    }
}
