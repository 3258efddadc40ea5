use std::collections::BTreeSet;

use chrono::{Duration, Utc};
use corbel_application::{AssignmentQuery, AssignmentRepository, RoleRepository};
use corbel_core::{AppError, NonEmptyString, TenantId, UserId};
use corbel_domain::{
    AuditAction, NewProjectAssignment, NewRole, NewRoleAssignment, Permission, ProjectId, RoleId,
};

use super::PostgresAssignmentRepository;
use crate::PostgresRoleRepository;
use crate::postgres_test_support::{ACTOR, audit, fresh_tenant, test_pool};

const WORKER: UserId = UserId::new(1);

async fn create_role(
    pool: &sqlx::PgPool,
    tenant_id: TenantId,
    permissions: &[Permission],
) -> RoleId {
    let repository = PostgresRoleRepository::new(pool.clone());
    let role = repository
        .create_role(
            tenant_id,
            NewRole {
                name: NonEmptyString::new(format!("Role {}", uuid::Uuid::new_v4()))
                    .unwrap_or_else(|_| unreachable!()),
                description: None,
                template_id: None,
                custom_permissions: permissions.iter().copied().collect(),
            },
            audit(tenant_id, AuditAction::RoleCreated, "role"),
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    role.role_id
}

fn assignment(role_id: RoleId, expires_in: Option<Duration>) -> NewRoleAssignment {
    let now = Utc::now();
    NewRoleAssignment::new(
        WORKER,
        role_id,
        ACTOR,
        expires_in.map(|duration| now + duration),
        now,
    )
    .unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn duplicate_active_assignments_conflict_until_revoked() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAssignmentRepository::new(pool.clone());
    let tenant_id = fresh_tenant(&pool, &[WORKER]).await;
    let role_id = create_role(&pool, tenant_id, &[Permission::ProjectRead]).await;

    let first = repository
        .create_role_assignment(
            tenant_id,
            assignment(role_id, None),
            audit(tenant_id, AuditAction::RoleAssigned, "role_assignment"),
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    let duplicate = repository
        .create_role_assignment(
            tenant_id,
            assignment(role_id, None),
            audit(tenant_id, AuditAction::RoleAssigned, "role_assignment"),
        )
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    let revoked = repository
        .revoke_role_assignment(
            tenant_id,
            first.assignment_id,
            ACTOR,
            audit(tenant_id, AuditAction::RoleAssignmentRevoked, "role_assignment"),
        )
        .await;
    assert!(matches!(revoked, Ok(ref assignment) if !assignment.is_active));

    let again = repository
        .revoke_role_assignment(
            tenant_id,
            first.assignment_id,
            ACTOR,
            audit(tenant_id, AuditAction::RoleAssignmentRevoked, "role_assignment"),
        )
        .await;
    assert!(matches!(again, Err(AppError::NotFound(_))));

    assert!(
        repository
            .create_role_assignment(
                tenant_id,
                assignment(role_id, None),
                audit(tenant_id, AuditAction::RoleAssigned, "role_assignment"),
            )
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn grants_exclude_revoked_expired_and_inactive_roles() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAssignmentRepository::new(pool.clone());
    let roles = PostgresRoleRepository::new(pool.clone());
    let tenant_id = fresh_tenant(&pool, &[WORKER]).await;
    let live = create_role(&pool, tenant_id, &[Permission::ProjectRead]).await;
    let expiring = create_role(&pool, tenant_id, &[Permission::TaskManage]).await;
    let deactivated = create_role(&pool, tenant_id, &[Permission::PhotoManage]).await;

    for role_id in [live, deactivated] {
        assert!(
            repository
                .create_role_assignment(
                    tenant_id,
                    assignment(role_id, None),
                    audit(tenant_id, AuditAction::RoleAssigned, "role_assignment"),
                )
                .await
                .is_ok()
        );
    }
    assert!(
        repository
            .create_role_assignment(
                tenant_id,
                assignment(expiring, Some(Duration::seconds(1))),
                audit(tenant_id, AuditAction::RoleAssigned, "role_assignment"),
            )
            .await
            .is_ok()
    );
    assert!(
        roles
            .deactivate_role(
                tenant_id,
                deactivated,
                audit(tenant_id, AuditAction::RoleDeactivated, "role"),
            )
            .await
            .is_ok()
    );

    tokio::time::sleep(std::time::Duration::from_millis(1_200)).await;

    let grants = repository
        .list_active_role_grants(tenant_id, WORKER)
        .await
        .unwrap_or_default();
    assert_eq!(
        grants.iter().map(|grant| grant.role_id).collect::<Vec<_>>(),
        vec![live]
    );

    let listed = repository
        .list_role_assignments(
            tenant_id,
            AssignmentQuery {
                user_id: Some(WORKER),
                ..AssignmentQuery::default()
            },
        )
        .await
        .unwrap_or_default();
    assert_eq!(listed.len(), 2);

    let everything = repository
        .list_role_assignments(
            tenant_id,
            AssignmentQuery {
                include_inactive: true,
                ..AssignmentQuery::default()
            },
        )
        .await
        .unwrap_or_default();
    assert_eq!(everything.len(), 3);

    assert!(
        repository
            .create_role_assignment(
                tenant_id,
                assignment(expiring, None),
                audit(tenant_id, AuditAction::RoleAssigned, "role_assignment"),
            )
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn project_grants_stay_on_their_project() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAssignmentRepository::new(pool.clone());
    let tenant_id = fresh_tenant(&pool, &[WORKER]).await;
    let role_id = create_role(&pool, tenant_id, &[Permission::AssignedTaskRead]).await;
    let now = Utc::now();

    let created = repository
        .create_project_assignment(
            tenant_id,
            NewProjectAssignment::new(
                ProjectId::new(7),
                WORKER,
                role_id,
                BTreeSet::from([Permission::PhotoUpload]),
                ACTOR,
                None,
                now,
            )
            .unwrap_or_else(|_| unreachable!()),
            audit(tenant_id, AuditAction::ProjectRoleAssigned, "project_assignment"),
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    let on_project = repository
        .list_active_project_grants(tenant_id, WORKER, ProjectId::new(7))
        .await
        .unwrap_or_default();
    assert_eq!(on_project.len(), 1);
    assert_eq!(on_project[0].assignment_id, created.assignment_id);
    assert!(on_project[0].permission_overrides.contains(&Permission::PhotoUpload));

    let elsewhere = repository
        .list_active_project_grants(tenant_id, WORKER, ProjectId::new(8))
        .await
        .unwrap_or_default();
    assert!(elsewhere.is_empty());

    assert_eq!(
        repository
            .list_role_holders(tenant_id, role_id)
            .await
            .unwrap_or_default(),
        vec![WORKER]
    );
}

#[tokio::test]
async fn assignments_require_membership() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAssignmentRepository::new(pool.clone());
    let tenant_id = fresh_tenant(&pool, &[]).await;
    let role_id = create_role(&pool, tenant_id, &[Permission::ProjectRead]).await;

    let result = repository
        .create_role_assignment(
            tenant_id,
            assignment(role_id, None),
            audit(tenant_id, AuditAction::RoleAssigned, "role_assignment"),
        )
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}
