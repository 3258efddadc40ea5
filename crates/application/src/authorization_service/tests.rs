use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use corbel_core::{AppError, Principal, TenantId, UserId};
use corbel_domain::{AuditAction, Permission, TenantStatus};

use crate::test_fakes::{FakeStore, authorization_service};

const TENANT: TenantId = TenantId::new(1);

async fn tenant_with_member(permissions: &[Permission]) -> (Arc<FakeStore>, Principal) {
    let store = Arc::new(FakeStore::default());
    store.seed_tenant(TENANT, TenantStatus::Active).await;
    store.seed_grant(TENANT, UserId::new(10), permissions).await;
    (store, Principal::new(UserId::new(10), TENANT))
}

#[tokio::test]
async fn check_permission_grants_held_permissions() {
    let (store, principal) = tenant_with_member(&[Permission::ProjectRead]).await;
    let service = authorization_service(&store);

    let allowed = service
        .check_permission(&principal, &[Permission::ProjectRead], true)
        .await;
    assert!(matches!(allowed, Ok(true)));

    let denied = service
        .check_permission(&principal, &[Permission::TaskManage], true)
        .await;
    assert!(matches!(denied, Ok(false)));
}

#[tokio::test]
async fn unavailable_store_denies_instead_of_failing() {
    let (store, principal) = tenant_with_member(&[Permission::ProjectRead]).await;
    store.fail_grant_reads.store(true, Ordering::SeqCst);
    let service = authorization_service(&store);

    let result = service
        .check_permission(&principal, &[Permission::ProjectRead], true)
        .await;
    assert!(matches!(result, Ok(false)));
}

#[tokio::test]
async fn cache_read_failure_denies() {
    let (store, principal) = tenant_with_member(&[Permission::ProjectRead]).await;
    store.fail_cache_reads.store(true, Ordering::SeqCst);
    let service = authorization_service(&store);

    let result = service
        .check_permission(&principal, &[Permission::ProjectRead], true)
        .await;
    assert!(matches!(result, Ok(false)));
    assert_eq!(store.grant_reads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn require_permission_surfaces_store_faults() {
    let (store, principal) = tenant_with_member(&[Permission::RoleManage]).await;
    let service = authorization_service(&store);
    let scope = service
        .scope(&principal)
        .await
        .unwrap_or_else(|_| unreachable!());
    store.fail_grant_reads.store(true, Ordering::SeqCst);

    let result = service
        .require_permission(&scope, Permission::RoleManage)
        .await;
    assert!(matches!(result, Err(AppError::Unavailable(_))));
}

#[tokio::test]
async fn missing_tenant_is_refused_before_resolution() {
    let (store, _) = tenant_with_member(&[Permission::ProjectRead]).await;
    let service = authorization_service(&store);

    let result = service
        .check_permission(
            &Principal::without_tenant(UserId::new(10)),
            &[Permission::ProjectRead],
            true,
        )
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert_eq!(store.grant_reads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn elevated_denials_are_audited() {
    let (store, principal) = tenant_with_member(&[Permission::ProjectRead]).await;
    let service = authorization_service(&store);

    let denied = service
        .check_permission(&principal, &[Permission::ProjectDelete], true)
        .await;
    assert!(matches!(denied, Ok(false)));

    let entries = store.audit_entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, AuditAction::ElevatedPermissionDenied);
    assert_eq!(entries[0].tenant_id, TENANT);
    assert_eq!(entries[0].resource_id.as_deref(), Some("23"));
}

#[tokio::test]
async fn ordinary_denials_are_not_audited() {
    let (store, principal) = tenant_with_member(&[Permission::ProjectRead]).await;
    let service = authorization_service(&store);

    let denied = service
        .check_permission(&principal, &[Permission::TaskManage], true)
        .await;
    assert!(matches!(denied, Ok(false)));
    assert!(store.audit_entries().await.is_empty());
}

#[tokio::test]
async fn failed_denial_audit_still_denies() {
    let (store, principal) = tenant_with_member(&[Permission::ProjectRead]).await;
    store.fail_audit_appends.store(true, Ordering::SeqCst);
    let service = authorization_service(&store);

    let denied = service
        .check_permission(&principal, &[Permission::BillingManage], true)
        .await;
    assert!(matches!(denied, Ok(false)));
}

#[tokio::test]
async fn platform_bypass_requires_platform_tenant_and_system_admin() {
    let store = Arc::new(FakeStore::default());
    store
        .seed_tenant(TenantId::PLATFORM, TenantStatus::Active)
        .await;
    store.seed_tenant(TENANT, TenantStatus::Active).await;
    store
        .seed_grant(TenantId::PLATFORM, UserId::new(1), &[Permission::SystemAdmin])
        .await;
    store
        .seed_grant(TenantId::PLATFORM, UserId::new(2), &[Permission::PlatformSupport])
        .await;
    store
        .seed_grant(TENANT, UserId::new(3), &[Permission::RoleManage])
        .await;
    let service = authorization_service(&store);

    let admin = service
        .platform_bypass(&Principal::new(UserId::new(1), TenantId::PLATFORM))
        .await;
    assert!(admin.is_ok());

    let support = service
        .platform_bypass(&Principal::new(UserId::new(2), TenantId::PLATFORM))
        .await;
    assert!(matches!(support, Err(AppError::Forbidden(_))));

    let tenant_admin = service
        .platform_bypass(&Principal::new(UserId::new(3), TENANT))
        .await;
    assert!(matches!(tenant_admin, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn bypass_reads_are_recorded_in_the_platform_tenant() {
    let store = Arc::new(FakeStore::default());
    store
        .seed_tenant(TenantId::PLATFORM, TenantStatus::Active)
        .await;
    store
        .seed_grant(TenantId::PLATFORM, UserId::new(1), &[Permission::SystemAdmin])
        .await;
    let service = authorization_service(&store);
    let bypass = service
        .platform_bypass(&Principal::new(UserId::new(1), TenantId::PLATFORM))
        .await
        .unwrap_or_else(|_| unreachable!());

    let recorded = service
        .record_bypass_read(&bypass, "audit_log", Some(TENANT))
        .await;
    assert!(recorded.is_ok());

    let entries = store.audit_entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, AuditAction::PlatformBypassRead);
    assert_eq!(entries[0].tenant_id, TenantId::PLATFORM);
    assert_eq!(entries[0].resource_id.as_deref(), Some("1"));
}

#[tokio::test]
async fn effective_permissions_reports_contributing_roles() {
    let (store, principal) =
        tenant_with_member(&[Permission::ProjectRead, Permission::PhotoView]).await;
    let service = authorization_service(&store);

    let effective = service
        .effective_permissions(&principal)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(
        effective.permissions,
        BTreeSet::from([Permission::ProjectRead, Permission::PhotoView])
    );
    assert_eq!(effective.role_ids.len(), 1);
}

#[tokio::test]
async fn platform_reads_of_foreign_permissions_are_recorded_first() {
    let (store, principal) = tenant_with_member(&[Permission::ProjectRead]).await;
    store
        .seed_tenant(TenantId::PLATFORM, TenantStatus::Active)
        .await;
    store
        .seed_grant(TenantId::PLATFORM, UserId::new(1), &[Permission::SystemAdmin])
        .await;
    let service = authorization_service(&store);
    let operator = Principal::new(UserId::new(1), TenantId::PLATFORM);

    let effective = service
        .platform_effective_permissions(&operator, TENANT, principal.user_id())
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(effective.tenant_id, TENANT);
    assert!(effective.permissions.contains(&Permission::ProjectRead));
    assert!(
        store
            .audit_actions()
            .await
            .contains(&AuditAction::PlatformBypassRead)
    );

    store.fail_audit_appends.store(true, Ordering::SeqCst);
    let refused = service
        .platform_effective_permissions(&operator, TENANT, principal.user_id())
        .await;
    assert!(matches!(refused, Err(AppError::Unavailable(_))));
}
