use corbel_application::{AuditEvent, CreateTenantInput, TenantRepository};
use corbel_core::{NonEmptyString, RequestMetadata, TenantId, UserId};
use corbel_domain::AuditAction;
use serde_json::json;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use crate::PostgresTenantRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub(crate) const ACTOR: UserId = UserId::new(9_000);

/// Connects to `DATABASE_URL` and migrates, or skips when it is unset.
pub(crate) async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres tests: {error}");
    }

    Some(pool)
}

pub(crate) fn audit(tenant_id: TenantId, action: AuditAction, resource_type: &str) -> AuditEvent {
    AuditEvent::new(
        tenant_id,
        ACTOR,
        action,
        resource_type,
        RequestMetadata::default(),
    )
}

/// Provisions a fresh tenant with the given members.
pub(crate) async fn fresh_tenant(pool: &PgPool, members: &[UserId]) -> TenantId {
    let repository = PostgresTenantRepository::new(pool.clone());
    let name = match NonEmptyString::new(format!("Tenant {}", uuid::Uuid::new_v4())) {
        Ok(name) => name,
        Err(error) => panic!("failed to build tenant name: {error}"),
    };

    let tenant = match repository
        .create_tenant(
            CreateTenantInput {
                name,
                settings: json!({}),
            },
            audit(TenantId::PLATFORM, AuditAction::TenantCreated, "tenant"),
        )
        .await
    {
        Ok(tenant) => tenant,
        Err(error) => panic!("failed to create test tenant: {error}"),
    };

    for user_id in members {
        let added = repository
            .add_member(
                tenant.tenant_id,
                *user_id,
                audit(tenant.tenant_id, AuditAction::TenantMemberAdded, "tenant_member"),
            )
            .await;
        assert!(added.is_ok());
    }

    tenant.tenant_id
}
