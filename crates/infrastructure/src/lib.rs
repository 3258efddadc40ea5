//! Infrastructure adapters for access-control ports.

#![forbid(unsafe_code)]

mod in_memory_access_store;
mod in_memory_effective_permission_cache;
mod postgres_assignment_repository;
mod postgres_audit_log_repository;
mod postgres_audit_repository;
mod postgres_catalog_repository;
mod postgres_effective_permission_cache;
mod postgres_role_repository;
mod postgres_support;
mod postgres_tenant_repository;
mod redis_effective_permission_cache;

#[cfg(test)]
mod postgres_test_support;

pub use in_memory_access_store::InMemoryAccessStore;
pub use in_memory_effective_permission_cache::InMemoryEffectivePermissionCache;
pub use postgres_assignment_repository::PostgresAssignmentRepository;
pub use postgres_audit_log_repository::PostgresAuditLogRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_catalog_repository::PostgresCatalogRepository;
pub use postgres_effective_permission_cache::PostgresEffectivePermissionCache;
pub use postgres_role_repository::PostgresRoleRepository;
pub use postgres_tenant_repository::PostgresTenantRepository;
pub use redis_effective_permission_cache::RedisEffectivePermissionCache;
