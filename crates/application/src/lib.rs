//! Application services and ports for tenant-isolated authorization.

#![forbid(unsafe_code)]

mod access_ports;
mod assignment_service;
mod audit_service;
mod authorization_service;
mod catalog_service;
mod permission_resolver;
mod role_service;
mod tenant_admin_service;
mod tenant_guard;

#[cfg(test)]
mod test_fakes;

pub use access_ports::{
    ActiveProjectGrant, ActiveRoleGrant, AssignmentQuery, AssignmentRepository, AuditEvent,
    AuditLogEntry, AuditLogFilter, AuditLogPage, AuditLogRepository, AuditRepository,
    CreateTenantInput, EffectivePermissionCache, EffectivePermissions, Pagination,
    PermissionCatalogRepository, RoleRepository, TenantFilter, TenantRepository,
};
pub use assignment_service::{AssignProjectRoleInput, AssignRoleInput, AssignmentService};
pub use audit_service::AuditService;
pub use authorization_service::AuthorizationService;
pub use catalog_service::{CatalogSeedSummary, PermissionCatalogService};
pub use permission_resolver::{EffectivePermissionResolver, ResolverConfig};
pub use role_service::{CreateRoleInput, RoleService, UpdateRoleInput};
pub use tenant_admin_service::TenantAdminService;
pub use tenant_guard::{PlatformBypass, TenantIsolationGuard, TenantScope};
