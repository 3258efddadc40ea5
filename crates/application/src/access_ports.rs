mod assignments;
mod audit;
mod cache;
mod catalog;
mod roles;
mod tenants;

pub use assignments::{
    ActiveProjectGrant, ActiveRoleGrant, AssignmentQuery, AssignmentRepository,
};
pub use audit::{
    AuditEvent, AuditLogEntry, AuditLogFilter, AuditLogPage, AuditLogRepository, AuditRepository,
    Pagination, TenantFilter,
};
pub(crate) use cache::grants;
pub use cache::{EffectivePermissionCache, EffectivePermissions};
pub use catalog::PermissionCatalogRepository;
pub use roles::RoleRepository;
pub use tenants::{CreateTenantInput, TenantRepository};
