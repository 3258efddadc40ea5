//! Domain entities and invariants for multi-tenant access control.

#![forbid(unsafe_code)]

mod assignment;
mod audit;
mod ids;
mod permission;
mod role;
mod template;
mod tenant;

pub use assignment::{
    AssignmentState, NewProjectAssignment, NewRoleAssignment, ProjectAssignment, RoleAssignment,
};
pub use audit::AuditAction;
pub use ids::{AssignmentId, ProjectAssignmentId, ProjectId, RoleId, TemplateId};
pub use permission::{Permission, PermissionCategory, PermissionDescriptor};
pub use role::{NewRole, Role, RoleUpdate, contributed_permissions, ensure_tenant_may_hold};
pub use template::{RoleTemplate, RoleTemplateDefinition};
pub use tenant::{Tenant, TenantStatus};
