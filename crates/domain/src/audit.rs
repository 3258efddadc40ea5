use std::str::FromStr;

use corbel_core::AppError;
use serde::{Deserialize, Serialize};

/// Stable audit actions emitted by authorization use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A tenant role was created.
    RoleCreated,
    /// A tenant role was updated.
    RoleUpdated,
    /// A tenant role was deactivated.
    RoleDeactivated,
    /// A role was assigned at tenant scope.
    RoleAssigned,
    /// A tenant-scope assignment was revoked.
    RoleAssignmentRevoked,
    /// A role was assigned at project scope.
    ProjectRoleAssigned,
    /// A project-scope assignment was revoked.
    ProjectAssignmentRevoked,
    /// A platform principal read rows of another tenant.
    PlatformBypassRead,
    /// A check against an elevated permission was denied.
    ElevatedPermissionDenied,
    /// A tenant was created through the platform bypass.
    TenantCreated,
    /// A tenant status changed through the platform bypass.
    TenantStatusChanged,
    /// A user was added to a tenant.
    TenantMemberAdded,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleCreated => "security.role.created",
            Self::RoleUpdated => "security.role.updated",
            Self::RoleDeactivated => "security.role.deactivated",
            Self::RoleAssigned => "security.role.assigned",
            Self::RoleAssignmentRevoked => "security.role.assignment_revoked",
            Self::ProjectRoleAssigned => "security.project_role.assigned",
            Self::ProjectAssignmentRevoked => "security.project_role.assignment_revoked",
            Self::PlatformBypassRead => "platform.bypass_read",
            Self::ElevatedPermissionDenied => "security.elevated_permission.denied",
            Self::TenantCreated => "platform.tenant.created",
            Self::TenantStatusChanged => "platform.tenant.status_changed",
            Self::TenantMemberAdded => "tenant.member.added",
        }
    }

    /// Returns all actions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[
            Self::RoleCreated,
            Self::RoleUpdated,
            Self::RoleDeactivated,
            Self::RoleAssigned,
            Self::RoleAssignmentRevoked,
            Self::ProjectRoleAssigned,
            Self::ProjectAssignmentRevoked,
            Self::PlatformBypassRead,
            Self::ElevatedPermissionDenied,
            Self::TenantCreated,
            Self::TenantStatusChanged,
            Self::TenantMemberAdded,
        ]
    }
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|action| action.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown audit action '{value}'")))
    }
}
