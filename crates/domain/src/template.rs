use std::collections::BTreeSet;

use corbel_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::ids::TemplateId;
use crate::permission::{Permission, PermissionCategory};

/// Tenant-independent named bundle of permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleTemplate {
    /// Stable template identifier.
    pub template_id: TemplateId,
    /// Unique template name.
    pub name: String,
    /// Primary category of the bundle.
    pub category: PermissionCategory,
    /// Bundled permissions.
    pub permissions: BTreeSet<Permission>,
    /// Seeded by the platform rather than registered later.
    pub is_system_template: bool,
}

/// Registration payload for a role template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleTemplateDefinition {
    /// Unique template name.
    pub name: NonEmptyString,
    /// Primary category of the bundle.
    pub category: PermissionCategory,
    /// Bundled permissions.
    pub permissions: BTreeSet<Permission>,
    /// Seeded by the platform rather than registered later.
    pub is_system_template: bool,
}

impl RoleTemplateDefinition {
    /// Validates a template registration payload.
    pub fn new(
        name: impl Into<String>,
        category: PermissionCategory,
        permissions: impl IntoIterator<Item = Permission>,
        is_system_template: bool,
    ) -> AppResult<Self> {
        let permissions = permissions.into_iter().collect::<BTreeSet<_>>();
        if permissions.is_empty() {
            return Err(AppError::Validation(
                "role template must bundle at least one permission".to_owned(),
            ));
        }

        let grants_platform = permissions.iter().any(Permission::is_platform);
        if grants_platform && category != PermissionCategory::Platform {
            return Err(AppError::Validation(
                "only platform templates may bundle platform permissions".to_owned(),
            ));
        }

        Ok(Self {
            name: NonEmptyString::new(name)?,
            category,
            permissions,
            is_system_template,
        })
    }

    /// Returns the templates seeded at bootstrap.
    #[must_use]
    pub fn system_defaults() -> Vec<Self> {
        use Permission::*;

        let seeds: [(&str, PermissionCategory, &[Permission]); 5] = [
            (
                "Platform Administrator",
                PermissionCategory::Platform,
                &[SystemAdmin, TenantProvision, PlatformAuditRead, PlatformSupport],
            ),
            (
                "Company Administrator",
                PermissionCategory::TenantAdmin,
                &[
                    CompanySettingsManage,
                    RoleManage,
                    UserManage,
                    AuditLogRead,
                    BillingManage,
                    ProjectCreate,
                ],
            ),
            (
                "Project Manager",
                PermissionCategory::ProjectManager,
                &[ProjectRead, ProjectUpdate, TaskManage, ScheduleManage, PhotoManage],
            ),
            (
                "Subcontractor",
                PermissionCategory::Subcontractor,
                &[AssignedTaskRead, AssignedTaskUpdate, PhotoUpload, ScheduleRead],
            ),
            (
                "Client",
                PermissionCategory::Client,
                &[ProjectProgressView, PhotoView, ScheduleChangeApprove, NotificationRead],
            ),
        ];

        seeds
            .into_iter()
            .filter_map(|(name, category, permissions)| {
                Self::new(name, category, permissions.iter().copied(), true).ok()
            })
            .collect()
    }
}

impl RoleTemplate {
    /// Returns whether the bundle includes any platform-category permission.
    #[must_use]
    pub fn grants_platform_permissions(&self) -> bool {
        self.permissions.iter().any(Permission::is_platform)
    }
}
