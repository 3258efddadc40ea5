use std::collections::BTreeSet;
use std::str::FromStr;

use corbel_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Permission category, partitioned by permission id range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionCategory {
    /// Hosting operator capabilities (ids 1-9).
    Platform,
    /// Company administration (ids 10-19).
    TenantAdmin,
    /// Project management (ids 20-29).
    ProjectManager,
    /// Subcontractor field work (ids 30-39).
    Subcontractor,
    /// Client visibility (ids 40-49).
    Client,
}

impl PermissionCategory {
    /// Returns a stable storage value for this category.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Platform => "platform",
            Self::TenantAdmin => "tenant_admin",
            Self::ProjectManager => "project_manager",
            Self::Subcontractor => "subcontractor",
            Self::Client => "client",
        }
    }

    /// Returns the category owning a permission id, if the id is in a known range.
    #[must_use]
    pub fn for_id(id: i16) -> Option<Self> {
        match id {
            1..=9 => Some(Self::Platform),
            10..=19 => Some(Self::TenantAdmin),
            20..=29 => Some(Self::ProjectManager),
            30..=39 => Some(Self::Subcontractor),
            40..=49 => Some(Self::Client),
            _ => None,
        }
    }

    /// Returns all categories in id order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[
            Self::Platform,
            Self::TenantAdmin,
            Self::ProjectManager,
            Self::Subcontractor,
            Self::Client,
        ]
    }
}

impl FromStr for PermissionCategory {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|category| category.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown permission category '{value}'")))
    }
}

macro_rules! permissions {
    ($(
        $(#[$doc:meta])*
        $variant:ident = $id:literal, $resource:literal, $action:literal, $elevated:literal;
    )+) => {
        /// Capabilities enforced by authorization checks.
        ///
        /// Ids never change meaning once seeded.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "i16", into = "i16")]
        pub enum Permission {
            $(
                $(#[$doc])*
                $variant,
            )+
        }

        impl Permission {
            /// Returns the immutable catalog id.
            #[must_use]
            pub fn id(&self) -> i16 {
                match self {
                    $(Self::$variant => $id,)+
                }
            }

            /// Resolves a catalog id.
            pub fn from_id(id: i16) -> AppResult<Self> {
                match id {
                    $($id => Ok(Self::$variant),)+
                    _ => Err(AppError::Validation(format!("unknown permission id '{id}'"))),
                }
            }

            /// Returns all known permissions ordered by id.
            #[must_use]
            pub fn all() -> &'static [Self] {
                &[$(Self::$variant,)+]
            }

            /// Returns the seeded descriptor for this permission.
            #[must_use]
            pub fn default_descriptor(&self) -> PermissionDescriptor {
                match self {
                    $(Self::$variant => PermissionDescriptor {
                        permission: Self::$variant,
                        name: stringify!($variant).to_owned(),
                        resource: $resource.to_owned(),
                        action: $action.to_owned(),
                        category: self.category(),
                        requires_elevation: $elevated,
                    },)+
                }
            }
        }
    };
}

permissions! {
    /// Full platform administration, including the cross-tenant bypass.
    SystemAdmin = 1, "platform", "admin", true;
    /// Provision and suspend tenants.
    TenantProvision = 2, "tenant", "provision", true;
    /// Read audit entries across tenants.
    PlatformAuditRead = 3, "platform_audit", "read", true;
    /// Operator support access.
    PlatformSupport = 4, "platform", "support", false;
    /// Manage company settings.
    CompanySettingsManage = 10, "company_settings", "manage", true;
    /// Create, update and deactivate roles and their assignments.
    RoleManage = 11, "role", "manage", true;
    /// Manage company users and memberships.
    UserManage = 12, "user", "manage", true;
    /// Read the tenant audit log.
    AuditLogRead = 13, "audit_log", "read", false;
    /// Manage billing.
    BillingManage = 14, "billing", "manage", true;
    /// Create projects.
    ProjectCreate = 15, "project", "create", false;
    /// Read projects.
    ProjectRead = 20, "project", "read", false;
    /// Update projects.
    ProjectUpdate = 21, "project", "update", false;
    /// Manage project tasks.
    TaskManage = 22, "task", "manage", false;
    /// Delete projects.
    ProjectDelete = 23, "project", "delete", true;
    /// Manage schedule changes.
    ScheduleManage = 24, "schedule", "manage", false;
    /// Manage project photos.
    PhotoManage = 25, "photo", "manage", false;
    /// Manage project membership.
    ProjectMemberManage = 26, "project_member", "manage", false;
    /// Read tasks assigned to the caller.
    AssignedTaskRead = 30, "assigned_task", "read", false;
    /// Update tasks assigned to the caller.
    AssignedTaskUpdate = 31, "assigned_task", "update", false;
    /// Upload photos.
    PhotoUpload = 32, "photo", "upload", false;
    /// Read schedules.
    ScheduleRead = 33, "schedule", "read", false;
    /// View project progress.
    ProjectProgressView = 40, "project_progress", "view", false;
    /// View photos.
    PhotoView = 41, "photo", "view", false;
    /// Approve schedule changes.
    ScheduleChangeApprove = 42, "schedule_change", "approve", false;
    /// Read notifications.
    NotificationRead = 43, "notification", "read", false;
}

impl Permission {
    /// Returns the category implied by the permission id.
    #[must_use]
    pub fn category(&self) -> PermissionCategory {
        match self.id() {
            1..=9 => PermissionCategory::Platform,
            10..=19 => PermissionCategory::TenantAdmin,
            20..=29 => PermissionCategory::ProjectManager,
            30..=39 => PermissionCategory::Subcontractor,
            _ => PermissionCategory::Client,
        }
    }

    /// Returns whether the permission belongs to the platform category.
    #[must_use]
    pub fn is_platform(&self) -> bool {
        self.category() == PermissionCategory::Platform
    }

    /// Parses a transport value, either a numeric id or a `resource.action` key.
    pub fn from_transport(value: &str) -> AppResult<Self> {
        Self::from_str(value)
    }

    /// Returns the stable `resource.action` key.
    #[must_use]
    pub fn key(&self) -> String {
        let descriptor = self.default_descriptor();
        format!("{}.{}", descriptor.resource, descriptor.action)
    }

    /// Parses a list of transport ids into a set, rejecting unknown ids.
    pub fn parse_ids(ids: &[i16]) -> AppResult<BTreeSet<Self>> {
        ids.iter().map(|id| Self::from_id(*id)).collect()
    }
}

impl TryFrom<i16> for Permission {
    type Error = AppError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Self::from_id(value)
    }
}

impl From<Permission> for i16 {
    fn from(value: Permission) -> Self {
        value.id()
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if let Ok(id) = trimmed.parse::<i16>() {
            return Self::from_id(id);
        }

        Self::all()
            .iter()
            .copied()
            .find(|permission| permission.key() == trimmed)
            .ok_or_else(|| AppError::Validation(format!("unknown permission value '{value}'")))
    }
}

/// Catalog metadata for one permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDescriptor {
    /// Catalog permission.
    pub permission: Permission,
    /// Display name.
    pub name: String,
    /// Guarded resource.
    pub resource: String,
    /// Guarded action.
    pub action: String,
    /// Category; must match the id partition.
    pub category: PermissionCategory,
    /// Denials of this permission are always audited.
    pub requires_elevation: bool,
}

impl PermissionDescriptor {
    /// Validates a registration payload against the closed permission set.
    pub fn new(
        id: i16,
        name: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
        category: PermissionCategory,
        requires_elevation: bool,
    ) -> AppResult<Self> {
        let permission = Permission::from_id(id)?;
        if permission.category() != category {
            return Err(AppError::Validation(format!(
                "permission id '{id}' belongs to category '{}', not '{}'",
                permission.category().as_str(),
                category.as_str()
            )));
        }

        let name = name.into();
        let resource = resource.into();
        let action = action.into();
        for (field, value) in [("name", &name), ("resource", &resource), ("action", &action)] {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!(
                    "permission {field} must not be empty"
                )));
            }
        }

        Ok(Self {
            permission,
            name,
            resource,
            action,
            category,
            requires_elevation,
        })
    }
}
