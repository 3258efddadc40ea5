use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use corbel_core::{AppError, AppResult, NonEmptyString, TenantId};
use serde::{Deserialize, Serialize};

use crate::ids::{RoleId, TemplateId};
use crate::permission::Permission;

/// Tenant-owned role built from an optional template plus additive custom permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Stable role identifier.
    pub role_id: RoleId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Unique role name in tenant scope.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Template the role was instantiated from.
    pub template_id: Option<TemplateId>,
    /// Permissions added on top of the template.
    pub custom_permissions: BTreeSet<Permission>,
    /// Soft-deactivation marker.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Validated payload for role creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRole {
    /// Unique role name in tenant scope.
    pub name: NonEmptyString,
    /// Optional description.
    pub description: Option<String>,
    /// Template the role is instantiated from.
    pub template_id: Option<TemplateId>,
    /// Permissions added on top of the template.
    pub custom_permissions: BTreeSet<Permission>,
}

/// Allow-listed role fields that may change after creation.
///
/// `None` leaves a field untouched. Custom permissions are replaced as a
/// whole set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleUpdate {
    /// New role name.
    pub name: Option<NonEmptyString>,
    /// New description; `Some(None)` clears it.
    pub description: Option<Option<String>>,
    /// Replacement custom permission set.
    pub custom_permissions: Option<BTreeSet<Permission>>,
}

impl RoleUpdate {
    /// Returns whether the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.custom_permissions.is_none()
    }
}

impl Role {
    /// Applies an allow-listed update in place.
    pub fn apply_update(&mut self, update: &RoleUpdate, updated_at: DateTime<Utc>) {
        if let Some(name) = &update.name {
            self.name = name.as_str().to_owned();
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        if let Some(custom_permissions) = &update.custom_permissions {
            self.custom_permissions = custom_permissions.clone();
        }
        self.updated_at = updated_at;
    }
}

/// Returns the permissions a role contributes: template bundle union custom set.
#[must_use]
pub fn contributed_permissions(
    template_permissions: &BTreeSet<Permission>,
    custom_permissions: &BTreeSet<Permission>,
) -> BTreeSet<Permission> {
    template_permissions
        .union(custom_permissions)
        .copied()
        .collect()
}

/// Rejects platform-category permissions for any tenant but the platform tenant.
pub fn ensure_tenant_may_hold(
    tenant_id: TenantId,
    permissions: &BTreeSet<Permission>,
) -> AppResult<()> {
    if tenant_id.is_platform() {
        return Ok(());
    }

    let platform_ids = permissions
        .iter()
        .filter(|permission| permission.is_platform())
        .map(|permission| permission.id().to_string())
        .collect::<Vec<_>>();

    if platform_ids.is_empty() {
        return Ok(());
    }

    Err(AppError::Forbidden(format!(
        "tenant '{tenant_id}' may not hold platform permissions [{}]",
        platform_ids.join(", ")
    )))
}
