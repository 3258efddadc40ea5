use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use corbel_core::{AppError, AppResult, TenantId, UserId};
use serde::{Deserialize, Serialize};

use crate::ids::{AssignmentId, ProjectAssignmentId, ProjectId, RoleId};
use crate::permission::Permission;

/// Lifecycle state of an assignment at a point in time.
///
/// `Expired` is derived from `expires_at` at read time and never stored;
/// `Revoked` is terminal. Nothing transitions back to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentState {
    /// Contributes permissions.
    Active,
    /// Past its expiry; inert.
    Expired,
    /// Explicitly revoked; inert.
    Revoked,
}

impl AssignmentState {
    /// Returns a stable transport value for this state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
        }
    }

    fn derive(is_active: bool, expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        if !is_active {
            return Self::Revoked;
        }

        match expires_at {
            Some(expires_at) if expires_at <= now => Self::Expired,
            _ => Self::Active,
        }
    }
}

/// Tenant-scope binding of a user to a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Stable assignment identifier.
    pub assignment_id: AssignmentId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Assigned user.
    pub user_id: UserId,
    /// Granted role.
    pub role_id: RoleId,
    /// Granting user.
    pub granted_by: UserId,
    /// Grant timestamp.
    pub granted_at: DateTime<Utc>,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// False once revoked.
    pub is_active: bool,
    /// Revoking user.
    pub revoked_by: Option<UserId>,
    /// Revocation timestamp.
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RoleAssignment {
    /// Returns the assignment state at `now`.
    #[must_use]
    pub fn state_at(&self, now: DateTime<Utc>) -> AssignmentState {
        AssignmentState::derive(self.is_active, self.expires_at, now)
    }
}

/// Project-scope grant layered on top of tenant assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectAssignment {
    /// Stable assignment identifier.
    pub assignment_id: ProjectAssignmentId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Project the grant is limited to.
    pub project_id: ProjectId,
    /// Assigned user.
    pub user_id: UserId,
    /// Granted role.
    pub role_id: RoleId,
    /// Additional permissions granted only within the project.
    pub permission_overrides: BTreeSet<Permission>,
    /// Granting user.
    pub granted_by: UserId,
    /// Grant timestamp.
    pub granted_at: DateTime<Utc>,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// False once revoked.
    pub is_active: bool,
    /// Revoking user.
    pub revoked_by: Option<UserId>,
    /// Revocation timestamp.
    pub revoked_at: Option<DateTime<Utc>>,
}

impl ProjectAssignment {
    /// Returns the assignment state at `now`.
    #[must_use]
    pub fn state_at(&self, now: DateTime<Utc>) -> AssignmentState {
        AssignmentState::derive(self.is_active, self.expires_at, now)
    }
}

/// Validated payload for a tenant-scope assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoleAssignment {
    /// Assigned user.
    pub user_id: UserId,
    /// Granted role.
    pub role_id: RoleId,
    /// Granting user.
    pub granted_by: UserId,
    /// Optional expiry, always in the future at validation time.
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewRoleAssignment {
    /// Validates an assignment payload against the current time.
    pub fn new(
        user_id: UserId,
        role_id: RoleId,
        granted_by: UserId,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        ensure_future_expiry(expires_at, now)?;
        Ok(Self {
            user_id,
            role_id,
            granted_by,
            expires_at,
        })
    }
}

/// Validated payload for a project-scope assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProjectAssignment {
    /// Project the grant is limited to.
    pub project_id: ProjectId,
    /// Assigned user.
    pub user_id: UserId,
    /// Granted role.
    pub role_id: RoleId,
    /// Additional permissions granted only within the project.
    pub permission_overrides: BTreeSet<Permission>,
    /// Granting user.
    pub granted_by: UserId,
    /// Optional expiry, always in the future at validation time.
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewProjectAssignment {
    /// Validates a project assignment payload against the current time.
    pub fn new(
        project_id: ProjectId,
        user_id: UserId,
        role_id: RoleId,
        permission_overrides: BTreeSet<Permission>,
        granted_by: UserId,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        ensure_future_expiry(expires_at, now)?;
        Ok(Self {
            project_id,
            user_id,
            role_id,
            permission_overrides,
            granted_by,
            expires_at,
        })
    }
}

fn ensure_future_expiry(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> AppResult<()> {
    match expires_at {
        Some(expires_at) if expires_at <= now => Err(AppError::Validation(format!(
            "expires_at '{}' must be in the future",
            expires_at.to_rfc3339()
        ))),
        _ => Ok(()),
    }
}
