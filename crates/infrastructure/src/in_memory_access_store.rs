use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use corbel_application::{AuditEvent, AuditLogEntry};
use corbel_core::{AppError, AppResult, TenantId, UserId};
use corbel_domain::{
    AssignmentId, Permission, PermissionDescriptor, ProjectAssignment, ProjectAssignmentId, Role,
    RoleAssignment, RoleId, RoleTemplate, TemplateId, Tenant, TenantStatus,
};
use serde_json::json;
use tokio::sync::RwLock;
use uuid::Uuid;

mod assignments;
mod audit;
mod catalog;
mod roles;
mod tenants;


/// In-memory implementation of every access-control storage port.
///
/// Each mutation and its audit entry are applied under one write lock, so
/// readers never observe a change without its audit row.
#[derive(Debug)]
pub struct InMemoryAccessStore {
    state: RwLock<AccessState>,
}

#[derive(Debug)]
struct AccessState {
    next_id: i64,
    tenants: BTreeMap<TenantId, Tenant>,
    memberships: BTreeSet<(TenantId, UserId)>,
    permissions: BTreeMap<Permission, PermissionDescriptor>,
    templates: BTreeMap<TemplateId, RoleTemplate>,
    roles: BTreeMap<RoleId, Role>,
    assignments: BTreeMap<AssignmentId, RoleAssignment>,
    project_assignments: BTreeMap<ProjectAssignmentId, ProjectAssignment>,
    audit_log: Vec<AuditLogEntry>,
}

impl InMemoryAccessStore {
    /// Creates a store holding only the reserved platform tenant.
    #[must_use]
    pub fn new() -> Self {
        let platform = Tenant {
            tenant_id: TenantId::PLATFORM,
            name: "Platform".to_owned(),
            status: TenantStatus::Active,
            settings: json!({}),
        };

        Self {
            state: RwLock::new(AccessState {
                next_id: 1,
                tenants: BTreeMap::from([(TenantId::PLATFORM, platform)]),
                memberships: BTreeSet::new(),
                permissions: BTreeMap::new(),
                templates: BTreeMap::new(),
                roles: BTreeMap::new(),
                assignments: BTreeMap::new(),
                project_assignments: BTreeMap::new(),
                audit_log: Vec::new(),
            }),
        }
    }
}

impl Default for InMemoryAccessStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessState {
    fn next_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn ensure_tenant(&self, tenant_id: TenantId) -> AppResult<()> {
        if self.tenants.contains_key(&tenant_id) {
            return Ok(());
        }

        Err(AppError::NotFound(format!(
            "tenant '{tenant_id}' does not exist"
        )))
    }

    fn ensure_member(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<()> {
        if self.memberships.contains(&(tenant_id, user_id)) {
            return Ok(());
        }

        Err(AppError::NotFound(format!(
            "user '{user_id}' is not a member of tenant '{tenant_id}'"
        )))
    }

    fn tenant_role(&self, tenant_id: TenantId, role_id: RoleId) -> Option<&Role> {
        self.roles
            .get(&role_id)
            .filter(|role| role.tenant_id == tenant_id)
    }

    fn template_permissions(&self, template_id: Option<TemplateId>) -> BTreeSet<Permission> {
        template_id
            .and_then(|template_id| self.templates.get(&template_id))
            .map(|template| template.permissions.clone())
            .unwrap_or_default()
    }

    /// Validates an audit event against the stored tenants without appending it.
    fn check_audit(&self, event: &AuditEvent) -> AppResult<()> {
        self.ensure_tenant(event.tenant_id)
    }

    fn append_audit(&mut self, event: AuditEvent) -> AuditLogEntry {
        let entry = AuditLogEntry {
            entry_id: Uuid::new_v4().to_string(),
            tenant_id: event.tenant_id,
            user_id: event.user_id,
            action: event.action,
            resource_type: event.resource_type,
            resource_id: event.resource_id,
            old_values: event.old_values,
            new_values: event.new_values,
            ip_address: event.request.ip_address,
            user_agent: event.request.user_agent,
            created_at: Utc::now(),
        };
        self.audit_log.push(entry.clone());
        entry
    }
}
