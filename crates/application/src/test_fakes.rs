use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use corbel_core::{AppError, AppResult, TenantId, UserId};
use corbel_domain::{
    AssignmentId, AuditAction, NewProjectAssignment, NewRole, NewRoleAssignment, Permission,
    PermissionCategory, PermissionDescriptor, ProjectAssignment, ProjectAssignmentId, ProjectId,
    Role, RoleAssignment, RoleId, RoleTemplate, RoleTemplateDefinition, RoleUpdate, TemplateId,
    Tenant, TenantStatus,
};
use tokio::sync::Mutex;

use crate::access_ports::{
    ActiveProjectGrant, ActiveRoleGrant, AssignmentQuery, AssignmentRepository, AuditEvent,
    AuditLogEntry, AuditLogFilter, AuditLogPage, AuditLogRepository, AuditRepository,
    CreateTenantInput, EffectivePermissionCache, EffectivePermissions, Pagination,
    PermissionCatalogRepository, RoleRepository, TenantFilter, TenantRepository,
};
use crate::authorization_service::AuthorizationService;
use crate::permission_resolver::{EffectivePermissionResolver, ResolverConfig};
use crate::tenant_guard::{PlatformBypass, TenantIsolationGuard};

#[derive(Default)]
struct FakeState {
    next_id: i64,
    tenants: BTreeMap<TenantId, Tenant>,
    members: BTreeSet<(TenantId, UserId)>,
    permissions: BTreeMap<Permission, PermissionDescriptor>,
    templates: Vec<RoleTemplate>,
    roles: Vec<Role>,
    assignments: Vec<RoleAssignment>,
    project_assignments: Vec<ProjectAssignment>,
    audit: Vec<AuditLogEntry>,
    cache: HashMap<(TenantId, UserId), EffectivePermissions>,
}

impl FakeState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn append(&mut self, event: AuditEvent) -> AuditLogEntry {
        let entry = AuditLogEntry {
            entry_id: format!("entry-{}", self.audit.len() + 1),
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
        self.audit.push(entry.clone());
        entry
    }

    fn template_permissions(&self, template_id: Option<TemplateId>) -> BTreeSet<Permission> {
        template_id
            .and_then(|template_id| {
                self.templates
                    .iter()
                    .find(|template| template.template_id == template_id)
            })
            .map(|template| template.permissions.clone())
            .unwrap_or_default()
    }

    fn active_role(&self, tenant_id: TenantId, role_id: RoleId) -> Option<&Role> {
        self.roles
            .iter()
            .find(|role| role.tenant_id == tenant_id && role.role_id == role_id && role.is_active)
    }
}

/// In-process store implementing every access-control port for service tests.
#[derive(Default)]
pub(crate) struct FakeStore {
    state: Mutex<FakeState>,
    pub(crate) fail_cache_reads: AtomicBool,
    pub(crate) fail_grant_reads: AtomicBool,
    pub(crate) fail_audit_appends: AtomicBool,
    pub(crate) fail_holder_reads: AtomicBool,
    pub(crate) grant_reads: AtomicUsize,
}

impl FakeStore {
    pub(crate) async fn seed_tenant(&self, tenant_id: TenantId, status: TenantStatus) {
        self.state.lock().await.tenants.insert(
            tenant_id,
            Tenant {
                tenant_id,
                name: format!("Tenant {tenant_id}"),
                status,
                settings: serde_json::json!({}),
            },
        );
    }

    pub(crate) async fn seed_member(&self, tenant_id: TenantId, user_id: UserId) {
        self.state.lock().await.members.insert((tenant_id, user_id));
    }

    /// Creates an active role and a tenant assignment for `user_id`.
    pub(crate) async fn seed_grant(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        permissions: &[Permission],
    ) -> RoleId {
        let mut state = self.state.lock().await;
        let role_id = RoleId::new(state.next_id());
        let now = Utc::now();
        state.roles.push(Role {
            role_id,
            tenant_id,
            name: format!("role-{role_id}"),
            description: None,
            template_id: None,
            custom_permissions: permissions.iter().copied().collect(),
            is_active: true,
            created_at: now,
            updated_at: now,
        });
        let assignment_id = AssignmentId::new(state.next_id());
        state.assignments.push(RoleAssignment {
            assignment_id,
            tenant_id,
            user_id,
            role_id,
            granted_by: user_id,
            granted_at: now,
            expires_at: None,
            is_active: true,
            revoked_by: None,
            revoked_at: None,
        });
        state.members.insert((tenant_id, user_id));
        role_id
    }

    pub(crate) async fn audit_entries(&self) -> Vec<AuditLogEntry> {
        self.state.lock().await.audit.clone()
    }

    pub(crate) async fn audit_actions(&self) -> Vec<AuditAction> {
        self.state
            .lock()
            .await
            .audit
            .iter()
            .map(|entry| entry.action)
            .collect()
    }

    pub(crate) async fn cached(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> Option<EffectivePermissions> {
        self.state
            .lock()
            .await
            .cache
            .get(&(tenant_id, user_id))
            .cloned()
    }

    fn ensure_audit_writable(&self) -> AppResult<()> {
        if self.fail_audit_appends.load(Ordering::SeqCst) {
            return Err(AppError::Unavailable("audit store offline".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl TenantRepository for FakeStore {
    async fn find_tenant(&self, tenant_id: TenantId) -> AppResult<Option<Tenant>> {
        Ok(self.state.lock().await.tenants.get(&tenant_id).cloned())
    }

    async fn is_member(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<bool> {
        Ok(self
            .state
            .lock()
            .await
            .members
            .contains(&(tenant_id, user_id)))
    }

    async fn add_member(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        audit: AuditEvent,
    ) -> AppResult<()> {
        self.ensure_audit_writable()?;
        let mut state = self.state.lock().await;
        if !state.tenants.contains_key(&tenant_id) {
            return Err(AppError::NotFound(format!("tenant '{tenant_id}' does not exist")));
        }
        if !state.members.insert((tenant_id, user_id)) {
            return Err(AppError::Conflict(format!(
                "user '{user_id}' is already a member of tenant '{tenant_id}'"
            )));
        }
        state.append(audit);
        Ok(())
    }

    async fn create_tenant(
        &self,
        input: CreateTenantInput,
        audit: AuditEvent,
    ) -> AppResult<Tenant> {
        self.ensure_audit_writable()?;
        let mut state = self.state.lock().await;
        let tenant_id = TenantId::new(state.next_id());
        let tenant = Tenant {
            tenant_id,
            name: input.name.as_str().to_owned(),
            status: TenantStatus::Active,
            settings: input.settings,
        };
        state.tenants.insert(tenant_id, tenant.clone());
        state.append(audit.stamp_resource_id(tenant_id.to_string()));
        Ok(tenant)
    }

    async fn list_tenants(&self, _bypass: &PlatformBypass) -> AppResult<Vec<Tenant>> {
        Ok(self.state.lock().await.tenants.values().cloned().collect())
    }

    async fn set_tenant_status(
        &self,
        tenant_id: TenantId,
        status: TenantStatus,
        audit: AuditEvent,
    ) -> AppResult<Tenant> {
        self.ensure_audit_writable()?;
        let mut state = self.state.lock().await;
        let tenant = state
            .tenants
            .get_mut(&tenant_id)
            .ok_or_else(|| AppError::NotFound(format!("tenant '{tenant_id}' does not exist")))?;
        tenant.status = status;
        let tenant = tenant.clone();
        state.append(audit);
        Ok(tenant)
    }
}

#[async_trait]
impl PermissionCatalogRepository for FakeStore {
    async fn upsert_permission(
        &self,
        descriptor: PermissionDescriptor,
    ) -> AppResult<PermissionDescriptor> {
        self.state
            .lock()
            .await
            .permissions
            .insert(descriptor.permission, descriptor.clone());
        Ok(descriptor)
    }

    async fn list_permissions(
        &self,
        category: Option<PermissionCategory>,
    ) -> AppResult<Vec<PermissionDescriptor>> {
        Ok(self
            .state
            .lock()
            .await
            .permissions
            .values()
            .filter(|descriptor| category.is_none_or(|category| descriptor.category == category))
            .cloned()
            .collect())
    }

    async fn find_permission(
        &self,
        permission: Permission,
    ) -> AppResult<Option<PermissionDescriptor>> {
        Ok(self.state.lock().await.permissions.get(&permission).cloned())
    }

    async fn upsert_role_template(
        &self,
        definition: RoleTemplateDefinition,
    ) -> AppResult<RoleTemplate> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state
            .templates
            .iter_mut()
            .find(|template| template.name == definition.name.as_str())
        {
            existing.category = definition.category;
            existing.permissions = definition.permissions;
            existing.is_system_template = definition.is_system_template;
            return Ok(existing.clone());
        }

        let template = RoleTemplate {
            template_id: TemplateId::new(state.next_id()),
            name: definition.name.as_str().to_owned(),
            category: definition.category,
            permissions: definition.permissions,
            is_system_template: definition.is_system_template,
        };
        state.templates.push(template.clone());
        Ok(template)
    }

    async fn list_role_templates(
        &self,
        category: Option<PermissionCategory>,
    ) -> AppResult<Vec<RoleTemplate>> {
        Ok(self
            .state
            .lock()
            .await
            .templates
            .iter()
            .filter(|template| category.is_none_or(|category| template.category == category))
            .cloned()
            .collect())
    }

    async fn find_role_template(
        &self,
        template_id: TemplateId,
    ) -> AppResult<Option<RoleTemplate>> {
        Ok(self
            .state
            .lock()
            .await
            .templates
            .iter()
            .find(|template| template.template_id == template_id)
            .cloned())
    }
}

#[async_trait]
impl RoleRepository for FakeStore {
    async fn create_role(
        &self,
        tenant_id: TenantId,
        role: NewRole,
        audit: AuditEvent,
    ) -> AppResult<Role> {
        self.ensure_audit_writable()?;
        let mut state = self.state.lock().await;
        if state
            .roles
            .iter()
            .any(|existing| existing.tenant_id == tenant_id && existing.name == role.name.as_str())
        {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists in tenant '{tenant_id}'",
                role.name
            )));
        }

        let now = Utc::now();
        let created = Role {
            role_id: RoleId::new(state.next_id()),
            tenant_id,
            name: role.name.as_str().to_owned(),
            description: role.description,
            template_id: role.template_id,
            custom_permissions: role.custom_permissions,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.roles.push(created.clone());
        state.append(audit.stamp_resource_id(created.role_id.to_string()));
        Ok(created)
    }

    async fn find_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self
            .state
            .lock()
            .await
            .roles
            .iter()
            .find(|role| role.tenant_id == tenant_id && role.role_id == role_id)
            .cloned())
    }

    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<Role>> {
        Ok(self
            .state
            .lock()
            .await
            .roles
            .iter()
            .filter(|role| role.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn update_role(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
        update: RoleUpdate,
        audit: AuditEvent,
    ) -> AppResult<Role> {
        self.ensure_audit_writable()?;
        let mut state = self.state.lock().await;
        let role = state
            .roles
            .iter_mut()
            .find(|role| role.tenant_id == tenant_id && role.role_id == role_id)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;
        role.apply_update(&update, Utc::now());
        let role = role.clone();
        state.append(audit);
        Ok(role)
    }

    async fn deactivate_role(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
        audit: AuditEvent,
    ) -> AppResult<Role> {
        self.ensure_audit_writable()?;
        let mut state = self.state.lock().await;
        let role = state
            .roles
            .iter_mut()
            .find(|role| role.tenant_id == tenant_id && role.role_id == role_id)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))?;
        role.is_active = false;
        role.updated_at = Utc::now();
        let role = role.clone();
        state.append(audit);
        Ok(role)
    }
}

#[async_trait]
impl AssignmentRepository for FakeStore {
    async fn create_role_assignment(
        &self,
        tenant_id: TenantId,
        assignment: NewRoleAssignment,
        audit: AuditEvent,
    ) -> AppResult<RoleAssignment> {
        self.ensure_audit_writable()?;
        let mut state = self.state.lock().await;
        if state.assignments.iter().any(|existing| {
            existing.tenant_id == tenant_id
                && existing.user_id == assignment.user_id
                && existing.role_id == assignment.role_id
                && existing.is_active
        }) {
            return Err(AppError::Conflict("assignment already exists".to_owned()));
        }

        let created = RoleAssignment {
            assignment_id: AssignmentId::new(state.next_id()),
            tenant_id,
            user_id: assignment.user_id,
            role_id: assignment.role_id,
            granted_by: assignment.granted_by,
            granted_at: Utc::now(),
            expires_at: assignment.expires_at,
            is_active: true,
            revoked_by: None,
            revoked_at: None,
        };
        state.assignments.push(created.clone());
        state.append(audit.stamp_resource_id(created.assignment_id.to_string()));
        Ok(created)
    }

    async fn revoke_role_assignment(
        &self,
        tenant_id: TenantId,
        assignment_id: AssignmentId,
        revoked_by: UserId,
        audit: AuditEvent,
    ) -> AppResult<RoleAssignment> {
        self.ensure_audit_writable()?;
        let mut state = self.state.lock().await;
        let assignment = state
            .assignments
            .iter_mut()
            .find(|assignment| {
                assignment.tenant_id == tenant_id
                    && assignment.assignment_id == assignment_id
                    && assignment.is_active
            })
            .ok_or_else(|| {
                AppError::NotFound(format!("active assignment '{assignment_id}' does not exist"))
            })?;
        assignment.is_active = false;
        assignment.revoked_by = Some(revoked_by);
        assignment.revoked_at = Some(Utc::now());
        let assignment = assignment.clone();
        state.append(audit);
        Ok(assignment)
    }

    async fn list_role_assignments(
        &self,
        tenant_id: TenantId,
        query: AssignmentQuery,
    ) -> AppResult<Vec<RoleAssignment>> {
        let now = Utc::now();
        Ok(self
            .state
            .lock()
            .await
            .assignments
            .iter()
            .filter(|assignment| assignment.tenant_id == tenant_id)
            .filter(|assignment| query.user_id.is_none_or(|user_id| assignment.user_id == user_id))
            .filter(|assignment| {
                query.include_inactive
                    || assignment.state_at(now) == corbel_domain::AssignmentState::Active
            })
            .cloned()
            .collect())
    }

    async fn create_project_assignment(
        &self,
        tenant_id: TenantId,
        assignment: NewProjectAssignment,
        audit: AuditEvent,
    ) -> AppResult<ProjectAssignment> {
        self.ensure_audit_writable()?;
        let mut state = self.state.lock().await;
        let created = ProjectAssignment {
            assignment_id: ProjectAssignmentId::new(state.next_id()),
            tenant_id,
            project_id: assignment.project_id,
            user_id: assignment.user_id,
            role_id: assignment.role_id,
            permission_overrides: assignment.permission_overrides,
            granted_by: assignment.granted_by,
            granted_at: Utc::now(),
            expires_at: assignment.expires_at,
            is_active: true,
            revoked_by: None,
            revoked_at: None,
        };
        state.project_assignments.push(created.clone());
        state.append(audit.stamp_resource_id(created.assignment_id.to_string()));
        Ok(created)
    }

    async fn revoke_project_assignment(
        &self,
        tenant_id: TenantId,
        assignment_id: ProjectAssignmentId,
        revoked_by: UserId,
        audit: AuditEvent,
    ) -> AppResult<ProjectAssignment> {
        self.ensure_audit_writable()?;
        let mut state = self.state.lock().await;
        let assignment = state
            .project_assignments
            .iter_mut()
            .find(|assignment| {
                assignment.tenant_id == tenant_id
                    && assignment.assignment_id == assignment_id
                    && assignment.is_active
            })
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "active project assignment '{assignment_id}' does not exist"
                ))
            })?;
        assignment.is_active = false;
        assignment.revoked_by = Some(revoked_by);
        assignment.revoked_at = Some(Utc::now());
        let assignment = assignment.clone();
        state.append(audit);
        Ok(assignment)
    }

    async fn list_project_assignments(
        &self,
        tenant_id: TenantId,
        query: AssignmentQuery,
    ) -> AppResult<Vec<ProjectAssignment>> {
        let now = Utc::now();
        Ok(self
            .state
            .lock()
            .await
            .project_assignments
            .iter()
            .filter(|assignment| assignment.tenant_id == tenant_id)
            .filter(|assignment| query.user_id.is_none_or(|user_id| assignment.user_id == user_id))
            .filter(|assignment| {
                query
                    .project_id
                    .is_none_or(|project_id| assignment.project_id == project_id)
            })
            .filter(|assignment| {
                query.include_inactive
                    || assignment.state_at(now) == corbel_domain::AssignmentState::Active
            })
            .cloned()
            .collect())
    }

    async fn list_active_role_grants(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Vec<ActiveRoleGrant>> {
        if self.fail_grant_reads.load(Ordering::SeqCst) {
            return Err(AppError::Unavailable("assignment store offline".to_owned()));
        }
        self.grant_reads.fetch_add(1, Ordering::SeqCst);

        let now = Utc::now();
        let state = self.state.lock().await;
        Ok(state
            .assignments
            .iter()
            .filter(|assignment| {
                assignment.tenant_id == tenant_id
                    && assignment.user_id == user_id
                    && assignment.state_at(now) == corbel_domain::AssignmentState::Active
            })
            .filter_map(|assignment| state.active_role(tenant_id, assignment.role_id))
            .map(|role| ActiveRoleGrant {
                role_id: role.role_id,
                template_permissions: state.template_permissions(role.template_id),
                custom_permissions: role.custom_permissions.clone(),
            })
            .collect())
    }

    async fn list_active_project_grants(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        project_id: ProjectId,
    ) -> AppResult<Vec<ActiveProjectGrant>> {
        let now = Utc::now();
        let state = self.state.lock().await;
        Ok(state
            .project_assignments
            .iter()
            .filter(|assignment| {
                assignment.tenant_id == tenant_id
                    && assignment.user_id == user_id
                    && assignment.project_id == project_id
                    && assignment.state_at(now) == corbel_domain::AssignmentState::Active
            })
            .filter_map(|assignment| {
                state
                    .active_role(tenant_id, assignment.role_id)
                    .map(|role| ActiveProjectGrant {
                        assignment_id: assignment.assignment_id,
                        role_id: role.role_id,
                        template_permissions: state.template_permissions(role.template_id),
                        custom_permissions: role.custom_permissions.clone(),
                        permission_overrides: assignment.permission_overrides.clone(),
                    })
            })
            .collect())
    }

    async fn list_role_holders(
        &self,
        tenant_id: TenantId,
        role_id: RoleId,
    ) -> AppResult<Vec<UserId>> {
        if self.fail_holder_reads.load(Ordering::SeqCst) {
            return Err(AppError::Unavailable("holder lookup failed".to_owned()));
        }
        let state = self.state.lock().await;
        let holders = state
            .assignments
            .iter()
            .filter(|assignment| {
                assignment.tenant_id == tenant_id
                    && assignment.role_id == role_id
                    && assignment.is_active
            })
            .map(|assignment| assignment.user_id)
            .chain(
                state
                    .project_assignments
                    .iter()
                    .filter(|assignment| {
                        assignment.tenant_id == tenant_id
                            && assignment.role_id == role_id
                            && assignment.is_active
                    })
                    .map(|assignment| assignment.user_id),
            )
            .collect::<BTreeSet<_>>();
        Ok(holders.into_iter().collect())
    }
}

#[async_trait]
impl EffectivePermissionCache for FakeStore {
    async fn get(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Option<EffectivePermissions>> {
        if self.fail_cache_reads.load(Ordering::SeqCst) {
            return Err(AppError::Unavailable("cache offline".to_owned()));
        }
        Ok(self.cached(tenant_id, user_id).await)
    }

    async fn put(&self, entry: EffectivePermissions) -> AppResult<()> {
        self.state
            .lock()
            .await
            .cache
            .insert((entry.tenant_id, entry.user_id), entry);
        Ok(())
    }

    async fn invalidate(&self, tenant_id: TenantId, user_ids: &[UserId]) -> AppResult<()> {
        let mut state = self.state.lock().await;
        for user_id in user_ids {
            state.cache.remove(&(tenant_id, *user_id));
        }
        Ok(())
    }
}

#[async_trait]
impl AuditRepository for FakeStore {
    async fn append_event(&self, event: AuditEvent) -> AppResult<AuditLogEntry> {
        self.ensure_audit_writable()?;
        Ok(self.state.lock().await.append(event))
    }
}

#[async_trait]
impl AuditLogRepository for FakeStore {
    async fn list_entries(
        &self,
        tenants: TenantFilter,
        filter: AuditLogFilter,
        pagination: Pagination,
    ) -> AppResult<AuditLogPage> {
        let state = self.state.lock().await;
        let mut matching = state
            .audit
            .iter()
            .filter(|entry| {
                tenants
                    .tenant_id()
                    .is_none_or(|tenant_id| entry.tenant_id == tenant_id)
            })
            .filter(|entry| filter.action.is_none_or(|action| entry.action == action))
            .filter(|entry| filter.user_id.is_none_or(|user_id| entry.user_id == user_id))
            .filter(|entry| {
                filter
                    .resource_type
                    .as_deref()
                    .is_none_or(|resource_type| entry.resource_type == resource_type)
            })
            .filter(|entry| filter.from.is_none_or(|from| entry.created_at >= from))
            .filter(|entry| filter.to.is_none_or(|to| entry.created_at < to))
            .cloned()
            .collect::<Vec<_>>();
        matching.reverse();

        let total = matching.len() as u64;
        let entries = matching
            .into_iter()
            .skip(pagination.offset())
            .take(pagination.limit())
            .collect();
        Ok(AuditLogPage {
            entries,
            total,
            pagination,
        })
    }
}

pub(crate) fn authorization_service(store: &Arc<FakeStore>) -> AuthorizationService {
    AuthorizationService::new(
        TenantIsolationGuard::new(store.clone()),
        EffectivePermissionResolver::new(store.clone(), store.clone(), ResolverConfig::default()),
        store.clone(),
        store.clone(),
    )
}
