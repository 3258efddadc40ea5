use std::sync::Arc;

use corbel_core::{AppError, AppResult};
use corbel_domain::{
    Permission, PermissionCategory, PermissionDescriptor, RoleTemplate, RoleTemplateDefinition,
    TemplateId,
};
use tracing::info;

use crate::access_ports::PermissionCatalogRepository;
use crate::tenant_guard::PlatformBypass;

/// Counts of catalog rows written by [`PermissionCatalogService::seed_defaults`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogSeedSummary {
    /// Permission descriptors upserted.
    pub permissions: usize,
    /// Templates upserted.
    pub templates: usize,
}

/// Application service for the global permission catalog.
#[derive(Clone)]
pub struct PermissionCatalogService {
    repository: Arc<dyn PermissionCatalogRepository>,
}

impl PermissionCatalogService {
    /// Creates a catalog service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn PermissionCatalogRepository>) -> Self {
        Self { repository }
    }

    /// Upserts every built-in descriptor and system template. Idempotent.
    pub async fn seed_defaults(&self) -> AppResult<CatalogSeedSummary> {
        let mut permissions = 0;
        for permission in Permission::all() {
            self.repository
                .upsert_permission(permission.default_descriptor())
                .await?;
            permissions += 1;
        }

        let mut templates = 0;
        for definition in RoleTemplateDefinition::system_defaults() {
            self.repository.upsert_role_template(definition).await?;
            templates += 1;
        }

        info!(permissions, templates, "permission catalog seeded");
        Ok(CatalogSeedSummary {
            permissions,
            templates,
        })
    }

    /// Registers or replaces a permission descriptor.
    pub async fn register_permission(
        &self,
        _bypass: &PlatformBypass,
        descriptor: PermissionDescriptor,
    ) -> AppResult<PermissionDescriptor> {
        let expected = descriptor.permission.category();
        if descriptor.category != expected {
            return Err(AppError::Validation(format!(
                "permission '{}' belongs to category '{}', not '{}'",
                descriptor.permission.id(),
                expected.as_str(),
                descriptor.category.as_str()
            )));
        }

        self.repository.upsert_permission(descriptor).await
    }

    /// Lists descriptors, optionally narrowed to one category.
    pub async fn list_permissions(
        &self,
        category: Option<PermissionCategory>,
    ) -> AppResult<Vec<PermissionDescriptor>> {
        self.repository.list_permissions(category).await
    }

    /// Registers or replaces a role template.
    ///
    /// System templates are only written by seeding. Re-registering an
    /// existing name keeps its category and cannot introduce platform
    /// permissions into a template that did not already grant them.
    pub async fn register_role_template(
        &self,
        _bypass: &PlatformBypass,
        definition: RoleTemplateDefinition,
    ) -> AppResult<RoleTemplate> {
        if definition.is_system_template {
            return Err(AppError::Validation(
                "system templates are managed by catalog seeding".to_owned(),
            ));
        }

        let existing = self.repository.list_role_templates(None).await?;
        if let Some(current) = existing
            .iter()
            .find(|template| template.name == definition.name.as_str())
        {
            if current.is_system_template {
                return Err(AppError::Conflict(format!(
                    "role template '{}' is a system template",
                    definition.name
                )));
            }
            if current.category != definition.category {
                return Err(AppError::Conflict(format!(
                    "role template '{}' is registered under category '{}'",
                    definition.name,
                    current.category.as_str()
                )));
            }
            let adds_platform = definition.permissions.iter().any(Permission::is_platform);
            if adds_platform && !current.grants_platform_permissions() {
                return Err(AppError::Conflict(format!(
                    "role template '{}' cannot gain platform permissions",
                    definition.name
                )));
            }
        }

        self.repository.upsert_role_template(definition).await
    }

    /// Lists templates, optionally narrowed to one category.
    pub async fn list_role_templates(
        &self,
        category: Option<PermissionCategory>,
    ) -> AppResult<Vec<RoleTemplate>> {
        self.repository.list_role_templates(category).await
    }

    /// Returns one template.
    pub async fn role_template(&self, template_id: TemplateId) -> AppResult<RoleTemplate> {
        self.repository
            .find_role_template(template_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("role template '{template_id}' does not exist"))
            })
    }
}
