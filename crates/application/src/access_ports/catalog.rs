use async_trait::async_trait;
use corbel_core::AppResult;
use corbel_domain::{
    Permission, PermissionCategory, PermissionDescriptor, RoleTemplate, RoleTemplateDefinition,
    TemplateId,
};

/// Repository port for the global permission catalog and role templates.
#[async_trait]
pub trait PermissionCatalogRepository: Send + Sync {
    /// Inserts or replaces a permission descriptor keyed by its identifier.
    async fn upsert_permission(
        &self,
        descriptor: PermissionDescriptor,
    ) -> AppResult<PermissionDescriptor>;

    /// Lists descriptors ordered by identifier.
    async fn list_permissions(
        &self,
        category: Option<PermissionCategory>,
    ) -> AppResult<Vec<PermissionDescriptor>>;

    /// Finds one descriptor.
    async fn find_permission(
        &self,
        permission: Permission,
    ) -> AppResult<Option<PermissionDescriptor>>;

    /// Inserts or replaces a template keyed by its name.
    async fn upsert_role_template(
        &self,
        definition: RoleTemplateDefinition,
    ) -> AppResult<RoleTemplate>;

    /// Lists templates ordered by identifier.
    async fn list_role_templates(
        &self,
        category: Option<PermissionCategory>,
    ) -> AppResult<Vec<RoleTemplate>>;

    /// Finds one template.
    async fn find_role_template(&self, template_id: TemplateId)
    -> AppResult<Option<RoleTemplate>>;
}
