use async_trait::async_trait;
use corbel_application::PermissionCatalogRepository;
use corbel_domain::{PermissionCategory, RoleTemplateDefinition};

use super::*;

#[async_trait]
impl PermissionCatalogRepository for InMemoryAccessStore {
    async fn upsert_permission(
        &self,
        descriptor: PermissionDescriptor,
    ) -> AppResult<PermissionDescriptor> {
        self.state
            .write()
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
            .read()
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
        Ok(self.state.read().await.permissions.get(&permission).cloned())
    }

    async fn upsert_role_template(
        &self,
        definition: RoleTemplateDefinition,
    ) -> AppResult<RoleTemplate> {
        let mut state = self.state.write().await;
        let existing = state
            .templates
            .values()
            .find(|template| template.name == definition.name.as_str())
            .map(|template| template.template_id);
        let template_id = match existing {
            Some(template_id) => template_id,
            None => TemplateId::new(state.next_id()),
        };

        let template = RoleTemplate {
            template_id,
            name: definition.name.into(),
            category: definition.category,
            permissions: definition.permissions,
            is_system_template: definition.is_system_template,
        };
        state.templates.insert(template_id, template.clone());

        Ok(template)
    }

    async fn list_role_templates(
        &self,
        category: Option<PermissionCategory>,
    ) -> AppResult<Vec<RoleTemplate>> {
        Ok(self
            .state
            .read()
            .await
            .templates
            .values()
            .filter(|template| category.is_none_or(|category| template.category == category))
            .cloned()
            .collect())
    }

    async fn find_role_template(
        &self,
        template_id: TemplateId,
    ) -> AppResult<Option<RoleTemplate>> {
        Ok(self.state.read().await.templates.get(&template_id).cloned())
    }
}
