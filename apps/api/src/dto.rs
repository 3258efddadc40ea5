mod assignments;
mod audit;
mod authorization;
mod catalog;
mod common;
mod platform;
mod roles;

pub use assignments::{
    AssignProjectRoleRequest, AssignRoleRequest, AssignmentListQuery, ProjectAssignmentResponse,
    RoleAssignmentResponse,
};
pub use audit::{AuditLogEntryResponse, AuditLogPageResponse, AuditLogQuery};
pub use authorization::{
    EffectivePermissionsResponse, PermissionCheckRequest, PermissionCheckResponse,
};
pub use catalog::{CatalogQuery, PermissionDescriptorResponse, RoleTemplateResponse};
pub use common::{
    BootstrapRequest, HealthDependencyStatus, HealthResponse, PrincipalResponse,
    parse_permissions, parse_timestamp,
};
pub use platform::{
    AddMemberRequest, CreateTenantRequest, PlatformAuditLogQuery, SetTenantStatusRequest,
    TenantResponse,
};
pub use roles::{CreateRoleRequest, RoleResponse, UpdateRoleRequest};

#[cfg(test)]
mod tests {
    use super::{
        AddMemberRequest, AssignProjectRoleRequest, AssignRoleRequest, AuditLogEntryResponse,
        AuditLogPageResponse, BootstrapRequest, CreateRoleRequest, CreateTenantRequest,
        EffectivePermissionsResponse, HealthDependencyStatus, HealthResponse,
        PermissionCheckRequest, PermissionCheckResponse, PermissionDescriptorResponse,
        PrincipalResponse, ProjectAssignmentResponse, RoleAssignmentResponse, RoleResponse,
        RoleTemplateResponse, SetTenantStatusRequest, TenantResponse, UpdateRoleRequest,
    };

    use crate::error::ErrorResponse;
    use ts_rs::Config;
    use ts_rs::TS;

    #[test]
    fn export_ts_bindings() -> Result<(), ts_rs::ExportError> {
        let config = Config::default();

        BootstrapRequest::export(&config)?;
        PrincipalResponse::export(&config)?;
        PermissionCheckRequest::export(&config)?;
        PermissionCheckResponse::export(&config)?;
        EffectivePermissionsResponse::export(&config)?;
        PermissionDescriptorResponse::export(&config)?;
        RoleTemplateResponse::export(&config)?;
        CreateRoleRequest::export(&config)?;
        UpdateRoleRequest::export(&config)?;
        RoleResponse::export(&config)?;
        AssignRoleRequest::export(&config)?;
        AssignProjectRoleRequest::export(&config)?;
        RoleAssignmentResponse::export(&config)?;
        ProjectAssignmentResponse::export(&config)?;
        AuditLogEntryResponse::export(&config)?;
        AuditLogPageResponse::export(&config)?;
        CreateTenantRequest::export(&config)?;
        SetTenantStatusRequest::export(&config)?;
        AddMemberRequest::export(&config)?;
        TenantResponse::export(&config)?;
        HealthDependencyStatus::export(&config)?;
        HealthResponse::export(&config)?;
        ErrorResponse::export(&config)?;

        Ok(())
    }
}
