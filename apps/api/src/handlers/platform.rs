use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use corbel_core::{Principal, TenantId, UserId};
use corbel_domain::TenantStatus;

use crate::dto::{
    AuditLogPageResponse, CreateTenantRequest, EffectivePermissionsResponse,
    PlatformAuditLogQuery, SetTenantStatusRequest, TenantResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_tenants_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<TenantResponse>>> {
    let tenants = state
        .tenant_admin_service
        .list_tenants(&principal)
        .await?
        .into_iter()
        .map(TenantResponse::from)
        .collect();

    Ok(Json(tenants))
}

pub async fn create_tenant_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateTenantRequest>,
) -> ApiResult<(StatusCode, Json<TenantResponse>)> {
    let tenant = state
        .tenant_admin_service
        .create_tenant(&principal, payload.name, payload.settings)
        .await?;

    Ok((StatusCode::CREATED, Json(TenantResponse::from(tenant))))
}

pub async fn set_tenant_status_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(tenant_id): Path<i64>,
    Json(payload): Json<SetTenantStatusRequest>,
) -> ApiResult<Json<TenantResponse>> {
    let status = TenantStatus::from_str(payload.status.as_str())?;
    let tenant = state
        .tenant_admin_service
        .set_tenant_status(&principal, TenantId::new(tenant_id), status)
        .await?;

    Ok(Json(TenantResponse::from(tenant)))
}

pub async fn platform_audit_log_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<PlatformAuditLogQuery>,
) -> ApiResult<Json<AuditLogPageResponse>> {
    let (target_tenant, query) = query.split();
    let (filter, pagination) = query.into_parts()?;
    let page = state
        .audit_service
        .list_platform_audit_logs(&principal, target_tenant, filter, pagination)
        .await?;

    Ok(Json(AuditLogPageResponse::from(page)))
}

pub async fn platform_effective_permissions_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((tenant_id, user_id)): Path<(i64, i64)>,
) -> ApiResult<Json<EffectivePermissionsResponse>> {
    let effective = state
        .authorization_service
        .platform_effective_permissions(&principal, TenantId::new(tenant_id), UserId::new(user_id))
        .await?;

    Ok(Json(EffectivePermissionsResponse::from(effective)))
}
