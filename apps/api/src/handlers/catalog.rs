use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, Query, State};
use corbel_domain::{PermissionCategory, TemplateId};

use crate::dto::{CatalogQuery, PermissionDescriptorResponse, RoleTemplateResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_permissions_handler(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> ApiResult<Json<Vec<PermissionDescriptorResponse>>> {
    let category = parse_category(query)?;
    let permissions = state
        .catalog_service
        .list_permissions(category)
        .await?
        .into_iter()
        .map(PermissionDescriptorResponse::from)
        .collect();

    Ok(Json(permissions))
}

pub async fn list_role_templates_handler(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> ApiResult<Json<Vec<RoleTemplateResponse>>> {
    let category = parse_category(query)?;
    let templates = state
        .catalog_service
        .list_role_templates(category)
        .await?
        .into_iter()
        .map(RoleTemplateResponse::from)
        .collect();

    Ok(Json(templates))
}

pub async fn role_template_handler(
    State(state): State<AppState>,
    Path(template_id): Path<i64>,
) -> ApiResult<Json<RoleTemplateResponse>> {
    let template = state
        .catalog_service
        .role_template(TemplateId::new(template_id))
        .await?;

    Ok(Json(RoleTemplateResponse::from(template)))
}

fn parse_category(query: CatalogQuery) -> ApiResult<Option<PermissionCategory>> {
    Ok(query
        .category
        .as_deref()
        .map(PermissionCategory::from_str)
        .transpose()?)
}
