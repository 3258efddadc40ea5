use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use corbel_core::{AppError, AppResult, Principal};
use corbel_domain::Permission;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ready: bool,
    /// Configured effective permission cache backend.
    pub permission_cache: &'static str,
    pub postgres: HealthDependencyStatus,
    pub redis: HealthDependencyStatus,
}

/// One runtime dependency health status.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-dependency-status.ts"
)]
pub struct HealthDependencyStatus {
    pub status: &'static str,
    pub detail: Option<String>,
}

/// Development session bootstrap payload.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/bootstrap-request.ts"
)]
pub struct BootstrapRequest {
    pub token: String,
    pub user_id: i64,
    pub tenant_id: Option<i64>,
}

/// The authenticated principal.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/principal-response.ts"
)]
pub struct PrincipalResponse {
    pub user_id: i64,
    pub tenant_id: Option<i64>,
}

impl From<Principal> for PrincipalResponse {
    fn from(principal: Principal) -> Self {
        Self {
            user_id: principal.user_id().as_i64(),
            tenant_id: principal.tenant_id().map(|tenant_id| tenant_id.as_i64()),
        }
    }
}

/// Parses transport permission values: numeric ids or `resource.action` keys.
pub fn parse_permissions(values: &[String]) -> AppResult<BTreeSet<Permission>> {
    values
        .iter()
        .map(|value| Permission::from_transport(value.as_str()))
        .collect()
}

/// Parses an optional RFC 3339 timestamp.
pub fn parse_timestamp(field: &str, value: Option<&str>) -> AppResult<Option<DateTime<Utc>>> {
    value
        .map(|value| {
            DateTime::parse_from_rfc3339(value)
                .map(|parsed| parsed.with_timezone(&Utc))
                .map_err(|error| {
                    AppError::Validation(format!("invalid {field} timestamp '{value}': {error}"))
                })
        })
        .transpose()
}
