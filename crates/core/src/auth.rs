use serde::{Deserialize, Serialize};

use crate::{TenantId, UserId};

/// Requester metadata captured alongside audited actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMetadata {
    /// Client IP address, when known.
    pub ip_address: Option<String>,
    /// Client user agent, when known.
    pub user_agent: Option<String>,
}

/// Already-authenticated caller persisted in the session.
///
/// The tenant is optional because an identity provider may authenticate a
/// user before a tenant is selected. Tenant-scoped operations refuse a
/// principal without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    user_id: UserId,
    tenant_id: Option<TenantId>,
    #[serde(default)]
    request: RequestMetadata,
}

impl Principal {
    /// Creates a principal bound to one tenant.
    #[must_use]
    pub fn new(user_id: UserId, tenant_id: TenantId) -> Self {
        Self {
            user_id,
            tenant_id: Some(tenant_id),
            request: RequestMetadata::default(),
        }
    }

    /// Creates a principal that has not selected a tenant.
    #[must_use]
    pub fn without_tenant(user_id: UserId) -> Self {
        Self {
            user_id,
            tenant_id: None,
            request: RequestMetadata::default(),
        }
    }

    /// Attaches requester metadata used by audit entries.
    #[must_use]
    pub fn with_request_metadata(mut self, request: RequestMetadata) -> Self {
        self.request = request;
        self
    }

    /// Returns the authenticated user.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the asserted tenant, if any.
    #[must_use]
    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    /// Returns requester metadata.
    #[must_use]
    pub fn request(&self) -> &RequestMetadata {
        &self.request
    }
}
