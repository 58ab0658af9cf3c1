// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request-scoped tenant context.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::security::WalletBinding;

/// The authenticated tenant of a request, derived by the auth gate from
/// the security snapshot captured at authentication time.
#[derive(Debug, Clone)]
pub struct TenantContext {
    /// Display name of the API key record.
    pub api_key_name: String,
    /// Client IP the request was authenticated with.
    pub client_ip: String,
    /// The tenant's funding wallet. `None` means the tenant cannot fund
    /// transactions and relays requiring funding are refused.
    pub wallet: Option<WalletBinding>,
}

impl TenantContext {
    /// Context used when the auth gate is disabled. Carries no wallet, so
    /// funding is refused for anonymous requests.
    pub fn anonymous(client_ip: impl Into<String>) -> Self {
        Self {
            api_key_name: "anonymous".to_string(),
            client_ip: client_ip.into(),
            wallet: None,
        }
    }
}

/// Extractor for the tenant context.
///
/// Yields `None` when the auth gate did not run (security disabled or
/// bypass path); handlers then fall back to an anonymous context.
///
/// ```rust,ignore
/// async fn my_handler(Tenant(tenant): Tenant) -> impl IntoResponse {
///     let tenant = tenant.unwrap_or_else(|| TenantContext::anonymous("unknown"));
/// }
/// ```
pub struct Tenant(pub Option<TenantContext>);

impl<S: Send + Sync> FromRequestParts<S> for Tenant {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Tenant(parts.extensions.get::<TenantContext>().cloned()))
    }
}
