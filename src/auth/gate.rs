// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The authentication middleware.
//!
//! Runs on every request. Captures one security snapshot per request; the
//! tenant context it attaches (including the funding wallet) comes from
//! that snapshot, so an in-flight request is unaffected by a concurrent
//! config reload.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use super::{AuthError, TenantContext};
use crate::state::AppState;

/// Paths that skip authentication entirely (probes and docs).
pub const BYPASS_PATHS: &[&str] = &[
    "/health",
    "/ping",
    "/status",
    "/actuator/health",
    "/api-doc",
];

/// Headers consulted for the client IP, in order. The first non-empty
/// value wins; `X-Forwarded-For` contributes its first entry.
const CLIENT_IP_HEADERS: &[&str] = &[
    "x-forwarded-for",
    "x-real-ip",
    "x-client-ip",
    "cf-connecting-ip",
    "true-client-ip",
];

/// Authentication middleware. Install with
/// `axum::middleware::from_fn_with_state(state, auth_gate)`.
pub async fn auth_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    if is_bypass_path(request.uri().path()) || !state.config.security.enabled {
        return next.run(request).await;
    }

    let snapshot = state.security.snapshot();
    if !snapshot.settings.require_api_key {
        return next.run(request).await;
    }

    let client_ip = extract_client_ip(
        request.headers(),
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip().to_string()),
    );

    let Some(key) = extract_api_key(request.headers(), request.uri().query()) else {
        if snapshot.settings.log_failed_attempts {
            warn!(client_ip = %client_ip, path = request.uri().path(), "request without API key");
        }
        return AuthError::MissingApiKey.into_response();
    };

    let Some(entry) = snapshot.lookup(&key) else {
        if snapshot.settings.log_failed_attempts {
            warn!(client_ip = %client_ip, path = request.uri().path(), "unknown or disabled API key");
        }
        return AuthError::InvalidApiKey.into_response();
    };

    if snapshot.settings.enforce_ip_whitelist
        && !snapshot.is_ip_allowed(&client_ip, Some(&entry)).await
    {
        if snapshot.settings.log_failed_attempts {
            warn!(
                client_ip = %client_ip,
                api_key_name = %entry.record.name,
                "client IP not in whitelist"
            );
        }
        return AuthError::IpNotAllowed.into_response();
    }

    request.extensions_mut().insert(TenantContext {
        api_key_name: entry.record.name.clone(),
        client_ip,
        wallet: entry.record.wallet_config.clone(),
    });
    next.run(request).await
}

pub fn is_bypass_path(path: &str) -> bool {
    BYPASS_PATHS
        .iter()
        .any(|bypass| path == *bypass || path.starts_with(&format!("{bypass}/")))
}

/// Extract the API key: `X-API-Key` header, then `Authorization: Bearer`,
/// then the `api_key` query parameter. First match wins.
pub fn extract_api_key(headers: &HeaderMap, query: Option<&str>) -> Option<String> {
    if let Some(value) = headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
        let value = value.trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    if let Some(value) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        if let Some(token) = value.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    query.and_then(|q| {
        q.split('&').find_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            (name == "api_key" && !value.is_empty()).then(|| value.to_string())
        })
    })
}

/// Resolve the client IP from proxy headers, falling back to the
/// transport peer.
pub fn extract_client_ip(headers: &HeaderMap, peer: Option<String>) -> String {
    for header in CLIENT_IP_HEADERS {
        let Some(value) = headers.get(*header).and_then(|v| v.to_str().ok()) else {
            continue;
        };
        let candidate = if *header == "x-forwarded-for" {
            value.split(',').next().unwrap_or("")
        } else {
            value
        };
        let candidate = candidate.trim();
        if !candidate.is_empty() {
            return candidate.to_string();
        }
    }
    peer.unwrap_or_else(|| "unknown".to_string())
}
