// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP surface: router assembly, CORS, OpenAPI document.

use axum::{extract::State, middleware, routing::get, Json, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use utoipa::OpenApi;

use crate::auth::gate::auth_gate;
use crate::models::{GasCostEntry, GasCostListResponse, HealthResponse, RelayRequest, RelayResponse};
use crate::plugins::GasOperation;
use crate::state::AppState;

pub mod gas_costs;
pub mod health;

/// Assemble the full router: public endpoints, plugin routes, auth gate,
/// CORS.
pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/health", get(health::health))
        .route("/ping", get(health::health))
        .route("/status", get(health::health))
        .route("/actuator/health", get(health::health))
        .route("/gas-costs", get(gas_costs::list_gas_costs))
        .route("/api-doc/openapi.json", get(openapi_json));

    for plugin in state.registry.plugins() {
        app = app.nest(plugin.api_prefix(), plugin.routes());
    }

    app.layer(middleware::from_fn_with_state(state.clone(), auth_gate))
        .layer(build_cors_layer())
        .with_state(state)
}

/// Serve the OpenAPI document, with plugin-contributed tags merged in.
async fn openapi_json(State(state): State<AppState>) -> Json<utoipa::openapi::OpenApi> {
    let mut doc = ApiDoc::openapi();
    let mut tags = doc.tags.take().unwrap_or_default();
    for tag in state.registry.openapi_tags() {
        if !tags.iter().any(|t| t.name == tag) {
            tags.push(utoipa::openapi::tag::TagBuilder::new().name(tag).build());
        }
    }
    doc.tags = Some(tags);
    Json(doc)
}

/// Build CORS layer from environment configuration.
///
/// - If `CORS_ALLOWED_ORIGINS` is set, only those origins are allowed
///   (comma-separated).
/// - If not set, falls back to permissive CORS (development only).
fn build_cors_layer() -> CorsLayer {
    if let Ok(origins) = std::env::var("CORS_ALLOWED_ORIGINS") {
        let allowed: Vec<_> = origins
            .split(',')
            .map(|s| s.trim().parse().expect("Invalid CORS origin"))
            .collect();
        tracing::info!(origins = %origins, "CORS: restricting to configured origins");
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any)
    } else {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set - using permissive CORS (development only)");
        CorsLayer::permissive()
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        gas_costs::list_gas_costs,
        crate::plugins::transfer::relay_transfer,
    ),
    components(
        schemas(
            HealthResponse,
            GasCostEntry,
            GasCostListResponse,
            GasOperation,
            RelayRequest,
            RelayResponse,
        )
    ),
    tags(
        (name = "Health", description = "Liveness probes"),
        (name = "Gas", description = "Gas budgets and current costs"),
        (name = "Transfer", description = "Relay pre-signed transfer transactions")
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

/// Registers the API-key security scheme in the OpenAPI document.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Key"))),
            );
        }
    }
}
