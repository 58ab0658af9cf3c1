// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use crate::models::HealthResponse;
use crate::state::AppState;

/// Service identifier reported by the health endpoint.
pub const SERVICE_NAME: &str = "gaslift-relay";

/// Health check endpoint handler.
///
/// Mounted at `/health` and the probe aliases (`/ping`, `/status`,
/// `/actuator/health`); all of them bypass the auth gate.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        service: SERVICE_NAME.to_string(),
        plugins: state.registry.active_plugins(),
    })
}
