// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Error Handling
//!
//! Unified error type for HTTP responses. Errors are serialized as JSON
//! `{error, message, timestamp}` with the appropriate status code, so
//! clients see one envelope for auth failures and unexpected errors alike.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// API error with HTTP status and message.
///
/// Implements `IntoResponse`, allowing it to be returned directly from
/// Axum handlers.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status code for the response.
    pub status: StatusCode,
    /// Human-readable error message.
    pub message: String,
}

/// JSON body structure for error responses.
#[derive(Serialize)]
pub struct ErrorBody {
    /// Short error name (the canonical reason phrase of the status).
    pub error: String,
    /// Human-readable description.
    pub message: String,
    /// RFC 3339 timestamp of the failure.
    pub timestamp: String,
}

impl ErrorBody {
    /// Build the standard error envelope for a status/message pair.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            error: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            message: message.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Create a 400 Bad Request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Create a 500 Internal Server Error.
    ///
    /// Use for unexpected server-side failures. Avoid exposing internal
    /// details.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Create a 503 Service Unavailable error.
    ///
    /// Use when a required dependency (e.g., blockchain RPC) is unavailable.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody::new(self.status, self.message));
        (self.status, body).into_response()
    }
}
