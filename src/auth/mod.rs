// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Gate
//!
//! API-key authentication for the relay API.
//!
//! ## Auth Flow
//!
//! 1. Client sends its key via `X-API-Key`, `Authorization: Bearer <key>`,
//!    or the `api_key` query parameter
//! 2. The gate middleware:
//!    - skips probe paths (`/health`, `/ping`, `/status`, `/actuator/health`)
//!    - resolves the key against the current security snapshot
//!    - checks the client IP against the key's whitelist
//!    - attaches a [`TenantContext`] to the request
//!
//! Handlers read the tenant through the [`Tenant`] extractor. Rejections
//! are `401` with the standard `{error, message, timestamp}` envelope.

pub mod context;
pub mod error;
pub mod gate;

pub use context::{Tenant, TenantContext};
pub use error::AuthError;
pub use gate::auth_gate;
