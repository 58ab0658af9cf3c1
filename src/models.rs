// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response structures for the REST API. All types derive
//! `Serialize`/`Deserialize` and `ToSchema` for JSON handling and OpenAPI
//! documentation. Wire field names are camelCase.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::relay::RelayOutcome;

/// Request to relay a pre-signed transaction.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    /// The wallet the client claims signed the transaction. Informational:
    /// the authoritative sender is always recovered from the signature.
    pub user_wallet_address: String,
    /// Hex-encoded signed transaction (0x-prefixed or bare), legacy or
    /// EIP-1559.
    pub signed_transaction_hex: String,
    /// Business operation name, used to select the declared gas budget.
    pub operation_name: String,
    /// Optional override for the operation's expected gas limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_gas_limit: Option<u64>,
}

/// Outcome of a relay request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    /// Whether the user transaction was forwarded and confirmed.
    pub success: bool,
    /// Hash of the forwarded transaction, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    /// The `to` address of the decoded transaction, when decoding got far
    /// enough to know it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    /// Human-readable failure description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<RelayOutcome> for RelayResponse {
    fn from(outcome: RelayOutcome) -> Self {
        Self {
            success: outcome.success,
            transaction_hash: outcome.tx_hash,
            contract_address: outcome.contract_address,
            error: outcome.error,
        }
    }
}

/// One row of the gas-cost listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GasCostEntry {
    /// Operation name as declared by its plugin.
    pub operation: String,
    /// Declared expected gas limit.
    pub gas_limit: u64,
    /// Current network gas price in wei (floored by the configured minimum).
    pub gas_price_wei: String,
    /// `gas_limit * gas_price` in wei.
    pub total_cost_wei: String,
    /// Total cost formatted in native-coin units.
    pub total_cost_native: String,
}

/// Response of `GET /gas-costs`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GasCostListResponse {
    pub chain_id: u64,
    pub gas_price_wei: String,
    pub operations: Vec<GasCostEntry>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Overall status, always `"ok"` when the process is serving.
    pub status: String,
    /// RFC 3339 timestamp of the check.
    pub timestamp: String,
    /// Service identifier.
    pub service: String,
    /// Names of the active plugins.
    pub plugins: Vec<String>,
}
