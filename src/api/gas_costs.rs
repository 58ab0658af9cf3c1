// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gas-cost listing endpoint.

use alloy::primitives::U256;
use axum::{extract::State, Json};

use crate::chain::format_native;
use crate::error::ApiError;
use crate::models::{GasCostEntry, GasCostListResponse};
use crate::state::AppState;

/// List every declared operation with its cost at the current network gas
/// price (floored by the configured minimum).
#[utoipa::path(
    get,
    path = "/gas-costs",
    tag = "Gas",
    responses(
        (status = 200, description = "Per-operation gas costs", body = GasCostListResponse),
        (status = 401, description = "Missing or invalid API key"),
        (status = 500, description = "Gas price unavailable")
    ),
    security(("api_key" = []))
)]
pub async fn list_gas_costs(
    State(state): State<AppState>,
) -> Result<Json<GasCostListResponse>, ApiError> {
    let observed = state.chain.network_gas_price().await.map_err(|e| {
        ApiError::internal(format!("failed to fetch network gas price: {e}"))
    })?;
    let gas_price = state.engine.policy().effective_network_price(observed);

    let operations = state
        .registry
        .all_gas_operations()
        .iter()
        .map(|op| {
            let total = U256::from(op.gas_limit) * U256::from(gas_price);
            GasCostEntry {
                operation: op.name.clone(),
                gas_limit: op.gas_limit,
                gas_price_wei: gas_price.to_string(),
                total_cost_wei: total.to_string(),
                total_cost_native: format_native(total),
            }
        })
        .collect();

    Ok(Json(GasCostListResponse {
        chain_id: state.chain_id,
        gas_price_wei: gas_price.to_string(),
        operations,
    }))
}
