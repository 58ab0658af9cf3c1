// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Reference transfer plugin.
//!
//! The built-in plugin covering plain native-coin and ERC-20 transfers.
//! It is also the reference implementation of the plugin contract:
//! downstream business plugins (escrow, NFT, ...) follow the same shape
//! and are registered next to it in `main`.

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use tracing::info;

use super::{GasOperation, PluginError, RelayPlugin};
use crate::auth::{Tenant, TenantContext};
use crate::models::{RelayRequest, RelayResponse};
use crate::relay::RelayEngine;
use crate::state::AppState;

/// Expected gas of a bare native-coin transfer.
const NATIVE_TRANSFER_GAS: u64 = 21_000;

/// Expected gas of an ERC-20 `transfer` call.
const TOKEN_TRANSFER_GAS: u64 = 65_000;

#[derive(Default)]
pub struct TransferPlugin;

impl RelayPlugin for TransferPlugin {
    fn name(&self) -> &str {
        "transfer"
    }

    fn api_prefix(&self) -> &str {
        "/api/transfer"
    }

    fn openapi_tags(&self) -> Vec<&str> {
        vec!["Transfer"]
    }

    fn gas_operations(&self) -> Vec<GasOperation> {
        vec![
            GasOperation::new("native-transfer", NATIVE_TRANSFER_GAS, "transfer()"),
            GasOperation::new(
                "token-transfer",
                TOKEN_TRANSFER_GAS,
                "transfer(address,uint256)",
            ),
        ]
    }

    fn initialize(&self, _engine: &Arc<RelayEngine>) -> Result<(), PluginError> {
        info!(plugin = self.name(), "transfer plugin ready");
        Ok(())
    }

    fn routes(&self) -> Router<AppState> {
        Router::new().route("/relay", post(relay_transfer))
    }
}

/// Relay a pre-signed transfer transaction.
///
/// The operation's declared gas budget applies unless the request carries
/// its own `expectedGasLimit`; unknown operations fall back to the global
/// ceilings.
#[utoipa::path(
    post,
    path = "/api/transfer/relay",
    tag = "Transfer",
    request_body = RelayRequest,
    responses(
        (status = 200, description = "Relay outcome", body = RelayResponse),
        (status = 401, description = "Missing or invalid API key")
    ),
    security(("api_key" = []))
)]
pub async fn relay_transfer(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    Json(request): Json<RelayRequest>,
) -> Json<RelayResponse> {
    let tenant = tenant.unwrap_or_else(|| TenantContext::anonymous("unknown"));

    let expected_gas_limit = request
        .expected_gas_limit
        .or_else(|| {
            state
                .registry
                .find_operation(&request.operation_name)
                .map(|op| op.gas_limit)
        })
        .unwrap_or(0);

    let outcome = state
        .engine
        .process(
            &tenant,
            &request.user_wallet_address,
            &request.signed_transaction_hex,
            &request.operation_name,
            expected_gas_limit,
        )
        .await;

    Json(RelayResponse::from(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_both_transfer_operations() {
        let plugin = TransferPlugin;
        let ops = plugin.gas_operations();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].name, "native-transfer");
        assert_eq!(ops[0].gas_limit, 21_000);
        assert_eq!(ops[1].name, "token-transfer");
        assert_eq!(ops[1].gas_limit, 65_000);
    }

    #[test]
    fn prefix_and_tags_are_stable() {
        let plugin = TransferPlugin;
        assert_eq!(plugin.api_prefix(), "/api/transfer");
        assert_eq!(plugin.openapi_tags(), vec!["Transfer"]);
    }
}
