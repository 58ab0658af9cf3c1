// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EVM JSON-RPC client.
//!
//! Thin adapter over an alloy HTTP provider. All methods are safe to call
//! concurrently; errors are surfaced as [`ChainError::Rpc`] and never
//! retried at this level - polling loops live in the relay engine.

use std::fmt;

use alloy::{
    network::Ethereum,
    primitives::{Address, B256, U256},
    providers::{
        fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
        Identity, Provider, ProviderBuilder, RootProvider,
    },
    rpc::types::TransactionRequest,
};
use async_trait::async_trait;

/// HTTP provider type with the default filler stack.
type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Ethereum>,
>;

/// Errors that can occur during chain operations.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("RPC error: {0}")]
    Rpc(String),
}

/// Summary of a mined transaction receipt.
#[derive(Debug, Clone)]
pub struct ReceiptInfo {
    pub tx_hash: B256,
    /// Execution status: `true` means the transaction succeeded.
    pub status: bool,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// The chain operations the relay engine depends on.
///
/// Implemented by [`ChainClient`] in production and by in-memory mocks in
/// engine tests.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Native-coin balance of an address, in wei.
    async fn balance(&self, address: Address) -> Result<U256, ChainError>;

    /// Submit raw signed transaction bytes. Returns the transaction hash
    /// without waiting for inclusion.
    async fn send_raw(&self, raw: &[u8]) -> Result<B256, ChainError>;

    /// Receipt of a transaction, or `None` while it is unmined.
    async fn receipt(&self, tx_hash: B256) -> Result<Option<ReceiptInfo>, ChainError>;

    /// Current network gas price in wei.
    async fn network_gas_price(&self) -> Result<u128, ChainError>;

    /// The chain id reported by the node.
    async fn chain_id(&self) -> Result<u64, ChainError>;

    /// Estimate gas for a call.
    async fn estimate_gas(&self, call: TransactionRequest) -> Result<u64, ChainError>;
}

/// Production chain client backed by an alloy HTTP provider.
pub struct ChainClient {
    provider: HttpProvider,
    rpc_url: String,
}

impl ChainClient {
    /// Create a new client for the given RPC endpoint.
    pub fn new(rpc_url: &str) -> Result<Self, ChainError> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e: url::ParseError| ChainError::InvalidRpcUrl(e.to_string()))?;

        let provider = ProviderBuilder::new().connect_http(url);

        Ok(Self {
            provider,
            rpc_url: rpc_url.to_string(),
        })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }
}

impl fmt::Debug for ChainClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainClient")
            .field("rpc_url", &self.rpc_url)
            .finish()
    }
}

#[async_trait]
impl ChainRpc for ChainClient {
    async fn balance(&self, address: Address) -> Result<U256, ChainError> {
        self.provider
            .get_balance(address)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    async fn send_raw(&self, raw: &[u8]) -> Result<B256, ChainError> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;
        Ok(*pending.tx_hash())
    }

    async fn receipt(&self, tx_hash: B256) -> Result<Option<ReceiptInfo>, ChainError> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;

        Ok(receipt.map(|r| ReceiptInfo {
            tx_hash,
            status: r.status(),
            block_number: r.block_number,
            gas_used: r.gas_used as u64,
        }))
    }

    async fn network_gas_price(&self) -> Result<u128, ChainError> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    async fn chain_id(&self) -> Result<u64, ChainError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    async fn estimate_gas(&self, call: TransactionRequest) -> Result<u64, ChainError> {
        self.provider
            .estimate_gas(call)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }
}
