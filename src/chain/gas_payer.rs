// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gas Payer Contract adapter.
//!
//! The on-chain contract takes `gasAmount + fee` as transaction value,
//! forwards `gasAmount` native coin to the user address and retains the
//! remainder as service fee. This module only encodes and sends the calls;
//! the contract itself is an external collaborator.
//!
//! The view side (`calculateFee`) runs on a shared read provider. The
//! funding side is bound to a tenant's wallet and is constructed per call,
//! so adapters are never shared across tenants.

use std::sync::Arc;

use alloy::{
    network::EthereumWallet,
    primitives::{Address, B256, U256},
    providers::{Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    sol,
};
use async_trait::async_trait;

use crate::security::WalletBinding;

sol! {
    #[sol(rpc)]
    interface IGasPayer {
        function calculateFee(uint256 amount) external view returns (uint256);
        function fundAndRelay(address user, uint256 gasAmount) external payable;
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GasPayerError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("fee query failed: {0}")]
    Fee(String),

    #[error("funding transaction failed: {0}")]
    Funding(String),
}

/// Receipt of a `fundAndRelay` transaction.
#[derive(Debug, Clone)]
pub struct FundingReceipt {
    pub tx_hash: B256,
    /// Execution status; funding only counts when this is `true`.
    pub status: bool,
}

/// Operations against the Gas Payer Contract.
#[async_trait]
pub trait GasPayerOps: Send + Sync {
    /// Service fee for funding `amount` wei. Pure view call.
    async fn calculate_fee(&self, amount: U256) -> Result<U256, GasPayerError>;

    /// Fund `user` with `gas_amount` wei, paying `total_value`
    /// (`gas_amount + fee`) to the contract.
    async fn fund_and_relay(
        &self,
        user: Address,
        gas_amount: U256,
        total_value: U256,
    ) -> Result<FundingReceipt, GasPayerError>;
}

/// Builds contract adapters: a shared view adapter for fee queries and a
/// per-tenant funding adapter bound to the tenant's wallet.
pub trait GasPayerFactory: Send + Sync {
    fn view(&self) -> Arc<dyn GasPayerOps>;
    fn for_wallet(&self, binding: &WalletBinding) -> Result<Arc<dyn GasPayerOps>, GasPayerError>;
}

/// Contract wrapper generic over the provider it calls through.
pub struct GasPayerContract<P> {
    contract: IGasPayer::IGasPayerInstance<P>,
}

impl<P: Provider> GasPayerContract<P> {
    pub fn new(provider: P, contract_address: Address) -> Self {
        Self {
            contract: IGasPayer::new(contract_address, provider),
        }
    }
}

#[async_trait]
impl<P: Provider> GasPayerOps for GasPayerContract<P> {
    async fn calculate_fee(&self, amount: U256) -> Result<U256, GasPayerError> {
        self.contract
            .calculateFee(amount)
            .call()
            .await
            .map_err(|e| GasPayerError::Fee(e.to_string()))
    }

    async fn fund_and_relay(
        &self,
        user: Address,
        gas_amount: U256,
        total_value: U256,
    ) -> Result<FundingReceipt, GasPayerError> {
        let pending = self
            .contract
            .fundAndRelay(user, gas_amount)
            .value(total_value)
            .send()
            .await
            .map_err(|e| GasPayerError::Funding(e.to_string()))?;

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| GasPayerError::Funding(e.to_string()))?;

        Ok(FundingReceipt {
            tx_hash: receipt.transaction_hash,
            status: receipt.status(),
        })
    }
}

/// Production factory holding the RPC endpoint and contract address.
pub struct GasPayer {
    rpc_url: url::Url,
    contract_address: Address,
    view: Arc<dyn GasPayerOps>,
}

impl GasPayer {
    pub fn new(rpc_url: &str, contract_address: Address) -> Result<Self, GasPayerError> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e: url::ParseError| GasPayerError::InvalidRpcUrl(e.to_string()))?;

        let read_provider = ProviderBuilder::new().connect_http(url.clone());
        let view: Arc<dyn GasPayerOps> =
            Arc::new(GasPayerContract::new(read_provider, contract_address));

        Ok(Self {
            rpc_url: url,
            contract_address,
            view,
        })
    }

    /// Parse a tenant private key (0x-prefixed or bare hex) into a signer.
    fn signer_from_binding(binding: &WalletBinding) -> Result<PrivateKeySigner, GasPayerError> {
        let raw = binding.private_key.trim();
        let stripped = raw.strip_prefix("0x").unwrap_or(raw);
        let key_bytes = alloy::hex::decode(stripped)
            .map_err(|e| GasPayerError::InvalidPrivateKey(e.to_string()))?;
        PrivateKeySigner::from_slice(&key_bytes)
            .map_err(|e| GasPayerError::InvalidPrivateKey(e.to_string()))
    }
}

impl GasPayerFactory for GasPayer {
    fn view(&self) -> Arc<dyn GasPayerOps> {
        self.view.clone()
    }

    fn for_wallet(&self, binding: &WalletBinding) -> Result<Arc<dyn GasPayerOps>, GasPayerError> {
        let signer = Self::signer_from_binding(binding)?;
        let wallet = EthereumWallet::from(signer);
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(self.rpc_url.clone());
        Ok(Arc::new(GasPayerContract::new(
            provider,
            self.contract_address,
        )))
    }
}
